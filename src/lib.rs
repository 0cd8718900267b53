/*!
 * Workspace VFS Library
 * Pluggable filesystem abstraction for source indexing and editing tools
 */

pub mod exclusion;
pub mod local;
pub mod memory;
pub mod null;
pub mod paths;
pub mod progress;
pub mod provider;
pub mod registry;
pub mod trace;
pub mod types;

// Re-exports
pub use exclusion::ExcludedFolders;
pub use local::LocalProvider;
pub use memory::MemoryProvider;
pub use null::NullProvider;
pub use progress::Progress;
pub use provider::FileSystemProvider;
pub use registry::ProviderRegistry;
pub use trace::init_tracing;
pub use types::{
    FileContent, FileMetadata, FsKind, ProviderError, ProviderResult, RenameOutcome, ResourceKind,
};
