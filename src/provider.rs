/*!
 * Provider Trait
 * The single capability surface between the indexing consumer and any backend
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::progress::Progress;
use crate::types::*;

/// Pluggable filesystem backend
///
/// The indexing/editing consumer depends only on this trait, never on a
/// concrete backend. Defaults are the null-object behaviors: every optional
/// operation resolves to a safe negative result rather than failing, while
/// identity/capability queries (`embedder_path`, `mime_from_path`,
/// `content_type`, `tooltip_for_url`, `supports_automapping`) fail with
/// `NotImplemented` - a concrete backend that omits those is misconfigured,
/// not merely read-only.
///
/// Ordering: calls issued sequentially by one caller observe effects in
/// issue order within one provider instance. Concurrent writes to the same
/// path have backend-defined semantics; a backend must document whether they
/// are last-writer-wins or rejected. After `removed` returns, the consumer
/// must not issue further operations against the instance.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    /// Mount root; immutable after construction
    fn root(&self) -> &Path;

    /// Backend category tag; immutable after construction
    fn kind(&self) -> FsKind;

    /// Backend-native path for the mount root
    fn embedder_path(&self) -> ProviderResult<PathBuf> {
        Err(ProviderError::not_implemented("embedder_path"))
    }

    /// Metadata for a path; `Ok(None)` when the path does not exist
    async fn metadata(&self, _path: &Path) -> ProviderResult<Option<FileMetadata>> {
        Ok(None)
    }

    /// Create a file under `parent`, optionally named `name`
    ///
    /// Resolves to the created path, or `Ok(None)` when creation is
    /// unsupported or failed. `None` is authoritative non-success; a backend
    /// never fabricates a path.
    async fn create_file(
        &self,
        _parent: &Path,
        _name: Option<&str>,
    ) -> ProviderResult<Option<PathBuf>> {
        Ok(None)
    }

    /// Delete a file; false when missing or deletion is unsupported
    async fn delete_file(&self, _path: &Path) -> bool {
        false
    }

    /// Raw binary content, or `None` when missing or unsupported
    async fn request_file_blob(&self, _path: &Path) -> Option<Vec<u8>> {
        None
    }

    /// Decoded content plus encoding flag, or an error description
    async fn request_file_content(&self, _path: &Path) -> FileContent {
        FileContent::unavailable("this filesystem cannot read file content")
    }

    /// Overwrite file content, atomically from the caller's perspective
    async fn set_file_content(
        &self,
        _path: &Path,
        _content: &[u8],
        _is_encoded: bool,
    ) -> ProviderResult<()> {
        Err(ProviderError::not_implemented("set_file_content"))
    }

    /// Rename a file within its parent folder; resolved exactly once
    async fn rename_file(&self, _path: &Path, _new_name: &str) -> RenameOutcome {
        RenameOutcome::failed()
    }

    /// Enumerable file contents at mount time
    ///
    /// Empty means "no pre-population", not "empty backend".
    fn initial_file_paths(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Git folders discovered at mount time
    fn initial_git_folders(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Exclude a folder prefix from indexing and search; idempotent
    fn add_excluded_folder(&self, _path: &Path) {}

    /// Remove a folder prefix from the excluded set; idempotent
    fn remove_excluded_folder(&self, _path: &Path) {}

    /// True iff the path lies under an excluded folder
    fn is_file_excluded(&self, _path: &Path) -> bool {
        false
    }

    /// Policy gate: whether this backend allows excluding the given folder
    fn can_exclude_folder(&self, _path: &Path) -> bool {
        false
    }

    /// Snapshot of excluded folders; callers must not assume it reflects
    /// subsequent mutations
    fn excluded_folders(&self) -> HashSet<PathBuf> {
        HashSet::new()
    }

    /// Search file contents for `query`, delivered as a fully-resolved list
    ///
    /// Must signal `progress.done()` exactly once, including on zero-result
    /// and cancelled paths.
    async fn search_in_path(&self, _query: &str, progress: &Progress) -> Vec<PathBuf> {
        progress.done();
        Vec::new()
    }

    /// Backend-specific background indexing
    ///
    /// Completion is signalled asynchronously relative to the call (the
    /// default yields to the scheduler first), so callers that attach
    /// continuation logic always observe at least one suspension point.
    /// Signalled exactly once, even when indexing is a no-op.
    async fn index_content(&self, progress: &Progress) {
        tokio::task::yield_now().await;
        progress.done();
    }

    /// MIME type for a path
    fn mime_from_path(&self, _path: &Path) -> ProviderResult<String> {
        Err(ProviderError::not_implemented("mime_from_path"))
    }

    /// Resource classification for a path
    fn content_type(&self, _path: &Path) -> ProviderResult<ResourceKind> {
        Err(ProviderError::not_implemented("content_type"))
    }

    /// Human-readable tooltip for a URL under this mount
    fn tooltip_for_url(&self, _url: &str) -> ProviderResult<String> {
        Err(ProviderError::not_implemented("tooltip_for_url"))
    }

    /// Whether the backend participates in automatic workspace mapping
    fn supports_automapping(&self) -> ProviderResult<bool> {
        Err(ProviderError::not_implemented("supports_automapping"))
    }

    /// Teardown hook invoked on unmount; does not cancel in-flight work
    fn removed(&self) {}
}
