/*!
 * Null Provider
 * Placeholder backend carrying only the safe-fallback defaults
 */

use std::path::{Path, PathBuf};

use crate::provider::FileSystemProvider;
use crate::types::FsKind;

/// Null-object provider
///
/// Stores only the mount identity and inherits every default from the
/// trait: reads resolve unavailable, mutations resolve unsuccessful, and
/// capability queries fail with `NotImplemented`. Used as a placeholder
/// mount and as the reference for the default contract.
#[derive(Debug, Clone)]
pub struct NullProvider {
    root: PathBuf,
    kind: FsKind,
}

impl NullProvider {
    pub fn new<P: Into<PathBuf>>(root: P, kind: FsKind) -> Self {
        Self {
            root: root.into(),
            kind,
        }
    }
}

#[async_trait::async_trait]
impl FileSystemProvider for NullProvider {
    fn root(&self) -> &Path {
        &self.root
    }

    fn kind(&self) -> FsKind {
        self.kind
    }
}
