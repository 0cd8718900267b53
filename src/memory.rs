/*!
 * In-Memory Snapshot Provider
 * Volatile backend for snapshots and test doubles
 */

use ahash::RandomState;
use async_trait::async_trait;
use base64::Engine;
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;

use crate::exclusion::ExcludedFolders;
use crate::paths;
use crate::progress::Progress;
use crate::provider::FileSystemProvider;
use crate::types::*;

/// File node stored in the snapshot map
#[derive(Debug, Clone)]
struct FileNode {
    data: Vec<u8>,
    modified: SystemTime,
}

/// In-memory snapshot provider
///
/// Holds a flat map of normalized path to content, confined to the mount
/// root like the local backend. Pre-populated at construction;
/// `initial_file_paths` enumerates the snapshot. Racing
/// `set_file_content` calls on one path are last-writer-wins (map insert).
/// There is no backend-native addressing scheme, so `embedder_path` fails
/// with `NotImplemented`.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    root: PathBuf,
    files: Arc<DashMap<PathBuf, FileNode, RandomState>>,
    excluded: Arc<ExcludedFolders>,
}

impl MemoryProvider {
    /// Create an empty snapshot provider
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: paths::normalize(&root.into()),
            files: Arc::new(DashMap::with_hasher(RandomState::new())),
            excluded: Arc::new(ExcludedFolders::new()),
        }
    }

    /// Create a provider pre-populated with the given files
    ///
    /// Paths must lie under the root; they share its namespace.
    pub fn with_files<P, I, Q>(root: P, files: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (Q, Vec<u8>)>,
        Q: Into<PathBuf>,
    {
        let provider = Self::new(root);
        for (path, data) in files {
            provider.insert(&path.into(), data);
        }
        provider
    }

    /// Normalize and confine a consumer path to the mount root
    fn resolve(&self, path: &Path) -> ProviderResult<PathBuf> {
        let normalized = paths::normalize(path);
        if !normalized.starts_with(&self.root) {
            return Err(ProviderError::InvalidPath(format!(
                "{} is outside {}",
                normalized.display(),
                self.root.display()
            )));
        }
        Ok(normalized)
    }

    fn insert(&self, path: &Path, data: Vec<u8>) {
        self.files.insert(
            paths::normalize(path),
            FileNode {
                data,
                modified: SystemTime::now(),
            },
        );
    }

    fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(&paths::normalize(path))
    }

    fn node(&self, path: &Path) -> Option<FileNode> {
        self.files.get(&paths::normalize(path)).map(|n| n.clone())
    }

    /// Snapshot paths, honouring the exclusion policy
    fn listed_paths(&self) -> Vec<PathBuf> {
        let mut result: Vec<PathBuf> = self
            .files
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|path| !self.excluded.is_excluded(path))
            .collect();
        result.sort();
        result
    }
}

#[async_trait]
impl FileSystemProvider for MemoryProvider {
    fn root(&self) -> &Path {
        &self.root
    }

    fn kind(&self) -> FsKind {
        FsKind::Snapshot
    }

    async fn metadata(&self, path: &Path) -> ProviderResult<Option<FileMetadata>> {
        let path = self.resolve(path)?;
        Ok(self.node(&path).map(|node| FileMetadata {
            modified: node.modified,
            size: node.data.len() as u64,
        }))
    }

    async fn create_file(
        &self,
        parent: &Path,
        name: Option<&str>,
    ) -> ProviderResult<Option<PathBuf>> {
        let base = name.unwrap_or("NewFile");
        let parent = self.resolve(parent)?;

        for attempt in 0..100 {
            let candidate = if attempt == 0 {
                parent.join(base)
            } else {
                parent.join(format!("{}-{}", base, attempt))
            };
            if !self.contains(&candidate) {
                self.insert(&candidate, Vec::new());
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    async fn delete_file(&self, path: &Path) -> bool {
        let Ok(path) = self.resolve(path) else {
            return false;
        };
        self.files.remove(&path).is_some()
    }

    async fn request_file_blob(&self, path: &Path) -> Option<Vec<u8>> {
        let path = self.resolve(path).ok()?;
        self.node(&path).map(|node| node.data)
    }

    async fn request_file_content(&self, path: &Path) -> FileContent {
        let resolved = match self.resolve(path) {
            Ok(p) => p,
            Err(e) => return FileContent::unavailable(e.to_string()),
        };
        match self.node(&resolved) {
            Some(node) => FileContent::from_bytes(node.data),
            None => FileContent::unavailable(format!("no such file: {}", path.display())),
        }
    }

    async fn set_file_content(
        &self,
        path: &Path,
        content: &[u8],
        is_encoded: bool,
    ) -> ProviderResult<()> {
        let data = if is_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(content)
                .map_err(|e| ProviderError::Io(format!("invalid base64 content: {}", e)))?
        } else {
            content.to_vec()
        };
        let path = self.resolve(path)?;
        self.insert(&path, data);
        Ok(())
    }

    async fn rename_file(&self, path: &Path, new_name: &str) -> RenameOutcome {
        if new_name.is_empty() || new_name.contains(['/', '\\']) {
            return RenameOutcome::failed();
        }
        let Ok(old_path) = self.resolve(path) else {
            return RenameOutcome::failed();
        };
        let Some(parent) = old_path.parent() else {
            return RenameOutcome::failed();
        };
        let new_path = parent.join(new_name);
        if self.contains(&new_path) {
            return RenameOutcome::failed();
        }

        match self.files.remove(&old_path) {
            Some((_, node)) => {
                self.files.insert(new_path.clone(), node);
                RenameOutcome::renamed(new_path)
            }
            None => RenameOutcome::failed(),
        }
    }

    fn initial_file_paths(&self) -> Vec<PathBuf> {
        self.listed_paths()
    }

    fn add_excluded_folder(&self, path: &Path) {
        self.excluded.add(path);
    }

    fn remove_excluded_folder(&self, path: &Path) {
        self.excluded.remove(path);
    }

    fn is_file_excluded(&self, path: &Path) -> bool {
        self.excluded.is_excluded(path)
    }

    fn can_exclude_folder(&self, path: &Path) -> bool {
        let normalized = paths::normalize(path);
        normalized.starts_with(&self.root) && normalized != self.root
    }

    fn excluded_folders(&self) -> HashSet<PathBuf> {
        self.excluded.snapshot()
    }

    async fn search_in_path(&self, query: &str, progress: &Progress) -> Vec<PathBuf> {
        let candidates = self.listed_paths();
        progress.set_total_work(candidates.len() as u64);

        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        for path in candidates {
            if progress.is_canceled() {
                break;
            }
            if let Some(node) = self.node(&path) {
                if let Ok(text) = String::from_utf8(node.data) {
                    if text.to_lowercase().contains(&needle) {
                        hits.push(path);
                    }
                }
            }
            progress.worked(1);
        }

        progress.done();
        hits
    }

    async fn index_content(&self, progress: &Progress) {
        tokio::task::yield_now().await;

        let candidates = self.listed_paths();
        progress.set_total_work(candidates.len() as u64);
        for _ in candidates {
            if progress.is_canceled() {
                break;
            }
            progress.worked(1);
        }

        progress.done();
    }

    fn mime_from_path(&self, path: &Path) -> ProviderResult<String> {
        Ok(crate::types::mime_from_path(path).to_string())
    }

    fn content_type(&self, path: &Path) -> ProviderResult<ResourceKind> {
        Ok(ResourceKind::from_path(path))
    }

    fn tooltip_for_url(&self, _url: &str) -> ProviderResult<String> {
        Ok(format!("Snapshot of {}", self.root.display()))
    }

    fn supports_automapping(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn removed(&self) {
        info!(root = %self.root.display(), files = self.files.len(), "snapshot filesystem removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MemoryProvider {
        MemoryProvider::with_files(
            "/proj",
            [
                ("/proj/src/app.js", b"function setup() {}".to_vec()),
                ("/proj/src/util.js", b"const helper = 1;".to_vec()),
                ("/proj/vendor/lib.js", b"function setup() {}".to_vec()),
            ],
        )
    }

    #[tokio::test]
    async fn test_snapshot_population() {
        let provider = snapshot();
        let files = provider.initial_file_paths();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], PathBuf::from("/proj/src/app.js"));

        let md = provider
            .metadata(Path::new("/proj/src/util.js"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(md.size, 17);
    }

    #[tokio::test]
    async fn test_content_ops() {
        let provider = snapshot();

        assert_eq!(
            provider.request_file_content(Path::new("/proj/src/app.js")).await,
            FileContent::text("function setup() {}")
        );

        provider
            .set_file_content(Path::new("/proj/src/app.js"), b"updated", false)
            .await
            .unwrap();
        assert_eq!(
            provider.request_file_blob(Path::new("/proj/src/app.js")).await,
            Some(b"updated".to_vec())
        );

        assert!(provider.delete_file(Path::new("/proj/src/app.js")).await);
        assert!(!provider.delete_file(Path::new("/proj/src/app.js")).await);
        assert_eq!(
            provider.metadata(Path::new("/proj/src/app.js")).await,
            Ok(None)
        );
    }

    #[tokio::test]
    async fn test_encoded_write() {
        let provider = MemoryProvider::new("/proj");
        // "hi" base64-encoded
        provider
            .set_file_content(Path::new("/proj/a.txt"), b"aGk=", true)
            .await
            .unwrap();
        assert_eq!(
            provider.request_file_blob(Path::new("/proj/a.txt")).await,
            Some(b"hi".to_vec())
        );

        assert!(matches!(
            provider
                .set_file_content(Path::new("/proj/b.txt"), b"not base64!!", true)
                .await,
            Err(ProviderError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_paths_confined_to_root() {
        let provider = MemoryProvider::new("/proj");

        assert!(matches!(
            provider
                .set_file_content(Path::new("/elsewhere/x.txt"), b"x", false)
                .await,
            Err(ProviderError::InvalidPath(_))
        ));
        assert!(matches!(
            provider.create_file(Path::new("/elsewhere"), Some("x.txt")).await,
            Err(ProviderError::InvalidPath(_))
        ));
        assert!(matches!(
            provider.metadata(Path::new("/elsewhere/x.txt")).await,
            Err(ProviderError::InvalidPath(_))
        ));

        // Nothing materialized outside the root
        assert!(provider.initial_file_paths().is_empty());
        assert!(!provider.delete_file(Path::new("/elsewhere/x.txt")).await);
        assert_eq!(
            provider.request_file_blob(Path::new("/elsewhere/x.txt")).await,
            None
        );
        assert!(!provider
            .request_file_content(Path::new("/elsewhere/x.txt"))
            .await
            .is_available());
        assert_eq!(
            provider
                .rename_file(Path::new("/elsewhere/x.txt"), "y.txt")
                .await,
            RenameOutcome::failed()
        );

        // A traversal that resolves back under the root is fine
        provider
            .set_file_content(Path::new("/proj/a/../b.txt"), b"ok", false)
            .await
            .unwrap();
        assert_eq!(
            provider.request_file_blob(Path::new("/proj/b.txt")).await,
            Some(b"ok".to_vec())
        );
    }

    #[tokio::test]
    async fn test_rename() {
        let provider = snapshot();
        let outcome = provider
            .rename_file(Path::new("/proj/src/app.js"), "main.js")
            .await;
        assert_eq!(outcome, RenameOutcome::renamed("/proj/src/main.js"));
        assert!(provider
            .request_file_content(Path::new("/proj/src/main.js"))
            .await
            .is_available());

        // Refuses to clobber
        assert_eq!(
            provider
                .rename_file(Path::new("/proj/src/main.js"), "util.js")
                .await,
            RenameOutcome::failed()
        );
    }

    #[tokio::test]
    async fn test_search_honours_exclusion() {
        let provider = snapshot();
        provider.add_excluded_folder(Path::new("/proj/vendor"));

        let progress = Progress::new();
        let hits = provider.search_in_path("setup", &progress).await;

        assert_eq!(hits, vec![PathBuf::from("/proj/src/app.js")]);
        assert!(progress.is_done());
        assert_eq!(progress.total_work(), 2);
    }

    #[tokio::test]
    async fn test_index_signals_done() {
        let provider = snapshot();
        let progress = Progress::new();
        provider.index_content(&progress).await;

        assert!(progress.is_done());
        assert_eq!(progress.work_completed(), 3);
    }

    #[tokio::test]
    async fn test_no_embedder_path() {
        let provider = snapshot();
        assert!(provider
            .embedder_path()
            .unwrap_err()
            .is_configuration_error());
        assert_eq!(provider.supports_automapping(), Ok(false));
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let provider = Arc::new(MemoryProvider::new("/proj"));
        let path = Path::new("/proj/contended.txt");

        let a = provider.clone();
        let b = provider.clone();
        let (ra, rb) = tokio::join!(
            a.set_file_content(path, b"writer-a", false),
            b.set_file_content(path, b"writer-b", false),
        );
        ra.unwrap();
        rb.unwrap();

        // One complete write survives, never an interleaving
        let data = provider.request_file_blob(path).await.unwrap();
        assert!(data == b"writer-a" || data == b"writer-b");
    }
}
