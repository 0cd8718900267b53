/*!
 * Local Filesystem Provider
 * Host-disk backend rooted at a project folder
 */

use async_trait::async_trait;
use base64::Engine;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::exclusion::ExcludedFolders;
use crate::paths;
use crate::progress::Progress;
use crate::provider::FileSystemProvider;
use crate::types::*;

const DEFAULT_FILE_NAME: &str = "NewFile";
const MAX_NAME_ATTEMPTS: u32 = 100;
const INDEX_YIELD_INTERVAL: usize = 16;

// Sequence for per-call temp file names; racing writers on one path must
// each commit through their own temp file
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local filesystem provider
///
/// Consumer paths share the host namespace with the mount root; every
/// operation is confined to the root by component-wise normalization, so
/// `..` cannot escape it. Racing `set_file_content` calls on one path are
/// last-writer-wins (temp-file + rename).
#[derive(Debug)]
pub struct LocalProvider {
    root: PathBuf,
    readonly: bool,
    excluded: ExcludedFolders,
}

impl LocalProvider {
    /// Create a provider rooted at the specified host directory
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: paths::normalize(&root.into()),
            readonly: false,
            excluded: ExcludedFolders::new(),
        }
    }

    /// Create a read-only provider; all mutations report non-success
    pub fn readonly<P: Into<PathBuf>>(root: P) -> Self {
        let mut provider = Self::new(root);
        provider.readonly = true;
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

    fn check_write(&self) -> ProviderResult<()> {
        if self.readonly {
            return Err(ProviderError::ReadOnly);
        }
        Ok(())
    }

    /// Convert std::io::Error to ProviderError
    fn io_error(e: std::io::Error, context: impl Into<String>) -> ProviderError {
        match e.kind() {
            ErrorKind::PermissionDenied => ProviderError::PermissionDenied(context.into()),
            _ => ProviderError::Io(format!("{}: {}", context.into(), e)),
        }
    }

    fn convert_metadata(md: fs::Metadata) -> FileMetadata {
        FileMetadata {
            modified: md.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
            size: md.len(),
        }
    }

    /// Walk the tree under the root, honouring the exclusion policy
    ///
    /// `.git` directories are recorded separately and not descended into.
    fn enumerate(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut git_folders = Vec::new();
        self.walk_dir(&self.root, &mut files, &mut git_folders);
        files.sort();
        git_folders.sort();
        (files, git_folders)
    }

    fn walk_dir(&self, dir: &Path, files: &mut Vec<PathBuf>, git_folders: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                if self.excluded.is_excluded(&path) {
                    continue;
                }
                if paths::file_name(&path) == ".git" {
                    git_folders.push(path);
                    continue;
                }
                self.walk_dir(&path, files, git_folders);
            } else if file_type.is_file() && !self.excluded.is_excluded(&path) {
                // In-flight write buffers are not part of the corpus
                let name = paths::file_name(&path);
                if name.starts_with('.') && name.ends_with(".tmp") {
                    continue;
                }
                files.push(path);
            }
        }
    }

    /// Pick a child name that does not clobber an existing entry
    fn available_name(&self, parent: &Path, base: &str) -> Option<PathBuf> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                parent.join(base)
            } else {
                parent.join(format!("{}-{}", base, attempt))
            };
            if !candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }
}

#[async_trait]
impl FileSystemProvider for LocalProvider {
    fn root(&self) -> &Path {
        &self.root
    }

    fn kind(&self) -> FsKind {
        FsKind::Local
    }

    fn embedder_path(&self) -> ProviderResult<PathBuf> {
        Ok(self.root.clone())
    }

    async fn metadata(&self, path: &Path) -> ProviderResult<Option<FileMetadata>> {
        let full_path = self.resolve(path)?;
        match tokio::fs::metadata(&full_path).await {
            Ok(md) => Ok(Some(Self::convert_metadata(md))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(e, format!("metadata {}", path.display()))),
        }
    }

    async fn create_file(
        &self,
        parent: &Path,
        name: Option<&str>,
    ) -> ProviderResult<Option<PathBuf>> {
        if self.readonly {
            return Ok(None);
        }

        let parent = self.resolve(parent)?;
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| Self::io_error(e, format!("create parent dirs {}", parent.display())))?;

        let base = name.unwrap_or(DEFAULT_FILE_NAME);
        let Some(path) = self.available_name(&parent, base) else {
            return Ok(None);
        };

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => Ok(Some(path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(Self::io_error(e, format!("create {}", path.display()))),
        }
    }

    async fn delete_file(&self, path: &Path) -> bool {
        if self.readonly {
            return false;
        }
        let Ok(full_path) = self.resolve(path) else {
            return false;
        };
        tokio::fs::remove_file(&full_path).await.is_ok()
    }

    async fn request_file_blob(&self, path: &Path) -> Option<Vec<u8>> {
        let full_path = self.resolve(path).ok()?;
        tokio::fs::read(&full_path).await.ok()
    }

    async fn request_file_content(&self, path: &Path) -> FileContent {
        let full_path = match self.resolve(path) {
            Ok(p) => p,
            Err(e) => return FileContent::unavailable(e.to_string()),
        };
        match tokio::fs::read(&full_path).await {
            Ok(data) => FileContent::from_bytes(data),
            Err(e) => {
                FileContent::unavailable(format!("unable to read {}: {}", path.display(), e))
            }
        }
    }

    async fn set_file_content(
        &self,
        path: &Path,
        content: &[u8],
        is_encoded: bool,
    ) -> ProviderResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path)?;

        let data = if is_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(content)
                .map_err(|e| ProviderError::Io(format!("invalid base64 content: {}", e)))?
        } else {
            content.to_vec()
        };

        let parent = full_path
            .parent()
            .ok_or_else(|| ProviderError::InvalidPath(format!("{} has no parent", path.display())))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Self::io_error(e, format!("create parent dirs {}", parent.display())))?;

        // Write to a unique sibling temp file then rename, so concurrent
        // readers never observe a partial write and racing writers are
        // last-writer-wins rather than colliding on one buffer
        let tmp_path = parent.join(format!(
            ".{}.{}.{}.tmp",
            paths::file_name(&full_path),
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed),
        ));
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|e| Self::io_error(e, format!("write {}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &full_path)
            .await
            .map_err(|e| Self::io_error(e, format!("commit {}", path.display())))
    }

    async fn rename_file(&self, path: &Path, new_name: &str) -> RenameOutcome {
        if self.readonly || new_name.is_empty() || new_name.contains(['/', '\\']) {
            return RenameOutcome::failed();
        }
        let Ok(full_path) = self.resolve(path) else {
            return RenameOutcome::failed();
        };
        let Some(parent) = full_path.parent() else {
            return RenameOutcome::failed();
        };

        let new_path = parent.join(new_name);
        if !full_path.exists() || new_path.exists() {
            return RenameOutcome::failed();
        }

        match tokio::fs::rename(&full_path, &new_path).await {
            Ok(()) => RenameOutcome::renamed(new_path),
            Err(_) => RenameOutcome::failed(),
        }
    }

    fn initial_file_paths(&self) -> Vec<PathBuf> {
        self.enumerate().0
    }

    fn initial_git_folders(&self) -> Vec<PathBuf> {
        self.enumerate().1
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
        let (files, _) = self.enumerate();
        progress.set_total_work(files.len() as u64);

        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        for path in files {
            if progress.is_canceled() {
                break;
            }
            if let Ok(data) = tokio::fs::read(&path).await {
                if let Ok(text) = String::from_utf8(data) {
                    if text.to_lowercase().contains(&needle) {
                        hits.push(path);
                    }
                }
            }
            progress.worked(1);
        }

        debug!(root = %self.root.display(), query = %query, hits = hits.len(), "search complete");
        progress.done();
        hits
    }

    async fn index_content(&self, progress: &Progress) {
        // Yield before any work so completion is asynchronous relative to
        // the call even for an empty corpus
        tokio::task::yield_now().await;

        let (files, _) = self.enumerate();
        progress.set_total_work(files.len() as u64);

        for (i, _path) in files.iter().enumerate() {
            if progress.is_canceled() {
                break;
            }
            progress.worked(1);
            if i % INDEX_YIELD_INTERVAL == INDEX_YIELD_INTERVAL - 1 {
                tokio::task::yield_now().await;
            }
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
        Ok(format!("Linked to {}", self.root.display()))
    }

    fn supports_automapping(&self) -> ProviderResult<bool> {
        Ok(true)
    }

    fn removed(&self) {
        info!(root = %self.root.display(), "local filesystem removed");
    }
}
