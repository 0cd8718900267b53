/*!
 * Provider Registry
 * Routes consumer paths to mounted providers and owns mount lifecycle
 */

use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::paths;
use crate::provider::FileSystemProvider;
use crate::types::{FsKind, ProviderError, ProviderResult};

/// Registry of mounted filesystem providers
///
/// Explicitly constructed and passed by reference; a process typically keeps
/// one for its whole lifetime, but nothing here is global. Cloning yields a
/// handle onto the same registrations.
pub struct ProviderRegistry {
    providers: Arc<DashMap<PathBuf, Arc<dyn FileSystemProvider>, RandomState>>,
    root_order: Arc<RwLock<Vec<PathBuf>>>, // Longest roots first for proper resolution
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(DashMap::with_hasher(RandomState::new())),
            root_order: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a provider under its root
    pub fn add(&self, provider: Arc<dyn FileSystemProvider>) -> ProviderResult<()> {
        let root = paths::normalize(provider.root());

        if self.providers.contains_key(&root) {
            return Err(ProviderError::AlreadyRegistered(
                root.display().to_string(),
            ));
        }

        info!(root = %root.display(), kind = %provider.kind(), "filesystem added");
        self.providers.insert(root.clone(), provider);

        let mut order = self.root_order.write();
        order.push(root);
        order.sort_by(|a, b| b.as_os_str().len().cmp(&a.as_os_str().len()));

        Ok(())
    }

    /// Unregister the provider mounted at `root` and fire its teardown hook
    ///
    /// After this returns, the consumer must not issue operations against
    /// the returned provider.
    pub fn remove(&self, root: &Path) -> ProviderResult<Arc<dyn FileSystemProvider>> {
        let root = paths::normalize(root);

        let (_, provider) = self
            .providers
            .remove(&root)
            .ok_or_else(|| ProviderError::NotRegistered(root.display().to_string()))?;

        let mut order = self.root_order.write();
        order.retain(|p| p != &root);
        drop(order);

        provider.removed();
        Ok(provider)
    }

    /// Resolve the provider responsible for a path (longest-root match)
    pub fn provider_for(&self, path: &Path) -> Option<Arc<dyn FileSystemProvider>> {
        let path = paths::normalize(path);
        let order = self.root_order.read();

        for root in order.iter() {
            if path.starts_with(root) {
                // Registrations can race with removal; skip removed roots
                if let Some(entry) = self.providers.get(root) {
                    return Some(entry.value().clone());
                }
            }
        }
        None
    }

    /// All registered mounts as (root, kind)
    pub fn roots(&self) -> Vec<(PathBuf, FsKind)> {
        self.providers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().kind()))
            .collect()
    }

    pub fn is_registered(&self, root: &Path) -> bool {
        self.providers.contains_key(&paths::normalize(root))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProviderRegistry {
    fn clone(&self) -> Self {
        Self {
            providers: Arc::clone(&self.providers),
            root_order: Arc::clone(&self.root_order),
        }
    }
}
