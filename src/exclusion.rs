/*!
 * Exclusion Policy
 * Per-provider opt-out of indexing and search by folder prefix
 */

use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::paths;

/// Set of folder-path prefixes excluded from indexing and search
///
/// Owned exclusively by one provider instance. Mutations are idempotent;
/// reads via `snapshot` have copy semantics.
#[derive(Debug, Default)]
pub struct ExcludedFolders {
    folders: RwLock<HashSet<PathBuf>>,
}

impl ExcludedFolders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder prefix; adding an existing prefix is a no-op
    pub fn add(&self, path: &Path) {
        self.folders.write().insert(paths::normalize(path));
    }

    /// Remove a folder prefix; removing an absent prefix is a no-op
    pub fn remove(&self, path: &Path) {
        self.folders.write().remove(&paths::normalize(path));
    }

    /// True iff the path lies under any excluded folder
    pub fn is_excluded(&self, path: &Path) -> bool {
        let normalized = paths::normalize(path);
        self.folders
            .read()
            .iter()
            .any(|folder| normalized.starts_with(folder))
    }

    /// Snapshot of the current set; later mutations do not affect the copy
    pub fn snapshot(&self) -> HashSet<PathBuf> {
        self.folders.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prefix_exclusion() {
        let excluded = ExcludedFolders::new();
        excluded.add(Path::new("/proj/vendor"));

        assert!(excluded.is_excluded(Path::new("/proj/vendor/lib.js")));
        assert!(excluded.is_excluded(Path::new("/proj/vendor")));
        assert!(!excluded.is_excluded(Path::new("/proj/src/app.js")));
        assert!(!excluded.is_excluded(Path::new("/proj/vendored/x.js")));
    }

    #[test]
    fn test_add_remove_round_trip() {
        let excluded = ExcludedFolders::new();
        let file = Path::new("/proj/vendor/lib.js");

        assert!(!excluded.is_excluded(file));
        excluded.add(Path::new("/proj/vendor"));
        assert!(excluded.is_excluded(file));
        excluded.remove(Path::new("/proj/vendor"));
        assert!(!excluded.is_excluded(file));
    }

    #[test]
    fn test_idempotent_mutation() {
        let excluded = ExcludedFolders::new();
        excluded.add(Path::new("/proj/out"));
        excluded.add(Path::new("/proj/out"));
        assert_eq!(excluded.snapshot().len(), 1);

        excluded.remove(Path::new("/proj/out"));
        excluded.remove(Path::new("/proj/out"));
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_normalized_entries() {
        let excluded = ExcludedFolders::new();
        excluded.add(Path::new("/proj/vendor/"));
        assert!(excluded.is_excluded(Path::new("/proj/src/../vendor/lib.js")));

        // Removal matches the normalized entry
        excluded.remove(Path::new("/proj/vendor"));
        assert!(!excluded.is_excluded(Path::new("/proj/vendor/lib.js")));
    }

    #[test]
    fn test_snapshot_copy_semantics() {
        let excluded = ExcludedFolders::new();
        excluded.add(Path::new("/proj/vendor"));

        let mut copy = excluded.snapshot();
        copy.clear();
        copy.insert(PathBuf::from("/proj/src"));

        // Mutating the copy changes nothing
        assert!(excluded.is_excluded(Path::new("/proj/vendor/lib.js")));
        assert!(!excluded.is_excluded(Path::new("/proj/src/app.js")));
    }

    proptest! {
        #[test]
        fn prop_excluded_iff_live_prefix(
            components in proptest::collection::vec("[a-z]{1,8}", 1..5),
            removed in proptest::bool::ANY,
        ) {
            let folder: PathBuf =
                std::iter::once("/".to_string()).chain(components.clone()).collect();
            let file = folder.join("leaf.txt");

            let excluded = ExcludedFolders::new();
            excluded.add(&folder);
            if removed {
                excluded.remove(&folder);
            }

            prop_assert_eq!(excluded.is_excluded(&file), !removed);
            prop_assert_eq!(excluded.is_excluded(&folder), !removed);
        }
    }
}
