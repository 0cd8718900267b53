/*!
 * Path Addressing
 * Normalization and prefix containment shared by exclusion and routing
 */

use std::path::{Path, PathBuf};

/// Normalize a path: make absolute and clean (handles ., .., multiple /)
pub fn normalize(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new("/").join(path)
    };

    PathBuf::from(path_clean::clean(&path))
}

/// Component-wise prefix containment after normalization
///
/// `/proj/vendor` contains `/proj/vendor/lib.js` and itself, but not
/// `/proj/vendored` (no partial-component matches).
pub fn is_under(path: &Path, prefix: &Path) -> bool {
    normalize(path).starts_with(normalize(prefix))
}

/// Final path component, empty for the root
pub fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/a//b/")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/../..")), PathBuf::from("/"));
    }

    #[test]
    fn test_is_under() {
        assert!(is_under(
            Path::new("/proj/vendor/lib.js"),
            Path::new("/proj/vendor")
        ));
        assert!(is_under(Path::new("/proj/vendor"), Path::new("/proj/vendor")));
        assert!(!is_under(
            Path::new("/proj/src/app.js"),
            Path::new("/proj/vendor")
        ));
        // No partial-component matches
        assert!(!is_under(
            Path::new("/proj/vendored/x.js"),
            Path::new("/proj/vendor")
        ));
    }

    #[test]
    fn test_is_under_unnormalized() {
        assert!(is_under(
            Path::new("/proj/src/../vendor/lib.js"),
            Path::new("/proj/vendor/")
        ));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/a/b.txt")), "b.txt");
        assert_eq!(file_name(Path::new("/")), "");
    }
}
