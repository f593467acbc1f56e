//! File fingerprinting.

use std::path::Path;

use ember_common::ContentHash;

use crate::error::CacheError;

/// Computes content fingerprints of files on disk.
pub struct SourceHasher;

impl SourceHasher {
    /// Reads a file and returns its XXH3-128 fingerprint.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Returns `true` when both files exist and have identical content.
    ///
    /// Any read failure counts as a difference.
    pub fn same_content(a: &Path, b: &Path) -> bool {
        match (Self::hash_file(a), Self::hash_file(b)) {
            (Ok(ha), Ok(hb)) => ha == hb,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_file_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp");
        std::fs::write(&path, "int main(){return 0;}").unwrap();
        assert_eq!(
            SourceHasher::hash_file(&path).unwrap(),
            SourceHasher::hash_file(&path).unwrap()
        );
    }

    #[test]
    fn same_content_compares_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.cpp");
        let b = dir.path().join("b.cpp");
        let c = dir.path().join("c.cpp");
        std::fs::write(&a, "x").unwrap();
        std::fs::write(&b, "x").unwrap();
        std::fs::write(&c, "y").unwrap();
        assert!(SourceHasher::same_content(&a, &b));
        assert!(!SourceHasher::same_content(&a, &c));
    }

    #[test]
    fn missing_file_is_never_same() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.cpp");
        std::fs::write(&a, "x").unwrap();
        assert!(!SourceHasher::same_content(&a, &dir.path().join("gone.cpp")));
        assert!(SourceHasher::hash_file(&dir.path().join("gone.cpp")).is_err());
    }
}
