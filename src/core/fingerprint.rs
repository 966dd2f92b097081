//! Source tree fingerprints
//!
//! A fingerprint is a SHA-256 over the sorted list of per-file digests of a
//! source tree. Each per-file digest covers the file's relative path and its
//! contents, so the fingerprint is independent of enumeration order but
//! changes when a file is added, removed, renamed or edited.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compute the fingerprint of the tree rooted at `root`
///
/// `ignore` holds paths relative to `root`; an ignored directory excludes
/// everything below it. Dot-files are included.
pub fn fingerprint_tree(root: &Path, ignore: &[String]) -> io::Result<String> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory {} does not exist", root.display()),
        ));
    }

    let ignored: Vec<PathBuf> = ignore.iter().map(PathBuf::from).collect();
    let mut digests = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if ignored.iter().any(|i| relative.starts_with(i)) {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_file() {
            digests.push(file_digest(entry.path(), relative)?);
        } else if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            let mut hasher = Sha256::new();
            hasher.update(normalized(relative).as_bytes());
            hasher.update([0u8]);
            hasher.update(b"symlink:");
            hasher.update(target.to_string_lossy().as_bytes());
            digests.push(hex::encode(hasher.finalize()));
        }
    }

    Ok(aggregate(digests))
}

/// Digest of one file: relative path, a separator, then the streamed contents
fn file_digest(path: &Path, relative: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(normalized(relative).as_bytes());
    hasher.update([0u8]);
    let mut file = File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Combine per-file digests into one, independent of their order
pub fn aggregate(mut digests: Vec<String>) -> String {
    digests.sort_unstable();
    let mut hasher = Sha256::new();
    for digest in &digests {
        hasher.update(digest.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn normalized(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_identical_trees_match() {
        let a = tree(&[("Sources/A.swift", "let a = 1"), (".swiftlint.yml", "rules")]);
        let b = tree(&[(".swiftlint.yml", "rules"), ("Sources/A.swift", "let a = 1")]);
        assert_eq!(
            fingerprint_tree(a.path(), &[]).unwrap(),
            fingerprint_tree(b.path(), &[]).unwrap()
        );
    }

    #[test]
    fn test_one_byte_change_detected() {
        let dir = tree(&[("Sources/A.swift", "let a = 1"), ("README.md", "hi")]);
        let before = fingerprint_tree(dir.path(), &[]).unwrap();
        std::fs::write(dir.path().join("Sources/A.swift"), "let a = 2").unwrap();
        assert_ne!(before, fingerprint_tree(dir.path(), &[]).unwrap());
    }

    #[test]
    fn test_dot_files_are_included() {
        let dir = tree(&[("A.swift", "a")]);
        let before = fingerprint_tree(dir.path(), &[]).unwrap();
        std::fs::write(dir.path().join(".hidden"), "x").unwrap();
        assert_ne!(before, fingerprint_tree(dir.path(), &[]).unwrap());
    }

    #[test]
    fn test_ignored_file_change_not_detected() {
        let dir = tree(&[("A.swift", "a"), ("Generated/Build.swift", "1")]);
        let ignore = vec!["Generated".to_string()];
        let before = fingerprint_tree(dir.path(), &ignore).unwrap();
        std::fs::write(dir.path().join("Generated/Build.swift"), "2").unwrap();
        assert_eq!(before, fingerprint_tree(dir.path(), &ignore).unwrap());
    }

    #[test]
    fn test_rename_detected() {
        let dir = tree(&[("A.swift", "same")]);
        let before = fingerprint_tree(dir.path(), &[]).unwrap();
        std::fs::rename(dir.path().join("A.swift"), dir.path().join("B.swift")).unwrap();
        assert_ne!(before, fingerprint_tree(dir.path(), &[]).unwrap());
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(fingerprint_tree(&dir.path().join("missing"), &[]).is_err());
    }

    proptest! {
        #[test]
        fn prop_aggregate_is_order_independent(mut digests in prop::collection::vec("[0-9a-f]{64}", 0..20)) {
            let forward = aggregate(digests.clone());
            digests.reverse();
            prop_assert_eq!(forward, aggregate(digests));
        }
    }
}
