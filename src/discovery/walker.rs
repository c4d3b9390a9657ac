//! Deterministic walk of the API tree.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::discovery::mapper::{is_excluded_name, MappingRules};
use crate::error::WalkError;

/// Routable files found under a root, in walk order.
#[derive(Debug, Default)]
pub struct Walk {
    pub files: Vec<PathBuf>,
    pub errors: Vec<WalkError>,
}

/// Depth-first walk with sorted listings. Excluded names are not descended
/// into; unreadable entries are recorded and skipped.
pub fn walk(rules: &MappingRules, root: &Path) -> Walk {
    let mut walk = Walk::default();

    if !root.is_dir() {
        walk.errors.push(WalkError {
            path: root.to_path_buf(),
            message: "API root is missing or not a directory".to_string(),
        });
        return walk;
    }

    let entries = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded_name(&e.file_name().to_string_lossy()));

    for entry in entries {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && rules.accepts(entry.path()) {
                    walk.files.push(entry.into_path());
                }
            }
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable API path");
                walk.errors.push(WalkError {
                    path,
                    message: err.to_string(),
                });
            }
        }
    }

    walk
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walk_is_sorted_and_skips_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in ["b.rs", "a.rs", "notes.txt", "_util.rs", ".git/config.rs", "c/index.rs", "_private/x.rs"] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let walk = walk(&MappingRules::default(), root);
        let found: Vec<_> = walk
            .files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(found, vec!["a.rs", "b.rs", "c/index.rs"]);
        assert!(walk.errors.is_empty());
    }

    #[test]
    fn test_missing_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let walk = walk(&MappingRules::default(), &dir.path().join("nope"));
        assert!(walk.files.is_empty());
        assert_eq!(walk.errors.len(), 1);
    }
}
