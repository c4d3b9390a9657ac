//! Route collection and ordering.
//!
//! # Responsibilities
//! - Turn the walked files into [`RouteEntry`] values
//! - Order them by descending route pattern
//! - Keep one entry per pattern and report the rest as shadowed
//!
//! # Design Decisions
//! - Descending byte order puts `/users/me` before `/users/:id` and any
//!   `*rest` catch-all after its static siblings, because `:` and `*` sort
//!   below letters
//! - Only segments starting with a letter beat a parameter. Digits and `-`
//!   sort below `:`, so `archive/:year.rs` is registered ahead of
//!   `archive/2024.rs` and answers `/archive/2024` itself. `*` sorts below
//!   both, so a catch-all still comes last
//! - Ties go to the entry whose module key sorts first, so `users.rs` wins
//!   over `users/index.rs`

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::discovery::mapper::{map_path, module_key, MappingRules};
use crate::discovery::walker::walk;
use crate::error::WalkError;

/// A routable module found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub route_pattern: String,
    pub source_path: PathBuf,
    pub module_key: String,
}

/// An entry that lost its pattern to another module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowedEntry {
    #[serde(flatten)]
    pub entry: RouteEntry,
    /// Module key of the entry that is registered instead.
    pub shadowed_by: String,
}

/// Result of scanning an API root.
#[derive(Debug, Default, Serialize)]
pub struct Collection {
    /// Entries to register, in registration order.
    pub entries: Vec<RouteEntry>,
    pub shadowed: Vec<ShadowedEntry>,
    pub walk_errors: Vec<WalkError>,
}

/// Scans `root` and returns the entries in registration order.
pub fn collect(rules: &MappingRules, root: &Path) -> Collection {
    let walked = walk(rules, root);

    let entries = walked
        .files
        .into_iter()
        .filter_map(|file| {
            let route_pattern = map_path(rules, root, &file)?;
            let module_key = module_key(root, &file)?;
            Some(RouteEntry {
                route_pattern,
                source_path: file,
                module_key,
            })
        })
        .collect();

    let (entries, shadowed) = order_entries(entries);
    for s in &shadowed {
        tracing::warn!(
            route = %s.entry.route_pattern,
            module = %s.entry.module_key,
            shadowed_by = %s.shadowed_by,
            "API module shadowed by another module with the same route"
        );
    }

    Collection {
        entries,
        shadowed,
        walk_errors: walked.errors,
    }
}

/// Sorts descending by pattern and drops duplicate patterns.
pub fn order_entries(mut entries: Vec<RouteEntry>) -> (Vec<RouteEntry>, Vec<ShadowedEntry>) {
    entries.sort_by(|a, b| {
        b.route_pattern
            .cmp(&a.route_pattern)
            .then_with(|| a.module_key.cmp(&b.module_key))
    });

    let mut kept: Vec<RouteEntry> = Vec::with_capacity(entries.len());
    let mut shadowed = Vec::new();
    for entry in entries {
        match kept.last() {
            Some(winner) if winner.route_pattern == entry.route_pattern => {
                shadowed.push(ShadowedEntry {
                    shadowed_by: winner.module_key.clone(),
                    entry,
                });
            }
            _ => kept.push(entry),
        }
    }

    (kept, shadowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entry(pattern: &str, key: &str) -> RouteEntry {
        RouteEntry {
            route_pattern: pattern.to_string(),
            source_path: PathBuf::from(key),
            module_key: key.to_string(),
        }
    }

    #[test]
    fn test_descending_order() {
        let (kept, shadowed) = order_entries(vec![
            entry("/a", "a.rs"),
            entry("/users/:id", "users/:id.rs"),
            entry("/", "index.rs"),
            entry("/users/me", "users/me.rs"),
            entry("/files/*rest", "files/*rest.rs"),
            entry("/files/readme", "files/readme.rs"),
        ]);
        let order: Vec<_> = kept.iter().map(|e| e.route_pattern.as_str()).collect();
        assert_eq!(
            order,
            vec!["/users/me", "/users/:id", "/files/readme", "/files/*rest", "/a", "/"]
        );
        assert!(shadowed.is_empty());
    }

    #[test]
    fn test_parameter_precedes_digit_and_dash_segments() {
        let (kept, _) = order_entries(vec![
            entry("/archive/2024", "archive/2024.rs"),
            entry("/archive/*rest", "archive/*rest.rs"),
            entry("/archive/-draft", "archive/-draft.rs"),
            entry("/archive/:year", "archive/:year.rs"),
            entry("/archive/latest", "archive/latest.rs"),
        ]);
        let order: Vec<_> = kept.iter().map(|e| e.route_pattern.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "/archive/latest",
                "/archive/:year",
                "/archive/2024",
                "/archive/-draft",
                "/archive/*rest",
            ]
        );
    }

    #[test]
    fn test_sibling_file_shadows_index() {
        let (kept, shadowed) = order_entries(vec![
            entry("/users", "users/index.rs"),
            entry("/users", "users.rs"),
        ]);
        assert_eq!(kept, vec![entry("/users", "users.rs")]);
        assert_eq!(shadowed.len(), 1);
        assert_eq!(shadowed[0].entry.module_key, "users/index.rs");
        assert_eq!(shadowed[0].shadowed_by, "users.rs");
    }

    #[test]
    fn test_collect_from_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in ["index.rs", "users.rs", "users/index.rs", "users/:id.rs", "_shared.rs"] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let collection = collect(&MappingRules::default(), root);
        let patterns: Vec<_> = collection
            .entries
            .iter()
            .map(|e| (e.route_pattern.as_str(), e.module_key.as_str()))
            .collect();

        assert_eq!(
            patterns,
            vec![("/users/:id", "users/:id.rs"), ("/users", "users.rs"), ("/", "index.rs")]
        );
        assert_eq!(collection.shadowed.len(), 1);
        assert!(collection.walk_errors.is_empty());
        assert_eq!(collection.entries[1].source_path, root.join("users.rs"));
    }
}
