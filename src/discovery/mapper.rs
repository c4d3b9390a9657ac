//! File path to route pattern mapping.
//!
//! ```text
//! <root>/index.rs                      → /
//! <root>/users.rs                      → /users
//! <root>/users/index.rs                → /users
//! <root>/users/:id.rs                  → /users/:id
//! <root>/optional-params/:dynamic?.rs  → /optional-params/:dynamic?
//! <root>/_helpers.rs, <root>/.hidden/  → not routed
//! ```
//!
//! Segments are kept verbatim; [`RoutePattern`](crate::routing::RoutePattern)
//! gives `:name`, `:name?` and `*name` their meaning.

use std::path::{Component, Path};

/// File naming conventions for the API tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRules {
    /// Extension (without the dot) of routable files.
    pub extension: String,
    /// File stem that maps to its directory's path.
    pub index_name: String,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            extension: "rs".to_string(),
            index_name: "index".to_string(),
        }
    }
}

impl MappingRules {
    pub fn new(extension: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            index_name: index_name.into(),
        }
    }

    /// Whether `path` carries the routable extension.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == self.extension)
            .unwrap_or(false)
    }
}

/// Hidden (`.`) and private (`_`) names are never routed.
pub fn is_excluded_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Relative path segments of `file` under `root`. `None` outside the root or
/// for non UTF-8 names.
fn relative_segments(root: &Path, file: &Path) -> Option<Vec<String>> {
    file.strip_prefix(root)
        .ok()?
        .components()
        .map(|component| match component {
            Component::Normal(name) => name.to_str().map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Maps `file` to its route pattern.
///
/// Returns `None` when the file is outside `root`, lacks the routable
/// extension, or sits under an excluded name.
pub fn map_path(rules: &MappingRules, root: &Path, file: &Path) -> Option<String> {
    if !rules.accepts(file) {
        return None;
    }

    let mut segments = relative_segments(root, file)?;
    if segments.iter().any(|s| is_excluded_name(s)) {
        return None;
    }

    let last = segments.pop()?;
    let stem = Path::new(&last).file_stem()?.to_str()?.to_string();
    if stem != rules.index_name {
        segments.push(stem);
    }

    Some(format!("/{}", segments.join("/")))
}

/// Loader key for `file`: its path under `root`, `/`-separated.
pub fn module_key(root: &Path, file: &Path) -> Option<String> {
    relative_segments(root, file)
        .filter(|segments| !segments.is_empty())
        .map(|segments| segments.join("/"))
}
