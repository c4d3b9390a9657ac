//! HTTP method tags a module may export.

use std::fmt;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// The fixed set of method names recognized on a module export.
///
/// Ordering matters: registration for a single pattern follows this order,
/// so an `ALL` handler is consulted before the method-specific ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MethodTag {
    All,
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl MethodTag {
    pub const TAGS: [MethodTag; 6] = [
        MethodTag::All,
        MethodTag::Get,
        MethodTag::Post,
        MethodTag::Put,
        MethodTag::Patch,
        MethodTag::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodTag::All => "ALL",
            MethodTag::Get => "GET",
            MethodTag::Post => "POST",
            MethodTag::Put => "PUT",
            MethodTag::Patch => "PATCH",
            MethodTag::Delete => "DELETE",
        }
    }

    /// Whether a request with `method` is served by a handler under this tag.
    ///
    /// `ALL` accepts anything; `GET` also answers `HEAD`.
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodTag::All => true,
            MethodTag::Get => method == Method::GET || method == Method::HEAD,
            MethodTag::Post => method == Method::POST,
            MethodTag::Put => method == Method::PUT,
            MethodTag::Patch => method == Method::PATCH,
            MethodTag::Delete => method == Method::DELETE,
        }
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
