//! Route pattern compilation and matching.
//!
//! # Syntax
//! - `/users`: static segment (case-sensitive)
//! - `/users/:id`: required parameter
//! - `/posts/:id?`: optional parameter
//! - `/docs/*slug`: catch-all, one or more segments (`*slug?` allows zero)
//!
//! # Design Decisions
//! - Compiled once at registration, matched segment by segment
//! - Trailing and doubled slashes in the request path are ignored
//! - Parameter values are percent-decoded

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Required(String),
    Optional(String),
    CatchAll { name: String, optional: bool },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix('*') {
            match name.strip_suffix('?') {
                Some(name) => Segment::CatchAll {
                    name: name.to_string(),
                    optional: true,
                },
                None => Segment::CatchAll {
                    name: name.to_string(),
                    optional: false,
                },
            }
        } else if let Some(name) = raw.strip_prefix(':') {
            match name.strip_suffix('?') {
                Some(name) => Segment::Optional(name.to_string()),
                None => Segment::Required(name.to_string()),
            }
        } else {
            Segment::Static(raw.to_string())
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
    any: bool,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            segments: pattern
                .split('/')
                .filter(|s| !s.is_empty())
                .map(Segment::parse)
                .collect(),
            any: false,
        }
    }

    /// Matches every path. Used for the catch-all route.
    pub fn any() -> Self {
        Self {
            source: "*".to_string(),
            segments: Vec::new(),
            any: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of all parameters, in order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Required(n) | Segment::Optional(n) => Some(n.as_str()),
                Segment::CatchAll { name, .. } => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// Returns the extracted parameters when `path` matches.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        if self.any {
            return Some(HashMap::new());
        }
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &path_segments, HashMap::new())
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn match_segments(
    pattern: &[Segment],
    path: &[&str],
    mut params: HashMap<String, String>,
) -> Option<HashMap<String, String>> {
    let Some((segment, rest)) = pattern.split_first() else {
        return path.is_empty().then_some(params);
    };

    match segment {
        Segment::CatchAll { name, optional } => {
            if path.is_empty() && !optional {
                return None;
            }
            if !path.is_empty() {
                let joined: Vec<String> = path.iter().map(|s| decode(s)).collect();
                params.insert(name.clone(), joined.join("/"));
            }
            Some(params)
        }
        Segment::Optional(name) => {
            // Prefer consuming the segment; fall back to skipping it.
            if let Some((first, tail)) = path.split_first() {
                let mut consumed = params.clone();
                consumed.insert(name.clone(), decode(first));
                if let Some(found) = match_segments(rest, tail, consumed) {
                    return Some(found);
                }
            }
            match_segments(rest, path, params)
        }
        Segment::Required(name) => {
            let (first, tail) = path.split_first()?;
            params.insert(name.clone(), decode(first));
            match_segments(rest, tail, params)
        }
        Segment::Static(expected) => {
            let (first, tail) = path.split_first()?;
            if *first != expected.as_str() {
                return None;
            }
            match_segments(rest, tail, params)
        }
    }
}
