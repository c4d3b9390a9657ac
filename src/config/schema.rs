//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::MappingRules;

/// Root configuration for a convention-routed API.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Where API modules live and how they are named.
    pub discovery: DiscoveryConfig,

    /// Listener configuration (bind address, mount path).
    pub listener: ListenerConfig,

    /// Base page served to browsers on unmatched requests.
    pub static_page: StaticPageConfig,

    /// Request size and time limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ApiConfig {
    /// Defaults rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.discovery.root = root.into();
        config
    }
}

/// Discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// API root directory. Relative paths resolve against the working directory.
    pub root: PathBuf,

    /// Extension of routable files, without the dot.
    pub extension: String,

    /// File stem that maps to its directory's route.
    pub index_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            root: cwd.join("api"),
            extension: "rs".to_string(),
            index_name: "index".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn mapping_rules(&self) -> MappingRules {
        MappingRules::new(self.extension.clone(), self.index_name.clone())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the API is nested under by the standalone server.
    pub mount_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            mount_path: "/api".to_string(),
        }
    }
}

/// Static base page configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StaticPageConfig {
    pub enabled: bool,

    /// File name, relative to the API root.
    pub file: PathBuf,
}

impl Default for StaticPageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from("index.html"),
        }
    }
}

/// Limits applied at the HTTP edge.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request body, in bytes.
    pub max_body_bytes: usize,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
