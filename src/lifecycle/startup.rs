//! Startup orchestration.
//!
//! # Responsibilities
//! - Collect route entries from the API root
//! - Load and normalize each module, in registration order
//! - Register every method of every module, then the catch-all
//! - Install the finished table into the router handle
//!
//! # Design Decisions
//! - A module that fails to load or exports nothing is skipped and reported;
//!   its siblings are still served
//! - Subsystems initialize in order, not concurrently
//! - Resources are constructed here, once, with the handle they will use for
//!   internal calls

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::DiscoveryConfig;
use crate::discovery::{collect, ModuleLoader, RouteEntry, ShadowedEntry};
use crate::error::{DiscoveryError, WalkError};
use crate::handler::{normalize, MethodTag};
use crate::http::envelope::wrap;
use crate::routing::{RoutePattern, RouteTable, RouterHandle};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("routes are already installed on this router handle")]
    AlreadyInstalled,
}

/// A module that was registered.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredRoute {
    pub route_pattern: String,
    pub source_path: PathBuf,
    pub module_key: String,
    pub methods: Vec<MethodTag>,
}

/// A module that was discovered but not registered.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedModule {
    pub route_pattern: String,
    pub module_key: String,
    pub error: String,
}

/// Everything discovery found, in registration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub root: PathBuf,
    pub registered: Vec<RegisteredRoute>,
    pub shadowed: Vec<ShadowedEntry>,
    pub skipped: Vec<SkippedModule>,
    pub walk_errors: Vec<WalkError>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.shadowed.is_empty() && self.skipped.is_empty() && self.walk_errors.is_empty()
    }

    pub fn find(&self, route_pattern: &str) -> Option<&RegisteredRoute> {
        self.registered.iter().find(|r| r.route_pattern == route_pattern)
    }
}

/// Builds the route table for `config.root` without installing it.
pub fn build_routes(
    config: &DiscoveryConfig,
    loader: &dyn ModuleLoader,
    router: &RouterHandle,
) -> (RouteTable, DiscoveryReport) {
    tracing::info!(root = %config.root.display(), "Discovering API modules");

    let collection = collect(&config.mapping_rules(), &config.root);
    let mut table = RouteTable::new();
    let mut report = DiscoveryReport {
        root: config.root.clone(),
        shadowed: collection.shadowed,
        walk_errors: collection.walk_errors,
        ..Default::default()
    };

    for entry in collection.entries {
        match register_entry(&mut table, &entry, loader, router) {
            Ok(methods) => {
                tracing::info!(
                    route = %entry.route_pattern,
                    methods = ?methods,
                    module = %entry.module_key,
                    "Registered API route"
                );
                report.registered.push(RegisteredRoute {
                    route_pattern: entry.route_pattern,
                    source_path: entry.source_path,
                    module_key: entry.module_key,
                    methods,
                });
            }
            Err(err) => {
                tracing::error!(route = %err.route(), error = %err, "Skipping API module");
                report.skipped.push(SkippedModule {
                    route_pattern: entry.route_pattern,
                    module_key: entry.module_key,
                    error: err.to_string(),
                });
            }
        }
    }

    table.register_fallback();

    tracing::info!(
        routes = report.registered.len(),
        shadowed = report.shadowed.len(),
        skipped = report.skipped.len(),
        walk_errors = report.walk_errors.len(),
        "API discovery complete"
    );

    (table, report)
}

/// Discovers, registers and installs routes into `router`.
pub fn install_routes(
    config: &DiscoveryConfig,
    loader: &dyn ModuleLoader,
    router: &RouterHandle,
) -> Result<DiscoveryReport, StartupError> {
    if router.is_ready() {
        return Err(StartupError::AlreadyInstalled);
    }

    let (table, report) = build_routes(config, loader, router);
    router
        .install(table)
        .map_err(|_| StartupError::AlreadyInstalled)?;
    Ok(report)
}

fn register_entry(
    table: &mut RouteTable,
    entry: &RouteEntry,
    loader: &dyn ModuleLoader,
    router: &RouterHandle,
) -> Result<Vec<MethodTag>, DiscoveryError> {
    let module = loader.load(entry).map_err(|source| DiscoveryError::ModuleLoad {
        route: entry.route_pattern.clone(),
        path: entry.source_path.clone(),
        source,
    })?;

    let record = normalize(module, router).map_err(|_| DiscoveryError::InvalidHandler {
        route: entry.route_pattern.clone(),
        path: entry.source_path.clone(),
    })?;

    let pattern = RoutePattern::parse(&entry.route_pattern);
    let methods = record.methods();
    for (tag, handler) in record {
        table.register(tag, pattern.clone(), wrap(handler, &entry.route_pattern));
    }

    Ok(methods)
}
