//! Convention-based discovery of API modules.
//!
//! # Data Flow
//! ```text
//! <root> directory
//!     → walker.rs (sorted depth-first walk, excluded names pruned)
//!     → mapper.rs (file path → route pattern, module key)
//!     → collector.rs (descending order, duplicate patterns shadowed)
//!     → loader.rs (module key → LoadedModule)
//! ```

pub mod collector;
pub mod loader;
pub mod mapper;
pub mod walker;

pub use collector::{collect, Collection, RouteEntry, ShadowedEntry};
pub use loader::{BoxError, LoadError, ModuleLoader, ModuleRegistry};
pub use mapper::{map_path, MappingRules};
