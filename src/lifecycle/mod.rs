//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Walk API root → Load modules → Normalize → Register in order
//!     → Register catch-all → Install into RouterHandle
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT or Shutdown::trigger → Stop accepting → Drain → Exit
//! ```
//!
//! # Design Decisions
//! - Discovery finishes before the handle is installed and before traffic
//! - A broken module is reported and skipped; startup itself does not fail

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{install_routes, DiscoveryReport, RegisteredRoute, SkippedModule, StartupError};
