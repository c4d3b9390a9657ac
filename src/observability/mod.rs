//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (route, path, request_id)
//!     → logging.rs installs the subscriber that formats them
//!
//! The HTTP edge adds:
//!     → TraceLayer spans per request
//!     → x-request-id generated or propagated, logged by internal calls
//! ```
//!
//! # Design Decisions
//! - Request ID flows through external and internal requests alike
//! - Logging never changes control flow

pub mod logging;

pub use logging::init_logging;
