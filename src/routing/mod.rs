//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     sorted RouteEntry[]
//!     → normalize modules into HandlerRecords
//!     → register (method, pattern, endpoint) in order, catch-all last
//!     → install into RouterHandle, immutable from then on
//!
//! Incoming Request (external or internal):
//!     → table.rs (first slot whose method and pattern match)
//!     → pattern.rs (extract params)
//!     → endpoint (adapter or catch-all)
//! ```
//!
//! # Design Decisions
//! - First match wins; order is decided at registration, not by specificity
//! - One table serves both external traffic and in-process calls
//! - The handle is created before discovery so resources can hold it, and
//!   filled exactly once afterwards

pub mod dispatch;
pub mod pattern;
pub mod table;

use std::fmt;
use std::sync::{Arc, OnceLock};

use axum::http::Method;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::request::ApiRequest;

pub use dispatch::{CallOutcome, InternalApi};
pub use pattern::RoutePattern;
pub use table::{Endpoint, RouteTable};

/// Shared, install-once reference to the route table.
#[derive(Clone, Default)]
pub struct RouterHandle {
    table: Arc<OnceLock<Arc<RouteTable>>>,
}

impl RouterHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the table. Fails, returning it, if one is already installed.
    pub fn install(&self, table: RouteTable) -> Result<(), RouteTable> {
        self.table
            .set(Arc::new(table))
            .map_err(|rejected| Arc::try_unwrap(rejected).unwrap_or_default())
    }

    pub fn table(&self) -> Option<Arc<RouteTable>> {
        self.table.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.table.get().is_some()
    }

    /// Issues an internal call on behalf of `source`.
    pub async fn call(
        &self,
        source: &ApiRequest,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        dispatch::dispatch(self, method, source, path, body).await
    }
}

impl fmt::Debug for RouterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterHandle")
            .field("routes", &self.table.get().map(|t| t.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_once() {
        let router = RouterHandle::new();
        let clone = router.clone();
        assert!(!clone.is_ready());

        let mut table = RouteTable::new();
        table.register_fallback();
        assert!(router.install(table).is_ok());
        assert!(clone.is_ready());
        assert_eq!(clone.table().unwrap().len(), 1);

        let rejected = router.install(RouteTable::new());
        assert!(rejected.is_err());
        assert_eq!(clone.table().unwrap().len(), 1);
    }
}
