//! Export normalization.
//!
//! # Responsibilities
//! - Pick the default export over named exports
//! - Instantiate resource types exactly once, handing them the router
//! - Reject modules that serve no method

use thiserror::Error;

use crate::handler::method::MethodTag;
use crate::handler::record::{Export, HandlerRecord, LoadedModule, MethodTable};
use crate::routing::RouterHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no valid HTTP method exported")]
    NoValidMethod,
}

/// Resolves a loaded module into its handler record.
pub fn normalize(module: LoadedModule, router: &RouterHandle) -> Result<HandlerRecord, NormalizeError> {
    let export = module.default.unwrap_or(Export::Table(module.named));

    let table = match export {
        Export::Function(handler) => {
            let mut table = MethodTable::new();
            table.insert(MethodTag::Get, handler);
            table
        }
        Export::Table(table) => table,
        Export::Constructor(construct) => construct(router.clone()),
    };

    HandlerRecord::from_table(table).ok_or(NormalizeError::NoValidMethod)
}
