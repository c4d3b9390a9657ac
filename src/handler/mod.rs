//! Handler model.
//!
//! # Data Flow
//! ```text
//! LoadedModule (default export | named exports)
//!     → normalize.rs (resolve shape once, build resources with the router)
//!     → HandlerRecord { MethodTag → Handler }
//!     → registered per method by lifecycle::startup
//! ```

pub mod method;
pub mod normalize;
pub mod record;

pub use method::MethodTag;
pub use normalize::{normalize, NormalizeError};
pub use record::{
    handler_fn, Export, Handler, HandlerRecord, LoadedModule, MethodTable, Resource, ResourceMethods,
};
