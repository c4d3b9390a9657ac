//! Convention-based API router.
//!
//! Files under an API root become routes: `users/:id.rs` serves
//! `/users/:id`. Each file's module is supplied by a [`ModuleLoader`] and may
//! export a single function, a per-method table, or a [`Resource`] type.
//! Handlers return values that are wrapped into a JSON envelope for HTTP
//! callers, and can call any other route in-process through
//! [`ApiRequest::api`].
//!
//! # Architecture Overview
//!
//! ```text
//!   <root>/**/*.rs ──▶ discovery ──▶ handler::normalize ──▶ routing::RouteTable
//!                      (walk, map,    (function | table |     (ordered, first match,
//!                       sort, load)    resource)               catch-all last)
//!                                                                   │
//!   HTTP ──▶ http::server ──▶ ApiRequest ──▶ RouteTable::dispatch ◀─┤
//!            (request id,                      │                    │
//!             trace, limits)                   ▼                    │
//!                                      http::envelope ──▶ JSON / status
//!                                              │
//!   req.api().get("/x") ──▶ routing::dispatch ─┘ (synthetic request, same table)
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ApiConfig;
pub use discovery::{ModuleLoader, ModuleRegistry};
pub use error::ApiError;
pub use handler::{Export, LoadedModule, MethodTable, Resource, ResourceMethods};
pub use http::{create_api, Api, ApiRequest, ApiResponse, ApiServer, HandlerResult, Reply};
pub use lifecycle::Shutdown;
pub use routing::RouterHandle;
