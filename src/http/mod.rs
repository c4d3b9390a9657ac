//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, panics, timeout, body limit)
//!     → request.rs (ApiRequest: body, query, origin headers/extensions)
//!     → routing::RouteTable (first matching route)
//!     → envelope.rs (handler outcome → status + JSON body)
//!     → response.rs (ApiResponse → axum Response)
//!     → static base page when nothing matched and a browser asked for HTML
//! ```

pub mod envelope;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiRequest, RequestOrigin, X_REQUEST_ID};
pub use response::{is_structured, ApiResponse, EnvelopeStatus, HandlerResult, Reply, ResponseEnvelope};
pub use server::{create_api, Api, ApiServer};
