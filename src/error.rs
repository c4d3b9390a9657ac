//! Error types shared across subsystems.
//!
//! # Taxonomy
//! - [`ApiError`]: request-time failures. External callers see them as a JSON
//!   envelope plus status; internal callers receive them unmodified.
//! - [`DiscoveryError`]: a module that could not be loaded or bound. Reported
//!   and skipped, never fatal.
//! - [`WalkError`]: an unreadable part of the API tree. Reported and skipped.

use std::path::PathBuf;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::discovery::loader::LoadError;
use crate::http::response::ResponseEnvelope;

/// Message used for handler output that is not a structured value.
pub const INVALID_RESPONSE: &str = "Invalid Response";

/// Message used by the catch-all route.
pub const NOT_IMPLEMENTED: &str = "Method Not Implemented";

/// Errors produced while serving a request, externally or internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// A handler rejected the request.
    #[error("{message}")]
    Failure {
        /// HTTP status to report; 500 when absent.
        code: Option<u16>,
        message: String,
    },

    /// The handler produced something other than a structured value.
    #[error("{}", INVALID_RESPONSE)]
    InvalidResponse,

    /// No route matched the method and path.
    #[error("{}", NOT_IMPLEMENTED)]
    NotImplemented,

    /// The request payload could not be interpreted.
    #[error("{0}")]
    BadRequest(String),

    /// An internal call finished without producing a result.
    #[error("Server Error")]
    ServerError,

    /// An internal call was issued incorrectly by the calling handler.
    #[error("invalid internal API call: {0}")]
    Usage(String),
}

impl ApiError {
    /// Failure with an explicit status code.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        ApiError::Failure {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Failure without a status code (reported as 500).
    pub fn msg(message: impl Into<String>) -> Self {
        ApiError::Failure {
            code: None,
            message: message.into(),
        }
    }

    /// Builds a failure from a returned `{status: "error", code?, message?}` value.
    pub fn from_value(value: &Value) -> Self {
        let code = value
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok());
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Server Error")
            .to_string();
        ApiError::Failure { code, message }
    }

    /// Numeric code carried by the error, if any.
    pub fn code(&self) -> Option<u16> {
        match self {
            ApiError::Failure { code, .. } => *code,
            ApiError::NotImplemented | ApiError::BadRequest(_) => Some(400),
            ApiError::InvalidResponse | ApiError::ServerError | ApiError::Usage(_) => Some(500),
        }
    }

    /// HTTP status for external callers. Invalid codes fall back to 500.
    pub fn status_code(&self) -> StatusCode {
        self.code()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The JSON body sent to external callers.
    pub fn envelope(&self) -> ResponseEnvelope {
        match self {
            ApiError::NotImplemented | ApiError::BadRequest(_) => {
                ResponseEnvelope::error(self.to_string()).with_code(400)
            }
            _ => ResponseEnvelope::error(self.to_string()),
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ApiError::NotImplemented)
    }
}

/// A discovered module that could not be registered.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Loading the module failed.
    #[error("error in API {route}: failed to load {}: {source}", .path.display())]
    ModuleLoad {
        route: String,
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// The module exports no recognized HTTP method.
    #[error("error in API {route}: no valid HTTP method exported by {}", .path.display())]
    InvalidHandler { route: String, path: PathBuf },
}

impl DiscoveryError {
    pub fn route(&self) -> &str {
        match self {
            DiscoveryError::ModuleLoad { route, .. } | DiscoveryError::InvalidHandler { route, .. } => route,
        }
    }
}

/// A part of the API tree that could not be read.
#[derive(Debug, Clone, Error, Serialize)]
#[error("error reading API directory {}: {message}", .path.display())]
pub struct WalkError {
    pub path: PathBuf,
    pub message: String,
}
