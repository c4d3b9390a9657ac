//! Response handle, handler replies and the JSON envelope.
//!
//! # Responsibilities
//! - Give handlers a writable response they can finish themselves
//! - Define the value a handler returns ([`Reply`])
//! - Define the canonical `{status, data|message, code}` envelope
//!
//! # Design Decisions
//! - [`ApiResponse`] is a cheap cloneable handle over shared state; the edge
//!   turns it into an axum response after dispatch
//! - Internal calls get a detached handle, so nothing a nested handler writes
//!   reaches the caller's response

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A value to send back. Objects and arrays are structured values; any
    /// other JSON value breaks the handler contract.
    Json(Value),
    /// The handler already wrote the response through [`ApiResponse`].
    Sent,
}

impl Reply {
    /// Serializes `value` into a reply.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Reply::Json)
            .map_err(|e| ApiError::msg(format!("failed to serialize reply: {e}")))
    }

    /// `{status: "success", data}`.
    pub fn success(data: impl Into<Value>) -> Self {
        Reply::Json(ResponseEnvelope::success(data.into()).into_value())
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

/// Result every handler returns.
pub type HandlerResult = Result<Reply, ApiError>;

/// Whether a value satisfies the handler contract.
pub fn is_structured(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Envelope status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// The canonical JSON shape sent to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            code: None,
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            status: EnvelopeStatus::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn into_value(self) -> Value {
        // Plain struct of strings, numbers and values; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Json(Value),
    Text(String),
}

#[derive(Debug, Default)]
struct ResponseState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Payload>,
    unmatched: bool,
}

/// Writable response shared between the edge, the adapter and the handler.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    state: Arc<Mutex<ResponseState>>,
}

impl ApiResponse {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the status code.
    pub fn status(&self, status: StatusCode) -> &Self {
        self.lock().status = Some(status);
        self
    }

    /// Status set so far, if any.
    pub fn current_status(&self) -> Option<StatusCode> {
        self.lock().status
    }

    pub fn header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        self.lock().headers.insert(name, value);
        self
    }

    /// Writes a JSON body.
    pub fn json(&self, value: Value) -> &Self {
        self.lock().body = Some(Payload::Json(value));
        self
    }

    /// Writes a plain-text body.
    pub fn text(&self, body: impl Into<String>) -> &Self {
        self.lock().body = Some(Payload::Text(body.into()));
        self
    }

    /// Whether a body has been written.
    pub fn is_sent(&self) -> bool {
        self.lock().body.is_some()
    }

    /// The JSON body written so far.
    pub fn sent_json(&self) -> Option<Value> {
        match &self.lock().body {
            Some(Payload::Json(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Writes `body` with `status`.
    pub(crate) fn send(&self, status: StatusCode, body: Value) {
        let mut state = self.lock();
        state.status = Some(status);
        state.body = Some(Payload::Json(body));
    }

    pub(crate) fn mark_unmatched(&self) {
        self.lock().unmatched = true;
    }

    /// Whether the request fell through to the catch-all route.
    pub fn is_unmatched(&self) -> bool {
        self.lock().unmatched
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let state = std::mem::take(&mut *self.lock());
        let status = state.status.unwrap_or(StatusCode::OK);

        let mut response = match state.body {
            Some(Payload::Json(value)) => Json(value).into_response(),
            Some(Payload::Text(text)) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
                text,
            )
                .into_response(),
            None => Response::new(Body::empty()),
        };

        *response.status_mut() = status;
        response.headers_mut().extend(state.headers);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_values() {
        assert!(is_structured(&json!({})));
        assert!(is_structured(&json!([1, 2])));
        assert!(!is_structured(&json!("text")));
        assert!(!is_structured(&json!(3)));
        assert!(!is_structured(&Value::Null));
    }

    #[test]
    fn test_success_reply_shape() {
        assert_eq!(Reply::success("ok"), Reply::Json(json!({"status": "success", "data": "ok"})));
    }

    #[test]
    fn test_handle_is_shared() {
        let res = ApiResponse::new();
        let clone = res.clone();
        clone.status(StatusCode::CREATED).json(json!({"id": 1}));

        assert!(res.is_sent());
        assert_eq!(res.current_status(), Some(StatusCode::CREATED));
        assert_eq!(res.sent_json(), Some(json!({"id": 1})));
    }

    #[test]
    fn test_into_response_defaults_to_200() {
        let res = ApiResponse::new();
        res.text("hello");
        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
