//! Response envelope adapter.
//!
//! Wraps a [`Handler`] into a table [`Endpoint`] that turns whatever the
//! handler produced into exactly one outcome:
//!
//! | handler outcome          | external caller                        | internal caller          |
//! |--------------------------|----------------------------------------|--------------------------|
//! | structured value `v`     | `v`, status from `v.code` / set / 200  | `Ok(v)`; `status:"error"` rejects |
//! | `Reply::Sent`            | left as written                        | written JSON, if structured |
//! | `Err(e)`                 | `e.code` (500) + `{status, message}`   | `Err(e)` unmodified      |
//! | anything else            | 500 `Invalid Response`                 | `Err(InvalidResponse)`   |

use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::FutureExt;
use serde_json::Value;

use crate::error::{ApiError, INVALID_RESPONSE};
use crate::handler::Handler;
use crate::http::request::ApiRequest;
use crate::http::response::{is_structured, ApiResponse, HandlerResult, Reply, ResponseEnvelope};
use crate::routing::table::Endpoint;

/// Adapts `handler`, registered under `route`, into an endpoint.
pub fn wrap(handler: Handler, route: &str) -> Endpoint {
    let route: Arc<str> = Arc::from(route);

    Arc::new(move |req: ApiRequest, res: ApiResponse| {
        let handler = Arc::clone(&handler);
        let route = Arc::clone(&route);

        async move {
            let internal = req.internal_call().cloned();
            let request_id = req.request_id().unwrap_or("-").to_string();
            let method = req.method().clone();

            let outcome = handler(req, res.clone()).await;

            match internal {
                Some(call) => {
                    let result = resolve_internal(outcome, &res);
                    if let Err(e) = &result {
                        tracing::debug!(
                            request_id = %request_id,
                            route = %route,
                            method = %method,
                            error = %e,
                            "Internal API call rejected"
                        );
                    }
                    call.complete(result);
                }
                None => respond_external(outcome, &res, &route, &request_id),
            }
        }
        .boxed()
    })
}

fn resolve_internal(outcome: HandlerResult, res: &ApiResponse) -> Result<Value, ApiError> {
    let value = match outcome? {
        Reply::Json(value) => value,
        Reply::Sent => res.sent_json().ok_or(ApiError::InvalidResponse)?,
    };

    if !is_structured(&value) {
        return Err(ApiError::InvalidResponse);
    }
    if value.get("status").and_then(Value::as_str) == Some("error") {
        return Err(ApiError::from_value(&value));
    }
    Ok(value)
}

fn respond_external(outcome: HandlerResult, res: &ApiResponse, route: &str, request_id: &str) {
    match outcome {
        Ok(Reply::Json(value)) if is_structured(&value) => {
            let status = value
                .get("code")
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok())
                .and_then(|c| StatusCode::from_u16(c).ok())
                .or_else(|| res.current_status())
                .unwrap_or(StatusCode::OK);
            res.send(status, value);
        }
        Ok(Reply::Json(value)) => {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                value = %value,
                "API handler returned a value that is not an object or array"
            );
            res.send(
                StatusCode::INTERNAL_SERVER_ERROR,
                ResponseEnvelope::error(INVALID_RESPONSE).into_value(),
            );
        }
        Ok(Reply::Sent) => {
            if !res.is_sent() {
                tracing::warn!(
                    request_id = %request_id,
                    route = %route,
                    "API handler reported a sent response but wrote no body"
                );
            }
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                error = %e,
                "API handler failed"
            );
            res.send(e.status_code(), e.envelope().into_value());
        }
    }
}
