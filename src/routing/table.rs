//! Ordered route table.
//!
//! # Responsibilities
//! - Store endpoints in registration order
//! - Find the first slot whose method and pattern accept a request
//! - Answer unmatched requests with the catch-all envelope
//!
//! # Design Decisions
//! - First match wins; precedence is decided entirely by registration order
//! - Immutable once installed into a [`RouterHandle`](crate::routing::RouterHandle)
//! - The same table serves external and internal requests

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};

use crate::error::ApiError;
use crate::handler::MethodTag;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::routing::pattern::RoutePattern;

/// A registered, already-adapted handler. It finishes the request itself:
/// by writing the response, or by completing the internal call.
pub type Endpoint = Arc<dyn Fn(ApiRequest, ApiResponse) -> BoxFuture<'static, ()> + Send + Sync>;

struct RouteSlot {
    method: MethodTag,
    pattern: RoutePattern,
    endpoint: Endpoint,
}

/// Routes in matching order.
#[derive(Default)]
pub struct RouteTable {
    slots: Vec<RouteSlot>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route; it matches after everything registered before it.
    pub fn register(&mut self, method: MethodTag, pattern: RoutePattern, endpoint: Endpoint) {
        self.slots.push(RouteSlot {
            method,
            pattern,
            endpoint,
        });
    }

    /// Appends the catch-all route. Must be the last registration.
    pub fn register_fallback(&mut self) {
        self.register(MethodTag::All, RoutePattern::any(), Arc::new(not_found));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(method, pattern)` pairs in matching order.
    pub fn routes(&self) -> Vec<(MethodTag, String)> {
        self.slots
            .iter()
            .map(|slot| (slot.method, slot.pattern.as_str().to_string()))
            .collect()
    }

    /// The first route accepting `method` and `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<(MethodTag, &str, HashMap<String, String>)> {
        self.find(method, path)
            .map(|(slot, params)| (slot.method, slot.pattern.as_str(), params))
    }

    fn find(&self, method: &Method, path: &str) -> Option<(&RouteSlot, HashMap<String, String>)> {
        self.slots
            .iter()
            .filter(|slot| slot.method.matches(method))
            .find_map(|slot| slot.pattern.matches(path).map(|params| (slot, params)))
    }

    /// Routes `req` to the first matching endpoint and runs it to completion.
    pub async fn dispatch(&self, mut req: ApiRequest, res: ApiResponse) {
        match self.find(req.method(), req.path()) {
            Some((slot, params)) => {
                req.set_match(slot.pattern.as_str(), params);
                let endpoint = Arc::clone(&slot.endpoint);
                endpoint(req, res).await
            }
            None => not_found(req, res).await,
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| format!("{} {}", s.method, s.pattern)))
            .finish()
    }
}

/// Catch-all endpoint: 400 `Method Not Implemented`, or a rejected internal call.
fn not_found(req: ApiRequest, res: ApiResponse) -> BoxFuture<'static, ()> {
    async move {
        res.mark_unmatched();
        match req.internal_call() {
            Some(call) => {
                tracing::warn!(
                    request_id = req.request_id().unwrap_or("-"),
                    method = %req.method(),
                    path = %req.path(),
                    "Internal API call matched no route"
                );
                call.complete(Err(ApiError::NotImplemented));
            }
            None => {
                tracing::warn!(
                    request_id = req.request_id().unwrap_or("-"),
                    method = %req.method(),
                    path = %req.path(),
                    "Error routing to API path"
                );
                res.send(StatusCode::BAD_REQUEST, ApiError::NotImplemented.envelope().into_value());
            }
        }
    }
    .boxed()
}
