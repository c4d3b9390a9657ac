//! In-process calls between handlers.
//!
//! # Responsibilities
//! - Build a synthetic request from the calling one
//! - Run it through the same route table as external traffic
//! - Deliver the handler's outcome back to the caller
//!
//! # Data Flow
//! ```text
//! handler ──► req.api().get("/users/7")
//!                │
//!                ▼
//!     synthetic ApiRequest + InternalCall ──► RouteTable::dispatch
//!                                                   │
//!             adapter / fallback ──► InternalCall::complete
//!                │
//!                ▼
//!     Result<Value, ApiError> ──► caller
//! ```
//!
//! # Design Decisions
//! - The nested handler writes to a detached [`ApiResponse`]; the caller's
//!   response is never touched
//! - Each call completes at most once; a call dropped without completion is
//!   reported as a server error

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::routing::RouterHandle;

/// Outcome delivered to an internal caller.
pub type CallOutcome = Result<Value, ApiError>;

/// Marker carried by a synthetic request; completes the waiting caller.
pub struct InternalCall {
    completion: Mutex<Option<oneshot::Sender<CallOutcome>>>,
}

impl InternalCall {
    pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<CallOutcome>) {
        let (tx, rx) = oneshot::channel();
        let call = Arc::new(Self {
            completion: Mutex::new(Some(tx)),
        });
        (call, rx)
    }

    /// Delivers the outcome. Returns `false` if the call was already completed.
    pub(crate) fn complete(&self, outcome: CallOutcome) -> bool {
        let sender = self
            .completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            // A caller that stopped waiting is not an error for the callee.
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for InternalCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalCall")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Issues `method path` against the installed route table on behalf of `source`.
pub async fn dispatch(
    router: &RouterHandle,
    method: Method,
    source: &ApiRequest,
    path: &str,
    body: Option<Value>,
) -> CallOutcome {
    if !path.starts_with('/') {
        tracing::error!(
            request_id = source.request_id().unwrap_or("-"),
            path = %path,
            "Internal API call requires an absolute path"
        );
        return Err(ApiError::Usage(format!("path must start with '/', got {path:?}")));
    }

    let Some(table) = router.table() else {
        return Err(ApiError::Usage("routes are not installed yet".to_string()));
    };

    let (call, completion) = InternalCall::new();
    let request = source.synthetic(method, path, body, call);

    tracing::debug!(
        request_id = source.request_id().unwrap_or("-"),
        method = %request.method(),
        path = %path,
        "Internal API call"
    );

    table.dispatch(request, ApiResponse::new()).await;

    match completion.await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(
                request_id = source.request_id().unwrap_or("-"),
                path = %path,
                "Internal API call finished without a result"
            );
            Err(ApiError::ServerError)
        }
    }
}

/// Internal-call capability bound to the request that holds it.
///
/// ```ignore
/// let user = req.api().get("/users/7").await?;
/// let created = req.api().post("/users", json!({"name": "Ash"})).await?;
/// ```
pub struct InternalApi<'a> {
    router: &'a RouterHandle,
    source: &'a ApiRequest,
}

impl<'a> InternalApi<'a> {
    pub(crate) fn new(router: &'a RouterHandle, source: &'a ApiRequest) -> Self {
        Self { router, source }
    }

    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> CallOutcome {
        dispatch(self.router, method, self.source, path, body).await
    }

    /// Like [`call`](Self::call), deserializing the value into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.call(method, path, body).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::msg(format!("unexpected response from {path}: {e}")))
    }

    pub async fn get(&self, path: &str) -> CallOutcome {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> CallOutcome {
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> CallOutcome {
        self.call(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> CallOutcome {
        self.call(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> CallOutcome {
        self.call(Method::DELETE, path, None).await
    }

    /// GET carrying a body, for routes that read one regardless of method.
    pub async fn get_with(&self, path: &str, body: Value) -> CallOutcome {
        self.call(Method::GET, path, Some(body)).await
    }

    pub async fn delete_with(&self, path: &str, body: Value) -> CallOutcome {
        self.call(Method::DELETE, path, Some(body)).await
    }
}
