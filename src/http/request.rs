//! Request view handed to handlers.
//!
//! # Responsibilities
//! - Convert an inbound axum request into an [`ApiRequest`]
//! - Parse the body, query string and request id
//! - Derive synthetic requests for internal calls
//!
//! # Design Decisions
//! - Routing state (method, url, body, query, params) lives in owned override
//!   fields; everything ambient (headers, extensions, request id) lives in a
//!   shared [`RequestOrigin`]. Synthetic requests replace the former and keep
//!   the latter by reference, so authentication context set by outer
//!   middleware flows into every nested call.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, OriginalUri},
    http::{header, request::Parts, Extensions, HeaderMap, Method},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::routing::dispatch::{InternalApi, InternalCall};
use crate::routing::RouterHandle;

/// Header carrying the request identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Ambient, per-request state shared by reference with synthetic requests.
#[derive(Debug, Default)]
pub struct RequestOrigin {
    pub headers: HeaderMap,
    pub extensions: Extensions,
    pub request_id: Option<String>,
}

impl RequestOrigin {
    pub fn new(headers: HeaderMap, extensions: Extensions) -> Self {
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self {
            headers,
            extensions,
            request_id,
        }
    }
}

/// A request as seen by handlers, external or internal.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: String,
    path: String,
    body: Value,
    query: HashMap<String, String>,
    params: HashMap<String, String>,
    route: Option<String>,
    original_url: Option<String>,
    remote_ip: Option<IpAddr>,
    internal: Option<Arc<InternalCall>>,
    origin: Arc<RequestOrigin>,
    router: RouterHandle,
}

impl ApiRequest {
    /// A bare request with empty body and no ambient state.
    pub fn new(method: Method, url: &str, router: RouterHandle) -> Self {
        let (path, query) = split_url(url);
        Self {
            method,
            url: url.to_string(),
            path: path.to_string(),
            body: empty_body(),
            query: parse_query(query),
            params: HashMap::new(),
            route: None,
            original_url: Some(url.to_string()),
            remote_ip: None,
            internal: None,
            origin: Arc::new(RequestOrigin::default()),
            router,
        }
    }

    /// Builds the view for an inbound HTTP request.
    pub fn from_parts(parts: Parts, body: Bytes, router: RouterHandle) -> Result<Self, ApiError> {
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let original_url = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.to_string())
            .unwrap_or_else(|| url.clone());
        let remote_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let body = parse_body(&parts.headers, &body)?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parse_query(parts.uri.query()),
            url,
            body,
            params: HashMap::new(),
            route: None,
            original_url: Some(original_url),
            remote_ip,
            internal: None,
            origin: Arc::new(RequestOrigin::new(parts.headers, parts.extensions)),
            router,
        })
    }

    /// Derives the request used for an internal call.
    pub(crate) fn synthetic(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        call: Arc<InternalCall>,
    ) -> Self {
        let (path, query) = split_url(url);
        Self {
            method,
            url: url.to_string(),
            path: path.to_string(),
            body: body.unwrap_or_else(empty_body),
            query: parse_query(query),
            params: HashMap::new(),
            route: None,
            original_url: None,
            remote_ip: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            internal: Some(call),
            origin: Arc::clone(&self.origin),
            router: self.router.clone(),
        }
    }

    pub(crate) fn set_match(&mut self, route: &str, params: HashMap<String, String>) {
        self.route = Some(route.to_string());
        self.params = params;
    }

    pub(crate) fn internal_call(&self) -> Option<&Arc<InternalCall>> {
        self.internal.as_ref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path plus query string as routed.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// URL before any mount prefix was stripped. `None` for internal calls.
    pub fn original_url(&self) -> Option<&str> {
        self.original_url.as_deref()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Deserializes the body; a mismatch is a 400.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Pattern of the route that matched.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.remote_ip
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.origin.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.origin.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Ambient value inserted by outer middleware.
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.origin.extensions.get::<T>()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.origin.request_id.as_deref()
    }

    /// Whether this request was issued by another handler.
    pub fn is_internal(&self) -> bool {
        self.internal.is_some()
    }

    pub fn is_xhr(&self) -> bool {
        self.header("x-requested-with")
            .map(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
            .unwrap_or(false)
    }

    pub fn accepts_html(&self) -> bool {
        self.origin
            .headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }

    /// Router the request is being served by.
    pub fn router(&self) -> &RouterHandle {
        &self.router
    }

    /// Capability for calling other routes in-process.
    pub fn api(&self) -> InternalApi<'_> {
        InternalApi::new(&self.router, self)
    }
}

fn empty_body() -> Value {
    Value::Object(Map::new())
}

fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Value, ApiError> {
    if bytes.is_empty() {
        return Ok(empty_body());
    }

    let declared_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false);

    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Ok(value),
        Err(e) if declared_json => Err(ApiError::BadRequest(format!("Malformed JSON body: {e}"))),
        Err(_) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
