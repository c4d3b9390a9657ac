//! Shared fixtures for integration tests: temporary API trees and the module
//! registries that back them.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use convention_router::{
    create_api, ApiConfig, ApiError, ApiRequest, ApiResponse, HandlerResult, LoadedModule, MethodTable,
    ModuleRegistry, Reply, Resource, ResourceMethods, RouterHandle,
};

/// Creates an empty file for every path under a fresh temporary root.
pub fn api_tree(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        touch(dir.path(), file, "");
    }
    dir
}

pub fn touch(root: &Path, file: &str, contents: &str) {
    let path = root.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn config(root: &Path) -> ApiConfig {
    ApiConfig::with_root(root)
}

/// Mounts the API under `/api`, the way a host application would.
pub fn mount(config: ApiConfig, modules: &ModuleRegistry) -> Router {
    Router::new().nest("/api", create_api(config, modules).unwrap())
}

/// Sends one request through `app` and returns the status and JSON body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub fn not_implemented() -> Value {
    json!({"code": 400, "status": "error", "message": "Method Not Implemented"})
}

// ---------------------------------------------------------------------------
// Discovery fixture
// ---------------------------------------------------------------------------

pub const DISCOVERY_FILES: &[&str] = &[
    "index.rs",
    "named.rs",
    "counter.rs",
    "required-params/:dynamic.rs",
    "optional-params/:dynamic?.rs",
    "users.rs",
    "users/index.rs",
    "users/me.rs",
    "users/:id.rs",
    "files/*rest.rs",
    "status.rs",
    "text.rs",
    "panics.rs",
    "broken.rs",
    "empty.rs",
    "_helpers.rs",
    ".hidden/secret.rs",
    "_private/index.rs",
];

/// Remembers whether it has been called before.
pub struct Counter {
    called: AtomicBool,
}

impl Counter {
    async fn get(self: Arc<Self>, _req: ApiRequest, _res: ApiResponse) -> HandlerResult {
        let previously_called = self.called.swap(true, Ordering::SeqCst);
        Ok(Reply::success(previously_called))
    }
}

impl Resource for Counter {
    fn construct(_router: RouterHandle) -> Self {
        Counter {
            called: AtomicBool::new(false),
        }
    }

    fn bind(methods: ResourceMethods<Self>) -> ResourceMethods<Self> {
        methods.get(Self::get)
    }
}

fn echo_param(req: &ApiRequest) -> Value {
    match req.param("dynamic") {
        Some(value) => json!({ "dynamic": value }),
        None => json!({}),
    }
}

pub fn discovery_modules() -> ModuleRegistry {
    ModuleRegistry::new()
        .module("index.rs", || Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("ok")) })))
        .module("named.rs", || {
            Ok(LoadedModule::named(
                MethodTable::new()
                    .get(|_, _| async { Ok(Reply::success("get")) })
                    .post(|_, _| async { Ok(Reply::success("post")) })
                    .put(|_, _| async { Ok(Reply::success("put")) })
                    .delete(|_, _| async { Ok(Reply::success("delete")) })
                    .patch(|_, _| async {
                        Ok(Reply::from(json!({
                            "status": "error",
                            "message": "This Always Fails",
                            "code": 418,
                        })))
                    }),
            ))
        })
        .module("counter.rs", || Ok(LoadedModule::resource::<Counter>()))
        .module("required-params/:dynamic.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move { Ok(Reply::from(echo_param(&req))) }))
        })
        .module("optional-params/:dynamic?.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move { Ok(Reply::from(echo_param(&req))) }))
        })
        .module("users.rs", || Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("users.rs")) })))
        .module("users/index.rs", || {
            Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("users/index.rs")) }))
        })
        .module("users/me.rs", || Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("me")) })))
        .module("users/:id.rs", || {
            Ok(LoadedModule::named(MethodTable::new().all(|req: ApiRequest, _| async move {
                Ok(Reply::from(json!({
                    "id": req.param("id"),
                    "method": req.method().as_str(),
                    "body": req.body(),
                    "query": req.query(),
                })))
            })))
        })
        .module("files/*rest.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move {
                Ok(Reply::from(json!({ "rest": req.param("rest") })))
            }))
        })
        .module("status.rs", || {
            Ok(LoadedModule::named(
                MethodTable::new()
                    .get(|_, res: ApiResponse| async move {
                        res.status(StatusCode::ACCEPTED);
                        Ok(Reply::from(json!({ "queued": true })))
                    })
                    .post(|_, _| async { Err(ApiError::new(409, "Already Exists")) })
                    .delete(|_, _| async { Err(ApiError::msg("no code")) }),
            ))
        })
        .module("text.rs", || Ok(LoadedModule::function(|_, _| async { Ok(Reply::from(json!("plain"))) })))
        .module("panics.rs", || {
            Ok(LoadedModule::function(|_, _| async {
                if true {
                    panic!("handler exploded");
                }
                Ok(Reply::success("unreachable"))
            }))
        })
        .module("broken.rs", || Err("module failed to initialize".into()))
        .module("empty.rs", || Ok(LoadedModule::default()))
        .module("_helpers.rs", || Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("hidden")) })))
        .module(".hidden/secret.rs", || {
            Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("hidden")) }))
        })
}

pub fn discovery_app() -> (TempDir, Router) {
    let dir = api_tree(DISCOVERY_FILES);
    let app = mount(config(dir.path()), &discovery_modules());
    (dir, app)
}

// ---------------------------------------------------------------------------
// Sideways (internal call) fixture
// ---------------------------------------------------------------------------

pub const SIDEWAYS_FILES: &[&str] = &[
    "index.rs",
    "user.rs",
    "miniprofile.rs",
    "chain/a.rs",
    "chain/b.rs",
    "chain/c.rs",
    "tenant.rs",
    "whoami.rs",
    "missing.rs",
    "failing.rs",
    "rejects.rs",
    "typed.rs",
    "relative.rs",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub pkmn_count: u32,
    pub age: u32,
}

/// Set by outer middleware; read by handlers reached through internal calls.
#[derive(Debug, Clone)]
pub struct Tenant(pub &'static str);

async fn miniprofile(req: ApiRequest, _res: ApiResponse) -> HandlerResult {
    let profile = req.api().get("/user").await?;
    let first = profile["firstName"].as_str().unwrap_or_default();
    let last = profile["lastName"].as_str().unwrap_or_default();
    Ok(Reply::from(json!({ "name": format!("{first} {last}") })))
}

async fn typed(req: ApiRequest, _res: ApiResponse) -> HandlerResult {
    let profile: Profile = req.api().call_as(Method::GET, "/user", None).await?;
    Ok(Reply::success(profile.pkmn_count))
}

async fn chain(req: ApiRequest, next: &str, label: &str) -> HandlerResult {
    let inner = req.api().get(next).await?;
    let mut path = vec![Value::from(label)];
    if let Some(rest) = inner["path"].as_array() {
        path.extend(rest.iter().cloned());
    }
    Ok(Reply::from(json!({ "path": path })))
}

pub fn sideways_modules() -> ModuleRegistry {
    ModuleRegistry::new()
        .module("index.rs", || Ok(LoadedModule::function(|_, _| async { Ok(Reply::success("ok")) })))
        .module("user.rs", || {
            Ok(LoadedModule::function(|_, _| async {
                Ok(Reply::from(json!({
                    "firstName": "Ash",
                    "lastName": "Ketchum",
                    "pkmnCount": 151,
                    "age": 12,
                })))
            }))
        })
        .module("miniprofile.rs", || Ok(LoadedModule::function(miniprofile)))
        .module("typed.rs", || Ok(LoadedModule::function(typed)))
        .module("chain/a.rs", || Ok(LoadedModule::function(|req, _| chain(req, "/chain/b", "a"))))
        .module("chain/b.rs", || Ok(LoadedModule::function(|req, _| chain(req, "/chain/c", "b"))))
        .module("chain/c.rs", || {
            Ok(LoadedModule::function(|_, _| async { Ok(Reply::from(json!({ "path": ["c"] }))) }))
        })
        .module("whoami.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move {
                Ok(Reply::from(json!({
                    "tenant": req.extension::<Tenant>().map(|t| t.0),
                    "internal": req.is_internal(),
                    "originalUrl": req.original_url(),
                    "remoteIp": req.remote_ip().map(|ip| ip.to_string()),
                    "requestId": req.request_id(),
                })))
            }))
        })
        .module("tenant.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move {
                let inner = req.api().get("/whoami").await?;
                Ok(Reply::from(json!({ "outer": req.is_internal(), "inner": inner })))
            }))
        })
        .module("missing.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move {
                match req.api().get("/does-not-exist").await {
                    Err(ApiError::NotImplemented) => Ok(Reply::success("rejected")),
                    other => Ok(Reply::from(json!({ "unexpected": format!("{other:?}") }))),
                }
            }))
        })
        .module("failing.rs", || {
            Ok(LoadedModule::named(MethodTable::new().post(|_, _| async {
                Err(ApiError::new(422, "Unprocessable"))
            })))
        })
        .module("rejects.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move {
                // Propagates the callee's failure to the external caller.
                req.api().post("/failing", json!({})).await?;
                Ok(Reply::success("unreachable"))
            }))
        })
        .module("relative.rs", || {
            Ok(LoadedModule::function(|req: ApiRequest, _| async move {
                match req.api().get("user").await {
                    Err(ApiError::Usage(_)) => Ok(Reply::success("usage")),
                    other => Ok(Reply::from(json!({ "unexpected": format!("{other:?}") }))),
                }
            }))
        })
}

pub fn sideways_app() -> (TempDir, Router) {
    let dir = api_tree(SIDEWAYS_FILES);
    let app = mount(config(dir.path()), &sideways_modules());
    (dir, app)
}
