//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the mountable Axum Router for a discovered API
//! - Wire up middleware (request ID, tracing, panic containment, timeout)
//! - Answer timeouts with the same JSON envelope as every other failure
//! - Buffer bodies under the configured limit and build the request view
//! - Dispatch requests to the route table
//! - Serve the static base page for unmatched browser navigation
//! - Bind server to listener with graceful shutdown

use std::any::Any;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeFile,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ApiConfig, LimitsConfig};
use crate::discovery::ModuleLoader;
use crate::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::{ApiResponse, ResponseEnvelope};
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::lifecycle::signals::forward_signals;
use crate::lifecycle::startup::{install_routes, DiscoveryReport, StartupError};
use crate::routing::RouterHandle;

/// Application state injected into the edge handler.
#[derive(Clone)]
pub struct AppState {
    pub router: RouterHandle,
    pub limits: LimitsConfig,
    /// Base page, when enabled.
    pub static_page: Option<PathBuf>,
}

/// A discovered API, ready to be mounted.
pub struct Api {
    config: ApiConfig,
    router: RouterHandle,
    report: DiscoveryReport,
}

impl Api {
    /// Walks `config.discovery.root`, loads every module through `loader` and
    /// installs the resulting routes.
    pub fn discover(config: ApiConfig, loader: &dyn ModuleLoader) -> Result<Self, StartupError> {
        let router = RouterHandle::new();
        let report = install_routes(&config.discovery, loader, &router)?;
        Ok(Self {
            config,
            router,
            report,
        })
    }

    pub fn router(&self) -> &RouterHandle {
        &self.router
    }

    pub fn report(&self) -> &DiscoveryReport {
        &self.report
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The API as an Axum router, to be nested wherever the host wants it.
    pub fn into_router(self) -> Router {
        let static_page = self
            .config
            .static_page
            .enabled
            .then(|| self.config.discovery.root.join(&self.config.static_page.file));

        let state = AppState {
            router: self.router,
            limits: self.config.limits.clone(),
            static_page,
        };

        Router::new()
            .route("/{*path}", any(api_handler))
            .route("/", any(api_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.limits.request_timeout(),
            ))
            .layer(map_response(timeout_envelope))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }
}

/// Discovers the API under `config` and returns it as a mountable router.
///
/// ```ignore
/// let app = Router::new().nest("/api", create_api(config, &modules)?);
/// ```
pub fn create_api(config: ApiConfig, loader: &dyn ModuleLoader) -> Result<Router, StartupError> {
    Ok(Api::discover(config, loader)?.into_router())
}

/// Standalone server for a discovered API.
pub struct ApiServer {
    app: Router,
    config: ApiConfig,
    report: DiscoveryReport,
}

impl ApiServer {
    /// Discovers the API and mounts it at `config.listener.mount_path`.
    pub fn new(config: ApiConfig, loader: &dyn ModuleLoader) -> Result<Self, StartupError> {
        Ok(Self::from_api(Api::discover(config, loader)?))
    }

    pub fn from_api(api: Api) -> Self {
        let config = api.config.clone();
        let report = api.report.clone();
        let app = mount(&config.listener.mount_path, api.into_router());
        Self { app, config, report }
    }

    pub fn report(&self) -> &DiscoveryReport {
        &self.report
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Binds `listener.bind_address`.
    pub async fn bind(&self) -> Result<TcpListener, std::io::Error> {
        TcpListener::bind(self.config.listener.bind_address.as_str()).await
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let listener = self.bind().await?;
        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        let _signals = forward_signals(&shutdown);
        self.run(listener, receiver).await
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.config.listener.mount_path,
            routes = self.report.registered.len(),
            "HTTP server starting"
        );

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn mount(path: &str, api: Router) -> Router {
    if path == "/" {
        api
    } else {
        Router::new().nest(path, api)
    }
}

/// Edge handler: one per request, external traffic only.
async fn api_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.limits.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Rejected request body");
            let too_large = std::error::Error::source(&e).is_some_and(|source| source.is::<LengthLimitError>());
            return if too_large {
                error_response(ApiError::new(413, "Payload Too Large"))
            } else {
                error_response(ApiError::BadRequest("Unreadable Request Body".to_string()))
            };
        }
    };

    let req = match ApiRequest::from_parts(parts, bytes, state.router.clone()) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed request");
            return error_response(e);
        }
    };

    let Some(table) = state.router.table() else {
        tracing::error!("Request received before routes were installed");
        return error_response(ApiError::ServerError);
    };

    let wants_page = matches!(*req.method(), Method::GET | Method::HEAD) && req.accepts_html() && !req.is_xhr();
    let request_id = req.request_id().map(str::to_string);

    let response = ApiResponse::new();
    table.dispatch(req, response.clone()).await;

    if response.is_unmatched() && wants_page {
        if let Some(page) = &state.static_page {
            if is_file(page).await {
                tracing::debug!(
                    request_id = request_id.as_deref().unwrap_or("-"),
                    page = %page.display(),
                    "Serving static base page"
                );
                return serve_page(page).await;
            }
        }
    }

    response.into_response()
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn serve_page(page: &Path) -> Response {
    let request = Request::new(Body::empty());
    match ServeFile::new(page).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn error_response(err: ApiError) -> Response {
    (err.status_code(), Json(err.envelope().into_value())).into_response()
}

/// Replaces the empty body of a timed-out request with an error envelope.
///
/// A handler that chose 408 itself already carries a JSON body and is left alone.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT && !response.headers().contains_key(header::CONTENT_TYPE) {
        tracing::warn!("Request timed out");
        return error_response(ApiError::new(408, "Request Timeout"));
    }
    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "API handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ResponseEnvelope::error("Server Error").into_value()),
    )
        .into_response()
}
