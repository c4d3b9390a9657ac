//! Internal (sideways) calls between handlers.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Extension, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use convention_router::create_api;

#[tokio::test]
async fn test_works_at_root() {
    let (_dir, app) = sideways_app();
    assert_eq!(get(&app, "/api").await.1, json!({"status": "success", "data": "ok"}));
}

#[tokio::test]
async fn test_works_with_route() {
    let (_dir, app) = sideways_app();
    assert_eq!(
        get(&app, "/api/user").await.1,
        json!({"firstName": "Ash", "lastName": "Ketchum", "pkmnCount": 151, "age": 12})
    );
}

#[tokio::test]
async fn test_sideways_call() {
    let (_dir, app) = sideways_app();
    assert_eq!(get(&app, "/api/miniprofile").await, (StatusCode::OK, json!({"name": "Ash Ketchum"})));
}

#[tokio::test]
async fn test_typed_sideways_call() {
    let (_dir, app) = sideways_app();
    assert_eq!(get(&app, "/api/typed").await.1, json!({"status": "success", "data": 151}));
}

#[tokio::test]
async fn test_chained_calls_resolve() {
    let (_dir, app) = sideways_app();
    assert_eq!(get(&app, "/api/chain/a").await.1, json!({"path": ["a", "b", "c"]}));
}

#[tokio::test]
async fn test_unmatched_call_rejects_with_not_implemented() {
    let (_dir, app) = sideways_app();
    assert_eq!(get(&app, "/api/missing").await.1, json!({"status": "success", "data": "rejected"}));
}

#[tokio::test]
async fn test_callee_failure_reaches_external_caller() {
    let (_dir, app) = sideways_app();
    assert_eq!(
        get(&app, "/api/rejects").await,
        (StatusCode::UNPROCESSABLE_ENTITY, json!({"status": "error", "message": "Unprocessable"}))
    );
}

#[tokio::test]
async fn test_relative_path_is_a_usage_error() {
    let (_dir, app) = sideways_app();
    assert_eq!(get(&app, "/api/relative").await.1, json!({"status": "success", "data": "usage"}));
}

#[tokio::test]
async fn test_origin_flows_into_internal_calls() {
    let dir = api_tree(SIDEWAYS_FILES);
    let app = Router::new()
        .nest("/api", create_api(config(dir.path()), &sideways_modules()).unwrap())
        .layer(Extension(Tenant("acme")));

    let request = Request::builder()
        .uri("/api/tenant")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "outer": false,
            "inner": {
                "tenant": "acme",
                "internal": true,
                "originalUrl": null,
                "remoteIp": "127.0.0.1",
                "requestId": "req-42",
            }
        })
    );
}
