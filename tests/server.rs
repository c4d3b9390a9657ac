//! End-to-end test over a real listener.

mod common;

use std::time::Duration;

use serde_json::{json, Value};

use common::*;
use convention_router::{ApiServer, Shutdown};

#[tokio::test]
async fn test_server_serves_mounted_api_and_shuts_down() {
    let dir = api_tree(SIDEWAYS_FILES);
    let mut config = config(dir.path());
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let server = ApiServer::new(config, &sideways_modules()).unwrap();
    assert_eq!(server.report().registered.len(), SIDEWAYS_FILES.len());

    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    assert!(addr.ip().is_loopback());

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("http://{addr}/api/miniprofile"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"name": "Ash Ketchum"}));

    let response = client.get(format!("http://{addr}/api/whoami")).send().await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["remoteIp"], "127.0.0.1");
    assert_eq!(body["internal"], false);
    assert_eq!(body["originalUrl"], "/api/whoami");

    let response = client.get(format!("http://{addr}/elsewhere")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    drop(client);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_bind_rejects_unusable_address() {
    let dir = api_tree(&["index.rs"]);
    let mut config = config(dir.path());
    config.listener.bind_address = "not-an-address".to_string();
    let server = ApiServer::new(config, &discovery_modules()).unwrap();
    assert!(server.bind().await.is_err());
}
