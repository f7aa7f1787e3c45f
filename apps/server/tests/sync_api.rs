use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use storesync_connect::{AdapterError, AdapterRegistry, PlatformAdapter};
use storesync_core::connections::PlatformConnection;
use storesync_core::sync::{DomainSet, SyncCounts};
use storesync_server::{api::app_router, build_state_with_adapters, config::Config};

struct FixedAdapter(&'static str, u32);

#[async_trait]
impl PlatformAdapter for FixedAdapter {
    fn platform_id(&self) -> &str {
        self.0
    }

    async fn sync(
        &self,
        _connection: &PlatformConnection,
        _domains: &DomainSet,
    ) -> Result<SyncCounts, AdapterError> {
        Ok(SyncCounts::new(self.1, self.1, 0))
    }
}

struct RejectingAdapter(&'static str);

#[async_trait]
impl PlatformAdapter for RejectingAdapter {
    fn platform_id(&self) -> &str {
        self.0
    }

    async fn sync(
        &self,
        _connection: &PlatformConnection,
        _domains: &DomainSet,
    ) -> Result<SyncCounts, AdapterError> {
        Err(AdapterError::Rejected {
            message: "catalog locked".to_string(),
            counts: None,
        })
    }
}

async fn setup() -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let config = Config {
        db_path: tmp.path().join("test.db").to_string_lossy().to_string(),
        ..Config::default()
    };
    let adapters = AdapterRegistry::new()
        .with_adapter(Arc::new(FixedAdapter("shopify", 50)))
        .with_adapter(Arc::new(RejectingAdapter("etsy")))
        .with_adapter(Arc::new(FixedAdapter("woocommerce", 20)));
    let state = build_state_with_adapters(&config, adapters).await.unwrap();
    (app_router(state, &config), tmp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn connect(app: &Router, tenant_id: &str, platform_id: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/connections",
        Some(json!({
            "tenantId": tenant_id,
            "platformId": platform_id,
            "displayName": format!("{} store", platform_id),
            "credentialsRef": format!("vault://{}/{}", tenant_id, platform_id),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

#[tokio::test]
async fn sync_without_connections_is_not_found_and_records_nothing() {
    let (app, _tmp) = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sync",
        Some(json!({ "tenantId": "t1" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No active platforms to synchronize");

    let (status, history) = send(&app, Method::GET, "/api/v1/sync/history?tenantId=t1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn sync_reports_partial_run_and_records_history() {
    let (app, _tmp) = setup().await;
    connect(&app, "t1", "shopify").await;
    connect(&app, "t1", "etsy").await;
    connect(&app, "t1", "woocommerce").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sync",
        Some(json!({ "tenantId": "t1", "domains": ["prices", "bogus"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Synchronization partially completed");
    let details = &body["details"];
    assert_eq!(details["status"], "partial");
    assert_eq!(details["itemsProcessed"], 70);
    assert_eq!(details["platforms"].as_array().unwrap().len(), 3);
    let etsy = details["platforms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == "etsy")
        .unwrap();
    assert_eq!(etsy["status"], "error");
    assert!(etsy["detail"].as_str().unwrap().contains("catalog locked"));

    let sync_id = details["syncId"].as_str().unwrap();
    let (status, run) = send(&app, Method::GET, &format!("/api/v1/sync/runs/{}", sync_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "partial");
    assert_eq!(run["scope"], "prices");
    assert_eq!(run["initiatedBy"], "api");

    let (_, connections) = send(&app, Method::GET, "/api/v1/tenants/t1/connections", None).await;
    for connection in connections.as_array().unwrap() {
        let synced = !connection["lastSyncAt"].is_null();
        assert_eq!(synced, connection["platformId"] != "etsy", "{}", connection);
        assert!(connection.get("credentialsRef").is_none());
    }
}

#[tokio::test]
async fn sync_is_limited_to_requested_platforms() {
    let (app, _tmp) = setup().await;
    connect(&app, "t1", "woocommerce").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sync",
        Some(json!({ "tenantId": "t1", "platformIds": ["shopify"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sync",
        Some(json!({ "tenantId": "t1", "platformIds": ["woocommerce"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["status"], "success");
    assert_eq!(body["details"]["itemsProcessed"], 20);
}

#[tokio::test]
async fn deactivated_connections_are_skipped() {
    let (app, _tmp) = setup().await;
    let shopify = connect(&app, "t1", "shopify").await;
    let shopify_id = shopify["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/connections/{}/status", shopify_id),
        Some(json!({ "status": "inactive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "inactive");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/sync",
        Some(json!({ "tenantId": "t1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabled_domains_are_a_configuration_error() {
    let (app, _tmp) = setup().await;
    connect(&app, "t1", "shopify").await;

    let (status, settings) = send(&app, Method::GET, "/api/v1/tenants/t1/sync-settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["syncIntervalMinutes"], 60);
    assert_eq!(settings["autoSync"], false);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/tenants/t1/sync-settings",
        Some(json!({
            "syncInventory": false,
            "syncPrices": false,
            "syncOrders": false,
            "syncProducts": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sync",
        Some(json!({ "tenantId": "t1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn settings_reject_short_intervals() {
    let (app, _tmp) = setup().await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/tenants/t1/sync-settings",
        Some(json!({ "syncIntervalMinutes": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let (app, _tmp) = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/sync/runs/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn history_requires_tenant() {
    let (app, _tmp) = setup().await;
    let (status, _) = send(&app, Method::GET, "/api/v1/sync/history", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
