use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use domain::device::DeviceStore;
use fleet_dashboard::{api, setup_app_state};
use infrastructure::{DashboardConfig, InMemoryDeviceStore};

async fn app_with(store: InMemoryDeviceStore) -> Router {
    let (state, monitor) =
        setup_app_state(Arc::new(store) as Arc<dyn DeviceStore>, &DashboardConfig::default())
            .unwrap();
    monitor.refresh().await;
    api::create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_status_and_history_reflect_last_tick() {
    let app = app_with(InMemoryDeviceStore::with_demo_fleet()).await;

    let (status, cards) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    // entrada_frontal, entrada_trasera, pasillo
    assert_eq!(cards.as_array().unwrap().len(), 3);

    let (status, history) = send(&app, "GET", "/api/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["highlighted"], true);
}

#[tokio::test]
async fn test_device_list_and_create() {
    let app = app_with(InMemoryDeviceStore::new()).await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/devices",
        Some(json!({ "tipo_dispositivo": "puerta", "ubicacion": "garaje" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["ubicacion"], "garaje");
    assert_eq!(created["estado"], "cerrada");
    assert!(created["id"].is_string());

    let (status, list) = send(&app, "GET", "/api/devices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["subtitle"], "puerta en garaje");

    // The mutation refreshed the live view
    let (_, cards) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(cards[0]["location"], "garaje");
}

#[tokio::test]
async fn test_create_with_empty_location_is_bad_request() {
    let app = app_with(InMemoryDeviceStore::new()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices",
        Some(json!({ "kind": "puerta", "location": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_device() {
    let store = InMemoryDeviceStore::with_demo_fleet();
    let app = app_with(store.clone()).await;

    let (status, _) = send(&app, "DELETE", "/api/devices/5", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.records().await.len(), 4);

    // Missing ids surface as a store failure
    let (status, body) = send(&app, "DELETE", "/api/devices/5", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_toggle_actuator() {
    let store = InMemoryDeviceStore::with_demo_fleet();
    let app = app_with(store.clone()).await;

    let (status, written) =
        send(&app, "POST", "/api/actuators/entrada_frontal/abrir", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(written["actuator"]["estado"], "abierta");
    assert_eq!(written["actuator"]["comando"], "abrir");
    assert_eq!(written["door"]["estado"], "abierta");
    assert_eq!(store.records().await.len(), 7);

    let (_, cards) = send(&app, "GET", "/api/status", None).await;
    let card = cards
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["location"] == "entrada_frontal")
        .unwrap();
    assert_eq!(card["level"], "alert");
}

#[tokio::test]
async fn test_toggle_errors() {
    let store = InMemoryDeviceStore::with_demo_fleet();
    let app = app_with(store.clone()).await;

    let (status, _) = send(&app, "POST", "/api/actuators/pasillo/abrir", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/api/actuators/entrada_frontal/girar", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn test_offline_store_is_bad_gateway() {
    let store = InMemoryDeviceStore::with_demo_fleet();
    let app = app_with(store.clone()).await;
    store.set_offline(true);

    let (status, body) = send(&app, "GET", "/api/devices", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("503"));

    // The last applied view is still served
    let (status, cards) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cards.as_array().unwrap().len(), 3);
}
