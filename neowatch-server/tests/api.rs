use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use neowatch_core::infrastructure::{InMemoryQueue, InMemoryResultStore};
use neowatch_core::ports::{MessageQueue, ReceiveRequest, ResultStore};
use neowatch_core::types::ResultRecord;
use neowatch_server::{AppState, routes::create_router};

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn state_with(results: Arc<InMemoryResultStore>) -> AppState {
    AppState::new(Arc::new(InMemoryQueue::new()), results)
}

async fn post_json(state: AppState, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

const BENNU: &str = r#"{
    "id": "2101955",
    "asteroid": "101955 Bennu (1999 RQ36)",
    "diameter_km": 0.56,
    "velocity_kph": 22000.0,
    "orbital_elements": {
        "eccentricity": "0.2037",
        "semi_major_axis": "1.1264",
        "inclination": "6.0349",
        "ascending_node_longitude": "2.0609",
        "perihelion_argument": "66.2231",
        "mean_anomaly": "101.7039",
        "mean_motion": "0.8245",
        "epoch_osculation": "2455562.5"
    }
}"#;

fn record(id: &str, distance: f64, dangerous: bool) -> ResultRecord {
    ResultRecord {
        asteroid_id: id.to_string(),
        name: format!("({id})"),
        closest_distance_km: distance,
        impact_date: if dangerous { 2_470_123.25 } else { 0.0 },
        is_dangerous: dangerous,
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let state = state_with(Arc::new(InMemoryResultStore::new()));
    let (status, body) = get_json(state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn dangerous_listing_is_sorted_and_capped() {
    let store = Arc::new(InMemoryResultStore::new());
    for n in 0..12 {
        store
            .save_result(&record(&format!("d{n:02}"), 5_900.0 - n as f64 * 100.0, true))
            .await
            .unwrap();
    }
    store.save_result(&record("safe", 4.0e7, false)).await.unwrap();

    let (status, body) = get_json(state_with(store), "/asteroids/dangerous").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 10);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 10);
    assert_eq!(data[0]["asteroid_id"], "d11");
    assert!(data.iter().all(|row| row["is_dangerous"] == true));
    let distances: Vec<f64> = data
        .iter()
        .map(|row| row["closest_distance_km"].as_f64().unwrap())
        .collect();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let state = state_with(Arc::new(InMemoryResultStore::new()));
    let (status, body) = get_json(state, "/asteroids/dangerous").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], Value::Array(vec![]));
}

#[tokio::test]
async fn store_failure_renders_error_body() {
    let store = Arc::new(InMemoryResultStore::new());
    store.fail(true);
    let (status, body) = get_json(state_with(store), "/asteroids/dangerous").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["status"], 500);
    assert_eq!(body["error"]["message"], "Failed to fetch data");
}

#[tokio::test]
async fn submitted_asteroid_lands_on_the_queue() {
    let queue = Arc::new(InMemoryQueue::new());
    let state = AppState::new(queue.clone(), Arc::new(InMemoryResultStore::new()));

    let (status, body) = post_json(state, "/asteroids", BENNU).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["asteroid_id"], "2101955");
    let batch = queue
        .receive(ReceiveRequest {
            wait: std::time::Duration::ZERO,
            ..ReceiveRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].message_id, body["message_id"].as_str().unwrap());
    assert_eq!(batch[0].body, BENNU);
}

#[tokio::test]
async fn invalid_submission_is_rejected_and_not_enqueued() {
    let queue = Arc::new(InMemoryQueue::new());
    let state = AppState::new(queue.clone(), Arc::new(InMemoryResultStore::new()));
    let hyperbolic = BENNU.replace("\"0.2037\"", "\"1.2\"");

    let (status, body) = post_json(state.clone(), "/asteroids", &hyperbolic).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);

    let (status, _) = post_json(state, "/asteroids", "{\"id\": 1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(queue.pending().await, 0);
}
