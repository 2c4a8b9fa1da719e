use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use neowatch_core::AsteroidRecord;
use neowatch_core::types::StoredResult;

use crate::infra::{app_state::AppState, errors::AppResult};

#[derive(Debug, Serialize)]
pub struct DangerousListing {
    pub count: usize,
    pub data: Vec<StoredResult>,
}

/// Closest dangerous approaches first.
pub async fn dangerous_asteroids_handler(
    State(state): State<AppState>,
) -> AppResult<Json<DangerousListing>> {
    let data = state.results.dangerous_results(state.listing_limit).await?;
    Ok(Json(DangerousListing {
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub message_id: String,
    pub asteroid_id: String,
}

/// Validate an inbound asteroid payload and put it on the work queue.
pub async fn submit_asteroid_handler(
    State(state): State<AppState>,
    body: String,
) -> AppResult<(StatusCode, Json<Accepted>)> {
    let record = AsteroidRecord::from_json(&body)?;
    let message_id = state.queue.enqueue(&body).await?;
    info!(asteroid = %record.id, %message_id, "asteroid submitted");
    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            message_id,
            asteroid_id: record.id,
        }),
    ))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
