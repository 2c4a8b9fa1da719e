use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{dangerous_asteroids_handler, health_handler, submit_asteroid_handler};
use crate::infra::app_state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/asteroids", post(submit_asteroid_handler))
        .route("/asteroids/dangerous", get(dangerous_asteroids_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
