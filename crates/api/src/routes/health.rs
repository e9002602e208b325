use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    workers: usize,
    queue_capacity: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        workers: state.config.worker_count,
        queue_capacity: state.config.worker_queue_capacity,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
