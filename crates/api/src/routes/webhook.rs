//! Webhook callback.
//!
//! The platform expects a quick 200; all real work happens on the pool.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use stash_line::SIGNATURE_HEADER;

use crate::error::AppResult;
use crate::state::AppState;

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let events = state.source.parse_request(signature, &body)?;
    let received = events.len();

    // Submission runs on its own task so a dropped request (client gone,
    // shutdown) cannot abandon the rest of the batch.
    let dispatcher = Arc::clone(&state.dispatcher);
    let submitted = tokio::spawn(async move { dispatcher.dispatch(events).await }).await?;
    tracing::debug!(received, submitted, "Webhook dispatched");

    Ok(Json(json!({})))
}

/// `POST /callback`, plus `POST /` for the platform's default webhook URL.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/callback", post(callback))
        .route("/", post(callback))
}
