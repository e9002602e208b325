//! Integration tests for the webhook callback and health endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    body_json, get, image_event_json, post_webhook, sign, test_config, text_event_json,
    webhook_body, FakeSource, FakeStore, Harness, ALLOWED_USER, STRANGER,
};
use stash_api::config::ServerConfig;
use stash_core::commands::HELP_TEXT;

// ---------------------------------------------------------------------------
// Test: GET /health reports pool sizing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_pool_sizes() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());
    let response = get(harness.router(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["workers"], 2);
    assert_eq!(json["queue_capacity"], 8);

    harness.pool.close().await;
}

// ---------------------------------------------------------------------------
// Test: a correctly signed delivery is acknowledged with an empty object
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signed_delivery_returns_200_on_both_paths() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());

    for path in ["/callback", "/"] {
        let body = webhook_body(vec![]);
        let signature = sign(&body);
        let response = post_webhook(harness.router(), path, body, Some(signature.as_str())).await;

        assert_eq!(response.status(), StatusCode::OK, "path {path}");
        assert_eq!(body_json(response).await, serde_json::json!({}));
    }

    harness.pool.close().await;
}

// ---------------------------------------------------------------------------
// Test: bad or missing signatures are rejected with 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_signature_returns_400() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());
    let body = webhook_body(vec![text_event_json(ALLOWED_USER, "r1", "help")]);

    let response = post_webhook(harness.router(), "/callback", body, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_SIGNATURE");

    let stats = harness.pool.close().await;
    assert_eq!(stats.submitted, 0);
    assert!(harness.source.replies().is_empty());
}

#[tokio::test]
async fn tampered_body_returns_400() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());
    let signed = webhook_body(vec![text_event_json(ALLOWED_USER, "r1", "help")]);
    let signature = sign(&signed);
    let tampered = webhook_body(vec![text_event_json(ALLOWED_USER, "r1", "quota")]);

    let response = post_webhook(harness.router(), "/callback", tampered, Some(signature.as_str())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    harness.pool.close().await;
}

// ---------------------------------------------------------------------------
// Test: a signed but undecodable body is a server-side failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_body_returns_500() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());
    let body = b"{\"events\": [".to_vec();
    let signature = sign(&body);

    let response = post_webhook(harness.router(), "/callback", body, Some(signature.as_str())).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    harness.pool.close().await;
}

// ---------------------------------------------------------------------------
// Test: accepted events are answered by the pool after the response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn authorized_command_is_answered_after_close() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());
    let body = webhook_body(vec![
        text_event_json(ALLOWED_USER, "r-ok", "help"),
        text_event_json(STRANGER, "r-denied", "help"),
    ]);
    let signature = sign(&body);

    let response = post_webhook(harness.router(), "/callback", body, Some(signature.as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = harness.pool.close().await;
    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(harness.source.reply_text("r-ok").as_deref(), Some(HELP_TEXT));
    assert_eq!(harness.source.reply_text("r-denied"), None);
}

// ---------------------------------------------------------------------------
// Test: a batch that outlasts the request timeout is still fully submitted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn saturated_pool_does_not_cut_a_batch_short() {
    let config = ServerConfig {
        request_timeout_secs: 1,
        worker_queue_capacity: 1,
        worker_count: 1,
        ..test_config()
    };
    let source = FakeSource::default()
        .with_content("1", b"one", "image/jpeg")
        .with_content("2", b"two", "image/jpeg")
        .with_content("3", b"three", "image/jpeg");
    let store = FakeStore::default().with_put_delay(Duration::from_millis(1100));
    let harness = Harness::with_config(config, source, store);

    // The third submit waits for the first upload, past the request timeout.
    let body = webhook_body(vec![
        image_event_json(ALLOWED_USER, "r1", "1"),
        image_event_json(ALLOWED_USER, "r2", "2"),
        image_event_json(ALLOWED_USER, "r3", "3"),
    ]);
    let signature = sign(&body);
    let response = post_webhook(harness.router(), "/callback", body, Some(signature.as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = harness.pool.close().await;
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(harness.store.objects().len(), 3);
}

// ---------------------------------------------------------------------------
// Test: unknown routes are not handled
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let harness = Harness::new(FakeSource::default(), FakeStore::default());
    let response = get(harness.router(), "/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    harness.pool.close().await;
}
