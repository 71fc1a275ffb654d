//! End-to-end tests for the generation endpoint against a scripted
//! upstream client.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::util::ServiceExt;

use promptforge_ai::{MockLlmClient, MockStep};
use promptforge_contracts::ErrorBody;
use promptforge_server::api::{router, state::AppService};
use promptforge_server::config::ServerConfig;

const MAX: usize = 10_000;

fn test_config(api_key: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        gemini_api_key: api_key.map(str::to_string),
        max_prompt_chars: MAX,
    }
}

fn app(api_key: Option<&str>, steps: Vec<MockStep>) -> (Router, Arc<AtomicUsize>) {
    let mock = MockLlmClient::from_steps("mock-model", steps);
    let invocations = mock.invocation_counter();
    let state = Arc::new(AppService {
        config: test_config(api_key),
        llm: Arc::new(mock),
    });
    (router(state), invocations)
}

async fn post_generate(app: Router, body: String) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request"),
    )
    .await
    .expect("response")
}

async fn error_body(response: axum::response::Response) -> ErrorBody {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("error body");
    serde_json::from_slice(&bytes).expect("error payload")
}

#[tokio::test]
async fn missing_prompt_field_is_rejected() {
    let (app, invocations) = app(Some("key"), vec![MockStep::text("unused")]);

    let response = post_generate(app, json!({}).to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "Prompt is required");
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn whitespace_prompt_is_rejected() {
    let (app, invocations) = app(Some("key"), vec![MockStep::text("unused")]);

    let response = post_generate(app, json!({ "prompt": "   " }).to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "Prompt is required");
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unparseable_body_is_rejected() {
    let (app, invocations) = app(Some("key"), vec![MockStep::text("unused")]);

    let response = post_generate(app, "{not json".to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "Prompt is required");
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn over_limit_prompt_is_rejected_without_upstream_call() {
    let (app, invocations) = app(Some("key"), vec![MockStep::text("unused")]);

    let response =
        post_generate(app, json!({ "prompt": "a".repeat(MAX + 1) }).to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(response).await.error,
        "Prompt exceeds maximum length of 10000 characters"
    );
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_api_key_is_a_500_with_zero_upstream_calls() {
    let (app, invocations) = app(None, vec![MockStep::text("unused")]);

    let response = post_generate(app, json!({ "prompt": "hello" }).to_string()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(response).await.error, "API key not configured");
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_open_failure_is_a_500_with_json_error() {
    let mock = MockLlmClient::failing("mock-model", "quota exhausted");
    let invocations = mock.invocation_counter();
    let state = Arc::new(AppService {
        config: test_config(Some("key")),
        llm: Arc::new(mock),
    });

    let response = post_generate(router(state), json!({ "prompt": "an agent" }).to_string()).await;

    // Nothing streamed yet, so the failure downgrades to a JSON error.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(response).await.error, "Failed to generate prompt");
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn streamed_body_is_the_chunk_concatenation() {
    let (app, invocations) = app(
        Some("key"),
        vec![MockStep::text("Role: "), MockStep::text("Task: do X")],
    );

    let response = post_generate(app, json!({ "prompt": "an agent" }).to_string()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("streamed body");
    assert_eq!(&bytes[..], b"Role: Task: do X");
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prompt_at_exactly_the_limit_is_accepted() {
    let (app, _) = app(Some("key"), vec![MockStep::text("ok")]);

    let response = post_generate(app, json!({ "prompt": "a".repeat(MAX) }).to_string()).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn midstream_failure_aborts_the_open_body() {
    let (app, _) = app(
        Some("key"),
        vec![MockStep::text("Role: "), MockStep::error("connection dropped")],
    );

    let response = post_generate(app, json!({ "prompt": "an agent" }).to_string()).await;

    // Headers were already committed as a success; only the body aborts.
    assert_eq!(response.status(), StatusCode::OK);
    let result = to_bytes(response.into_body(), usize::MAX).await;
    assert!(result.is_err(), "body should terminate abnormally");
}
