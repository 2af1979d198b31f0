use super::*;
use crate::error::ApiError;
use crate::types::SessionId;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper to create a test RedditTube instance with isolated storage
fn create_test_tube() -> (Arc<RedditTube>, Arc<Config>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.download_dir = dir.path().join("downloads");
    config.storage.session_dir = dir.path().join("sessions");
    config.youtube.token_file = dir.path().join("token.json");
    config.youtube.client_secrets_file = dir.path().join("client_secrets.json");

    let config = Arc::new(config);
    let tube = Arc::new(RedditTube::new((*config).clone()).unwrap());
    (tube, config, dir)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (tube, config, _dir) = create_test_tube();
    let app = create_router(tube, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn verify_token_tool_runs_and_records_session_history() {
    let (tube, config, _dir) = create_test_tube();
    let app = create_router(tube.clone(), config);
    let session_id = SessionId::new();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/tools?session_id={session_id}"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"tool": "verify_token"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["type"], "message");
    assert_eq!(json["message"], "Token not authenticated");

    // The invocation left a tool_call and a tool_result record
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/sessions/{session_id}/history"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["kind"], "tool_call");
    assert_eq!(records[1]["kind"], "tool_result");
}

#[tokio::test]
async fn invalid_tool_request_is_rejected_with_400() {
    let (tube, config, _dir) = create_test_tube();
    let app = create_router(tube, config);
    let session_id = SessionId::new();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/tools?session_id={session_id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"tool": "download_reddit_video", "subreddit": ""}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let api_error: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(api_error.error.code, "invalid_request");
}

#[tokio::test]
async fn unknown_tool_tag_is_a_client_error() {
    let (tube, config, _dir) = create_test_tube();
    let app = create_router(tube, config);
    let session_id = SessionId::new();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/tools?session_id={session_id}"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"tool": "does_not_exist"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status().is_client_error(),
        "unknown tool tags must be rejected at the boundary"
    );
}

#[tokio::test]
async fn unknown_session_history_is_empty_not_an_error() {
    let (tube, config, _dir) = create_test_tube();
    let app = create_router(tube, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/sessions/{}/history", SessionId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn oauth_callback_with_unknown_state_is_400() {
    let (tube, config, _dir) = create_test_tube();
    let app = create_router(tube, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/oauth/callback?state=nope&code=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let api_error: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(api_error.error.code, "unknown_state");
}

#[tokio::test]
async fn api_key_guards_protected_routes_but_not_callback() {
    let (tube, _config, _dir) = create_test_tube();
    let mut config = (*tube.config()).clone();
    config.server.api_key = Some("secret-key".into());
    let config = Arc::new(config);
    let app = create_router(tube, config);

    // Missing key on a protected route
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct key passes
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-api-key", "secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The OAuth callback is exempt: the redirect carries no header. It
    // still fails with 400 (unknown state), not 401.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/oauth/callback?state=x&code=y")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn config_route_returns_redacted_secrets() {
    let (tube, _config, _dir) = create_test_tube();
    let mut config = (*tube.config()).clone();
    config.reddit.client_secret = "very-secret".into();
    let config = Arc::new(config);
    let app = create_router(tube, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reddit"]["client_secret"], "********");
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (tube, _config, _dir) = create_test_tube();
    let mut config = (*tube.config()).clone();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);
    let app = create_router(tube, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn api_server_spawns_on_ephemeral_port() {
    let (tube, _config, _dir) = create_test_tube();
    let mut config = (*tube.config()).clone();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let handle = tokio::spawn({
        let tube = tube.clone();
        let config = config.clone();
        async move { start_api_server(tube, config).await }
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    handle.abort();
}
