//! Integration tests for POST /cf-generate
//!
//! Runs the real router against a wiremock stand-in for the Workers AI API and
//! checks endpoint selection, payload shape, error relaying and the cases that
//! must fail before any network call.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use flarerelay::{
    config::Config,
    handlers::{self, AppState},
};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{any, body_json, header, method, path},
};

const RUN_PATH: &str = "/client/v4/accounts/acct-1/ai/run/@cf/meta/llama-3.1-8b-instruct-fast";
const RESPONSES_PATH: &str = "/client/v4/accounts/acct-1/ai/v1/responses";

fn create_test_config(base_url: &str) -> Config {
    Config::from_str(&format!(
        r#"
[cloudflare]
account_id = "acct-1"
api_token = "cf-token"
base_url = "{base_url}/client/v4"
"#
    ))
    .expect("should parse test config")
}

fn create_test_app(config: Config) -> Router {
    let state = AppState::new(Arc::new(config)).expect("AppState::new should succeed");
    handlers::router(state)
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/cf-generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_namespaced_model_uses_run_endpoint_with_chat_payload() {
    let server = MockServer::start().await;
    let upstream = json!({ "result": { "response": "Hello!" }, "success": true, "errors": [] });

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .and(header("authorization", "Bearer cf-token"))
        .and(body_json(json!({
            "messages": [
                { "role": "system", "content": "You are a friendly assistant" },
                { "role": "user", "content": "Say hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let (status, body) = send(app, post(r#"{"prompt": "Say hello"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, upstream, "successful upstream body is relayed unchanged");
}

#[tokio::test]
async fn test_other_model_uses_responses_endpoint_with_flat_payload() {
    let server = MockServer::start().await;
    let upstream = json!({
        "output": [{ "type": "message", "content": [{ "type": "output_text", "text": "hi" }] }]
    });

    Mock::given(method("POST"))
        .and(path(RESPONSES_PATH))
        .and(header("authorization", "Bearer cf-token"))
        .and(body_json(json!({
            "input": "Say hello",
            "model": "gpt-oss-120b",
            "temperature": 0.7,
            "max_output_tokens": 512
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let (status, body) = send(
        app,
        post(r#"{"prompt": "Say hello", "model": "gpt-oss-120b", "temperature": 0.7}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, upstream);
}

#[tokio::test]
async fn test_system_prompt_override_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .and(body_json(json!({
            "messages": [
                { "role": "system", "content": "Answer in French" },
                { "role": "user", "content": "Say hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let (status, _) = send(
        app,
        post(r#"{"prompt": "Say hello", "system": "Answer in French"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upstream_error_status_and_body_are_relayed() {
    let server = MockServer::start().await;
    let upstream = json!({
        "success": false,
        "errors": [{ "code": 10000, "message": "Authentication error" }]
    });

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let (status, body) = send(app, post(r#"{"prompt": "hi"}"#)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, upstream);
}

#[tokio::test]
async fn test_non_json_upstream_error_gets_generic_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>upstream down</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let (status, body) = send(app, post(r#"{"prompt": "hi"}"#)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "cloudflare returned non-JSON response" }));
}

#[tokio::test]
async fn test_missing_prompt_is_rejected_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    for body in [r#"{}"#, r#"{"prompt": 5}"#, r#"{"prompt": ""}"#, r#"{"model": "@cf/x"}"#] {
        let (status, json) = send(app.clone(), post(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body} should be rejected");
        assert!(
            json["error"].as_str().unwrap_or_default().contains("prompt"),
            "error should mention prompt: {json}"
        );
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let (status, body) = send(app, post("{\"prompt\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_credentials_fail_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config::from_str(&format!(
        "[cloudflare]\naccount_id = \"acct-1\"\nbase_url = \"{}/client/v4\"\n",
        server.uri()
    ))
    .unwrap();
    let app = create_test_app(config);
    let (status, body) = send(app, post(r#"{"prompt": "hi"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("CLOUDFLARE_API_TOKEN")
    );
}

#[tokio::test]
async fn test_blank_credentials_fail_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config::from_str(&format!(
        "[cloudflare]\naccount_id = \"\"\napi_token = \"\"\nbase_url = \"{}/client/v4\"\n",
        server.uri()
    ))
    .unwrap();
    let app = create_test_app(config);
    let (status, body) = send(app, post(r#"{"prompt": "hi"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("CLOUDFLARE_ACCOUNT_ID"));
}

#[tokio::test]
async fn test_transport_failure_is_internal_error() {
    // Port 1 on localhost refuses connections
    let app = create_test_app(create_test_config("http://127.0.0.1:1"));
    let (status, body) = send(app, post(r#"{"prompt": "hi"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal error");
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn test_response_carries_request_id_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let app = create_test_app(create_test_config(&server.uri()));
    let request_id = "6f1c1c4e-8d3b-4b8e-9a57-0c8f3d6e2a11";
    let request = Request::builder()
        .method("POST")
        .uri("/cf-generate")
        .header("content-type", "application/json")
        .header("x-request-id", request_id)
        .body(Body::from(r#"{"prompt": "hi"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        request_id
    );
}
