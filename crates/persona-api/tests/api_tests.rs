//! API Integration Tests
//!
//! The generation service is replaced by a recording fake so every test can
//! assert on the exact prompts that would have left the process.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use persona_api::{create_router, state::AppState};
use persona_core::{
    AppConfig, LlmClient, PersonaError, PersonaTemplate, Result as CoreResult, UpstreamKind,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const FAILURE_DETAIL: &str = "Failed to get a response from the AI model.";

/// Fake generation backend that records every prompt
struct RecordingLlm {
    reply: Result<String, UpstreamKind>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(kind: UpstreamKind) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(kind),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for RecordingLlm {
    async fn generate(&self, prompt: &str) -> CoreResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(kind) => Err(PersonaError::upstream(*kind, "simulated failure")),
        }
    }

    fn model(&self) -> &str {
        "gemini-2.0-flash"
    }
}

fn app_with(llm: Arc<RecordingLlm>) -> Router {
    let state = AppState::new(
        AppConfig::default(),
        PersonaTemplate::builtin().unwrap(),
        llm,
    );
    create_router(Arc::new(state))
}

/// Helper to create a test request
fn create_json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_root_liveness() {
    let app = app_with(RecordingLlm::answering("unused"));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({ "status": "ok" }));
}

// =============================================================================
// Chat API Tests
// =============================================================================

#[tokio::test]
async fn test_chat_success() {
    let llm = RecordingLlm::answering("My #1 superpower is high-agency execution.");
    let app = app_with(llm.clone());

    let request = create_json_request(
        "/api/chat",
        &json!({ "question": "What is your superpower?" }).to_string(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "response": "My #1 superpower is high-agency execution." })
    );

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("You are Sambhav Gandhi"));
    assert!(prompts[0]
        .trim_end()
        .ends_with("User Question: \"What is your superpower?\""));
}

#[tokio::test]
async fn test_chat_response_is_verbatim() {
    let text = "  line one\n\n**bold** {braces} \"quotes\" ünïcödé \n";
    let app = app_with(RecordingLlm::answering(text));

    let request = create_json_request("/api/chat", &json!({ "question": "hi" }).to_string());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["response"], text);
}

#[tokio::test]
async fn test_chat_question_embedded_literally() {
    let llm = RecordingLlm::answering("ok");
    let app = app_with(llm.clone());

    let question = "What about {user_question} and {0}?";
    let request = create_json_request("/api/chat", &json!({ "question": question }).to_string());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(question));
}

#[tokio::test]
async fn test_chat_empty_question() {
    let llm = RecordingLlm::answering("unused");
    let app = app_with(llm.clone());

    let request = create_json_request("/api/chat", r#"{"question": ""}"#);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json(response).await["detail"].is_string());
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_whitespace_question() {
    let llm = RecordingLlm::answering("unused");
    let app = app_with(llm.clone());

    let request = create_json_request("/api/chat", r#"{"question": "   "}"#);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_missing_question() {
    let llm = RecordingLlm::answering("unused");
    let app = app_with(llm.clone());

    let request = create_json_request("/api/chat", r#"{"prompt": "hello"}"#);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json(response).await["detail"].is_string());
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_question_wrong_type() {
    let llm = RecordingLlm::answering("unused");
    let app = app_with(llm.clone());

    let request = create_json_request("/api/chat", r#"{"question": 42}"#);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let llm = RecordingLlm::answering("unused");
    let app = app_with(llm.clone());

    let request = create_json_request("/api/chat", r#"{"question": "#);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json(response).await["detail"].is_string());
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_without_content_type() {
    let llm = RecordingLlm::answering("ok");
    let app = app_with(llm.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .body(Body::from(r#"{"question": "What is your superpower?"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({ "response": "ok" }));
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn test_chat_upstream_failures_are_generic() {
    for kind in [
        UpstreamKind::Network,
        UpstreamKind::Auth,
        UpstreamKind::Quota,
        UpstreamKind::Status,
        UpstreamKind::Parse,
        UpstreamKind::Empty,
    ] {
        let llm = RecordingLlm::failing(kind);
        let app = app_with(llm.clone());

        let request = create_json_request(
            "/api/chat",
            &json!({ "question": "What is your superpower?" }).to_string(),
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{kind}");
        assert_eq!(read_json(response).await, json!({ "detail": FAILURE_DETAIL }));
        assert_eq!(llm.prompts().len(), 1, "exactly one attempt for {kind}");
    }
}

#[tokio::test]
async fn test_chat_get_not_allowed() {
    let app = app_with(RecordingLlm::answering("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/chat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// CORS Tests
// =============================================================================

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_with_credentials() {
    let app = app_with(RecordingLlm::answering("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/chat")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-custom")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "content-type,x-custom"
    );
}

#[tokio::test]
async fn test_cors_simple_request_echoes_origin() {
    let app = app_with(RecordingLlm::answering("ok"));

    let mut request = create_json_request("/api/chat", &json!({ "question": "hi" }).to_string());
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://example.dev".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://example.dev"
    );
}

// =============================================================================
// OpenAPI Tests
// =============================================================================

#[tokio::test]
async fn test_openapi_document() {
    let app = app_with(RecordingLlm::answering("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = read_json(response).await;
    assert!(doc["paths"]["/api/chat"]["post"].is_object());
    assert!(doc["paths"]["/"]["get"].is_object());
}
