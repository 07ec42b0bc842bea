//! Integration tests for the analyzer HTTP API.
//!
//! Routes are exercised end to end with a mocked Discourse forum and a
//! scripted model gateway; nothing leaves the process.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use govlens_analyzer::analysis::AnalysisPipeline;
use govlens_analyzer::routes::{self, AnalyzerState};
use govlens_common::Config;
use govlens_model::{CompletionRequest, GatewayError, ModelGateway};

// ============================================================================
// Test harness
// ============================================================================

struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<usize>,
}

impl ScriptedGateway {
    fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
        }
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, GatewayError> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("{}".to_string()))
    }
}

fn model_error(message: &str) -> GatewayError {
    GatewayError {
        provider: "scripted".into(),
        model: "test".into(),
        message: message.into(),
        status_code: None,
    }
}

fn test_app(
    responses: Vec<Result<String, GatewayError>>,
    synthesize: bool,
) -> (axum::Router, Arc<ScriptedGateway>) {
    let mut config = Config::default();
    config.analysis.synthesize_summary = synthesize;

    let gateway = Arc::new(ScriptedGateway::new(responses));
    let pipeline = AnalysisPipeline::new(gateway.clone(), &config);
    let router = routes::build_router(Arc::new(AnalyzerState { pipeline }));
    (router, gateway)
}

/// Helper to make a JSON request.
async fn request_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = if let Some(b) = body {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

/// Mounts a Discourse topic with one proposal post and `comment_count`
/// replies.
async fn mock_forum(topic_id: &str, comment_count: usize) -> MockServer {
    let server = MockServer::start().await;

    let mut posts = vec![json!({
        "cooked": "<p>Enable the fee switch on the top pools.</p>",
        "username": "author",
        "created_at": "2024-04-01T10:00:00.000Z"
    })];
    for i in 0..comment_count {
        posts.push(json!({
            "cooked": format!("<p>Comment number {}.</p>", i),
            "username": format!("delegate_{}", i),
            "post_number": i + 2
        }));
    }

    Mock::given(method("GET"))
        .and(path(format!("/t/{}.json", topic_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Enable the fee switch",
            "created_at": "2024-04-01T10:00:00.000Z",
            "posts_count": comment_count + 1,
            "post_stream": {"posts": posts}
        })))
        .mount(&server)
        .await;

    server
}

fn classification_json() -> String {
    json!({
        "protocol_parameters": 0.6,
        "treasury_management": 0.2,
        "tokenomics": 0.2,
        "sum": 1.0,
        "primary_category": "protocol_parameters",
        "summary": "Turn on protocol fees."
    })
    .to_string()
}

fn batch_json(score: f64, summary: &str) -> String {
    json!({
        "sentiment_score": score,
        "summary": summary,
        "key_points": ["fee revenue"],
        "concerns": ["LP impact"],
        "suggestions": []
    })
    .to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app(vec![], false);

    let (status, json) = request_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "govlens-analyzer");
}

// ============================================================================
// Analyze endpoint
// ============================================================================

#[tokio::test]
async fn test_analyze_returns_full_record() {
    let server = mock_forum("88", 2).await;
    let (app, gateway) = test_app(
        vec![
            Ok(classification_json()),
            Ok(json!({"score": 0.7, "reasoning": "parameters are the core"}).to_string()),
            Ok(batch_json(0.5, "supportive overall")),
        ],
        false,
    );

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/analyze",
        Some(json!({
            "url": format!("{}/t/fee-switch/88", server.uri()),
            "include_sentiment": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic_id"], "88");
    assert_eq!(body["title"], "Enable the fee switch");
    assert_eq!(body["primary_category"], "protocol_parameters");
    assert_eq!(body["protocol_parameters"], 0.6);
    assert_eq!(body["sum"], 1.0);
    assert!(body["analyzed_at"].is_string());

    assert_eq!(body["evaluation"]["score"], 0.7);
    assert_eq!(body["evaluation"]["category"], "protocol_parameters");

    assert_eq!(body["sentiment_analysis"]["num_comments"], 2);
    assert_eq!(body["sentiment_analysis"]["summary"], "supportive overall");

    // classification + evaluation + one sentiment batch
    assert_eq!(gateway.call_count(), 3);
}

#[tokio::test]
async fn test_analyze_without_sentiment_omits_field() {
    let server = mock_forum("89", 2).await;
    let (app, gateway) = test_app(
        vec![
            Ok(classification_json()),
            Ok(json!({"score": 0.7}).to_string()),
        ],
        false,
    );

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/analyze",
        Some(json!({"url": format!("{}/t/fee-switch/89", server.uri())})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("sentiment_analysis").is_none());
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn test_analyze_rejects_invalid_url() {
    let (app, gateway) = test_app(vec![], false);

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/analyze",
        Some(json!({"url": "https://forum.example.org/c/general"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_URL_FORMAT");
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_maps_fetch_failure_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/404.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (app, gateway) = test_app(vec![], false);

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/analyze",
        Some(json!({"url": format!("{}/t/gone/404", server.uri())})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "FETCH_FAILED");
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_degrades_model_failure_into_error_classification() {
    let server = mock_forum("90", 1).await;
    let (app, gateway) = test_app(vec![Err(model_error("model down"))], false);

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/analyze",
        Some(json!({"url": format!("{}/t/fee-switch/90", server.uri())})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primary_category"], "error");
    assert_eq!(body["sum"], 0.0);
    assert_eq!(body["protocol_parameters"], 0.0);
    assert!(body["summary"].as_str().unwrap().contains("model down"));
    assert!(body.get("evaluation").is_none());
    assert_eq!(gateway.call_count(), 1);
}

// ============================================================================
// Sentiment endpoint
// ============================================================================

#[tokio::test]
async fn test_sentiment_endpoint_aggregates_comments() {
    let (app, _) = test_app(vec![Ok(batch_json(0.25, "mixed but constructive"))], false);

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/sentiment",
        Some(json!({
            "comments": [
                {"content": "Fee switch is overdue"},
                {"content": "Needs LP protections first"}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment_score"], 0.25);
    assert_eq!(body["summary"], "mixed but constructive");
    assert_eq!(body["num_comments"], 2);
    assert_eq!(body["key_points"][0], "fee revenue");
}

#[tokio::test]
async fn test_sentiment_endpoint_empty_comments_short_circuits() {
    let (app, gateway) = test_app(vec![], false);

    let (status, body) = request_json(
        &app,
        Method::POST,
        "/api/v1/sentiment",
        Some(json!({"comments": []})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_comments"], 0);
    assert_eq!(body["summary"], "No comments to analyze");
    assert_eq!(gateway.call_count(), 0);
}
