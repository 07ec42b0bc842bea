//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisPipeline, ProposalAnalysis, SentimentAggregate};
use crate::discourse::CommentRecord;
use crate::error::AnalyzerError;

/// Shared state behind every handler.
pub struct AnalyzerState {
    pub pipeline: AnalysisPipeline,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default)]
    pub include_sentiment: bool,
}

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub comments: Vec<CommentRecord>,
}

pub fn build_router(state: Arc<AnalyzerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/sentiment", post(sentiment))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "govlens-analyzer".to_string(),
    })
}

async fn analyze(
    State(state): State<Arc<AnalyzerState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<ProposalAnalysis>, AnalyzerError> {
    tracing::info!(
        url = %request.url,
        include_sentiment = request.include_sentiment,
        "Analyze request"
    );

    let analysis = state
        .pipeline
        .analyze_url(&request.url, request.include_sentiment)
        .await
        .map_err(|e| {
            tracing::error!(url = %request.url, error = %e, "Analysis failed");
            e
        })?;

    Ok(Json(analysis))
}

async fn sentiment(
    State(state): State<Arc<AnalyzerState>>,
    Json(request): Json<SentimentRequest>,
) -> Json<SentimentAggregate> {
    tracing::info!(comment_count = request.comments.len(), "Sentiment request");
    Json(state.pipeline.analyze_comments(&request.comments).await)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_payload() {
        let Json(payload) = health().await;
        assert_eq!(payload.status, "ok");
        assert_eq!(payload.service, "govlens-analyzer");
        assert_eq!(payload.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_analyze_request_sentiment_defaults_off() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"url": "https://forum.example.org/t/x/1"}"#).unwrap();
        assert!(!request.include_sentiment);
    }

    #[test]
    fn test_sentiment_request_accepts_bare_comments() {
        let request: SentimentRequest =
            serde_json::from_str(r#"{"comments": [{"content": "looks good"}]}"#).unwrap();
        assert_eq!(request.comments.len(), 1);
        assert_eq!(request.comments[0].content, "looks good");
    }
}
