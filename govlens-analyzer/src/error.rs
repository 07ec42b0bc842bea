//! Error types for the analyzer service.
//!
//! Errors that reach the HTTP surface are converted into a JSON envelope
//! with a stable machine-readable code. Model-side failures inside the
//! analysis stages are usually recovered into zero-valued results instead of
//! surfacing here; see the `analysis` module.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use govlens_model::GatewayError;

/// Errors produced while fetching and analyzing proposals.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The proposal URL does not look like a Discourse topic link.
    #[error("Invalid proposal URL format: {0}")]
    InvalidUrlFormat(String),

    /// The forum request failed or returned a non-success status.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        reason: String,
        status: Option<u16>,
    },

    /// The model backend rejected or failed a completion call.
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// The model reply did not contain the expected JSON payload.
    #[error("Failed to parse model response: {0}")]
    ResponseParse(String),

    /// The requested category has no evaluator template.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

impl From<GatewayError> for AnalyzerError {
    fn from(err: GatewayError) -> Self {
        AnalyzerError::ModelInvocation(err.to_string())
    }
}

impl IntoResponse for AnalyzerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AnalyzerError::InvalidUrlFormat(_) => (StatusCode::BAD_REQUEST, "INVALID_URL_FORMAT"),
            AnalyzerError::UnknownCategory(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_CATEGORY"),
            AnalyzerError::Fetch { .. } => (StatusCode::BAD_GATEWAY, "FETCH_FAILED"),
            AnalyzerError::ModelInvocation(_) => {
                (StatusCode::BAD_GATEWAY, "MODEL_INVOCATION_FAILED")
            }
            AnalyzerError::ResponseParse(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RESPONSE_PARSE_FAILED")
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AnalyzerError::InvalidUrlFormat("nope".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AnalyzerError::UnknownCategory("nonexistent_category".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AnalyzerError::Fetch {
                    url: "https://forum.example.org/t/1".into(),
                    reason: "HTTP 404".into(),
                    status: Some(404),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                AnalyzerError::ModelInvocation("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AnalyzerError::ResponseParse("no JSON object".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = AnalyzerError::Fetch {
            url: "https://forum.example.org/t/slug/42".into(),
            reason: "HTTP 503".into(),
            status: Some(503),
        };
        let text = err.to_string();
        assert!(text.contains("https://forum.example.org/t/slug/42"));
        assert!(text.contains("HTTP 503"));
    }

    #[test]
    fn test_gateway_error_conversion() {
        let gateway_err = GatewayError {
            provider: "anthropic".into(),
            model: "claude-3-5-sonnet-20241022".into(),
            message: "rate limited".into(),
            status_code: Some(429),
        };
        let err: AnalyzerError = gateway_err.into();
        assert!(matches!(err, AnalyzerError::ModelInvocation(_)));
        assert!(err.to_string().contains("rate limited"));
    }
}
