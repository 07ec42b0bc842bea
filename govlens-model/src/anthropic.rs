//! Anthropic (Claude) gateway implementation.

use super::gateway::{CompletionRequest, GatewayError, ModelGateway};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Production API endpoint, overridable for proxies and test doubles.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Anthropic Messages API gateway.
pub struct AnthropicGateway {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl AnthropicGateway {
    /// Create a new Anthropic gateway.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_options(api_key, model, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create with custom base URL (proxies, test doubles).
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_options(api_key, model, base_url, DEFAULT_TIMEOUT)
    }

    /// Create with custom base URL and request timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let api_key = api_key.into();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn error(&self, message: String, status_code: Option<u16>) -> GatewayError {
        GatewayError {
            provider: "anthropic".into(),
            model: self.model.clone(),
            message,
            status_code,
        }
    }
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let start = Instant::now();
        let url = format!("{}/v1/messages", self.base_url);

        let api_request = AnthropicRequest {
            model: self.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".into(),
                content: request.prompt,
            }],
            max_tokens: request.max_tokens,
            system: request.system,
            temperature: Some(request.temperature),
        };

        let response = self
            .client
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| self.error(format!("Request failed: {}", e), None))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(format!("API error: {}", body), Some(status.as_u16())));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("Failed to parse response: {}", e), None))?;

        // Concatenate text blocks; tool-use or thinking blocks are ignored
        let content = api_response
            .content
            .iter()
            .filter_map(|c| {
                if c.content_type == "text" {
                    Some(c.text.clone())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(self.error("Empty response content".into(), None));
        }

        tracing::debug!(
            model = %self.model,
            input_tokens = api_response.usage.input_tokens,
            output_tokens = api_response.usage.output_tokens,
            latency_ms = start.elapsed().as_millis() as u64,
            "Completion round trip finished"
        );

        Ok(content)
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: i64,
    #[serde(default)]
    output_tokens: i64,
}
