//! Gateway trait for text-generation backends.
//!
//! The analysis pipeline never talks to a provider API directly; it goes
//! through [`ModelGateway`] so backends can be swapped and tests can script
//! responses without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Gateway Trait
// ============================================================================

/// Unified interface for text-generation backends.
///
/// Implementations handle authentication, request formatting, and response
/// extraction for a specific API. One call = one blocking round trip; no
/// retries happen at this layer.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Get the gateway name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Execute a completion request, returning the raw response text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError>;
}

/// Error from a gateway.
///
/// Covers auth failures, rate limiting, network failures, and empty or
/// malformed provider responses. Timeouts surface here too; callers treat
/// them as ordinary failures, never as hangs.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub provider: String,
    pub model: String,
    pub message: String,
    pub status_code: Option<u16>,
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.model, self.message)
    }
}

impl std::error::Error for GatewayError {}

// ============================================================================
// Request Type
// ============================================================================

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// User prompt text
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 1.0)
    #[serde(default)]
    pub temperature: f64,
    /// System prompt (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl CompletionRequest {
    /// Create a request with temperature 0.0 and no system prompt.
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: 0.0,
            system: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}
