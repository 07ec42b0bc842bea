//! Configuration management for govlens services.
//!
//! All govlens binaries share a unified configuration file at
//! `~/.govlens/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Explicit config file values
//! 2. Environment variables (GOVLENS_* prefix)
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `GOVLENS_HOST` → server.host
//! - `GOVLENS_PORT` → server.port
//! - `GOVLENS_LOG_LEVEL` → observability.log_level
//! - `GOVLENS_LOG_FORMAT` → observability.log_format
//! - `GOVLENS_MODEL` → model.model
//! - `GOVLENS_BATCH_SIZE` → analysis.batch_size
//! - `GOVLENS_OUTPUT_DIR` → output.dir
//! - `ANTHROPIC_API_KEY` → secrets.llm.anthropic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".govlens"),
        |dirs| dirs.home_dir().join(".govlens"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server bind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default: "127.0.0.1" (local only).
    /// Set to "0.0.0.0" for remote access.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port for the analyzer service.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    4500
}

// ============================================================================
// Model Configuration
// ============================================================================

/// Text-generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the provider base URL (proxies, test doubles).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sampling temperature. Classification work wants determinism.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Output budget for the classification round trip.
    #[serde(default = "default_max_tokens_classification")]
    pub max_tokens_classification: u32,

    /// Output budget for the category-specific deep evaluation.
    #[serde(default = "default_max_tokens_evaluation")]
    pub max_tokens_evaluation: u32,

    /// Output budget for each comment-sentiment batch.
    #[serde(default = "default_max_tokens_sentiment")]
    pub max_tokens_sentiment: u32,

    /// Output budget for the final sentiment synthesis pass.
    #[serde(default = "default_max_tokens_synthesis")]
    pub max_tokens_synthesis: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tokens_classification: default_max_tokens_classification(),
            max_tokens_evaluation: default_max_tokens_evaluation(),
            max_tokens_sentiment: default_max_tokens_sentiment(),
            max_tokens_synthesis: default_max_tokens_synthesis(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}

fn default_temperature() -> f64 {
    0.0
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_tokens_classification() -> u32 {
    1500
}

fn default_max_tokens_evaluation() -> u32 {
    1500
}

fn default_max_tokens_sentiment() -> u32 {
    1000
}

fn default_max_tokens_synthesis() -> u32 {
    500
}

// ============================================================================
// Analysis Configuration
// ============================================================================

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Comments per sentiment batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Leading comments embedded in classification/evaluation prompts.
    #[serde(default = "default_max_prompt_comments")]
    pub max_prompt_comments: usize,

    /// Per-comment preview length (characters) in those prompts.
    #[serde(default = "default_comment_preview_chars")]
    pub comment_preview_chars: usize,

    /// Whether to run the final sentiment synthesis round trip.
    /// When disabled (or when the call fails) batch summaries are
    /// concatenated instead.
    #[serde(default = "default_synthesize_summary")]
    pub synthesize_summary: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_prompt_comments: default_max_prompt_comments(),
            comment_preview_chars: default_comment_preview_chars(),
            synthesize_summary: default_synthesize_summary(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_max_prompt_comments() -> usize {
    3
}

fn default_comment_preview_chars() -> usize {
    500
}

fn default_synthesize_summary() -> bool {
    true
}

// ============================================================================
// Output Configuration
// ============================================================================

/// Result artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory for `proposal_<id>_analysis.json` artifacts.
    /// Defaults to the current working directory when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Secrets Configuration
// ============================================================================

/// Grouped secrets configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// LLM provider API keys.
    #[serde(default)]
    pub llm: LlmSecretsConfig,
}

/// LLM provider API keys.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmSecretsConfig {
    #[serde(default)]
    pub anthropic: Option<String>,
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Unified govlens configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Text-generation backend settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Result artifact settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Grouped secrets (API keys)
    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable fallbacks.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("GOVLENS_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GOVLENS_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(level) = std::env::var("GOVLENS_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("GOVLENS_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(model) = std::env::var("GOVLENS_MODEL") {
            self.model.model = model;
        }
        if let Ok(size) = std::env::var("GOVLENS_BATCH_SIZE") {
            if let Ok(n) = size.parse() {
                self.analysis.batch_size = n;
            }
        }
        if let Ok(dir) = std::env::var("GOVLENS_OUTPUT_DIR") {
            self.output.dir = Some(dir);
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.secrets.llm.anthropic = Some(key);
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let path = config_path();
        let dir = config_dir();

        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Get the effective bind address, e.g. "127.0.0.1:4500".
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Anthropic API key, if configured.
    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.secrets.llm.anthropic.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4500);
        assert_eq!(config.analysis.batch_size, 10);
        assert_eq!(config.analysis.max_prompt_comments, 3);
        assert_eq!(config.analysis.comment_preview_chars, 500);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.secrets.llm.anthropic.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"server": {"port": 9000}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.temperature, 0.0);
        assert_eq!(config.analysis.batch_size, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "analysis": {"batch_size": 5, "synthesize_summary": false},
                "secrets": {"llm": {"anthropic": "sk-test"}}
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analysis.batch_size, 5);
        assert!(!config.analysis.synthesize_summary);
        assert_eq!(config.anthropic_api_key(), Some("sk-test"));
    }

    #[test]
    fn test_load_from_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_server_addr() {
        let mut config = Config::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("GOVLENS_BATCH_SIZE", "25");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.analysis.batch_size, 25);
        std::env::remove_var("GOVLENS_BATCH_SIZE");
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.model.model, config.model.model);
    }
}
