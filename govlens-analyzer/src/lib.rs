//! Govlens Analyzer - governance proposal analysis service.
//!
//! Fetches DAO governance proposals from Discourse forums and runs them
//! through a staged analysis pipeline:
//! - Category classification across eight governance categories
//! - Category-specific deep evaluation of the primary category
//! - Batched comment sentiment with cross-batch aggregation
//!
//! The same pipeline backs the HTTP API (`serve`) and the one-shot CLI
//! (`analyze`).

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analysis;
pub mod discourse;
pub mod error;
pub mod prompts;
pub mod routes;
pub mod text;

pub use analysis::{
    AnalysisPipeline, Category, CategoryWeights, Classification, DeepEvaluation, ProposalAnalysis,
    SentimentAggregate,
};
pub use discourse::{CommentRecord, DiscourseClient, ProposalRecord};
pub use error::AnalyzerError;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};

use govlens_common::Config;
use govlens_model::{anthropic, AnthropicGateway, ModelGateway};

use routes::AnalyzerState;

/// HTTP analysis service.
pub struct AnalyzerService {
    config: Config,
}

impl AnalyzerService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Builds the analysis pipeline from config. Fails when no Anthropic
    /// API key is configured.
    pub fn build_pipeline(&self) -> anyhow::Result<AnalysisPipeline> {
        let gateway = build_gateway(&self.config)?;
        Ok(AnalysisPipeline::new(gateway, &self.config))
    }

    pub fn build_router(&self) -> anyhow::Result<axum::Router> {
        let state = Arc::new(AnalyzerState {
            pipeline: self.build_pipeline()?,
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Ok(routes::build_router(state).layer(cors))
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn start(&self) -> anyhow::Result<()> {
        let app = self.build_router()?;
        let addr = self.config.server_addr();

        tracing::info!(addr = %addr, "Govlens analyzer listening");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Constructs the Anthropic-backed gateway from config.
pub fn build_gateway(config: &Config) -> anyhow::Result<Arc<dyn ModelGateway>> {
    let api_key = config.anthropic_api_key().context(
        "Anthropic API key is not configured (set secrets.llm.anthropic or ANTHROPIC_API_KEY)",
    )?;

    let base_url = config
        .model
        .base_url
        .as_deref()
        .unwrap_or(anthropic::DEFAULT_BASE_URL);

    let gateway = AnthropicGateway::with_options(
        api_key,
        &config.model.model,
        base_url,
        Duration::from_secs(config.model.request_timeout_secs),
    );

    Ok(Arc::new(gateway))
}
