//! End-to-end proposal analysis.
//!
//! Fetch, classify, deep-evaluate, optionally run comment sentiment, and
//! assemble the [`ProposalAnalysis`] record the HTTP surface and CLI both
//! serve.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use govlens_common::Config;
use govlens_model::ModelGateway;

use crate::discourse::{CommentRecord, DiscourseClient, ProposalRecord};
use crate::error::AnalyzerError;

use super::{
    Category, CategoryScorer, Classification, DeepEvaluation, EvaluatorDispatcher,
    SentimentAggregate, SentimentAggregator,
};

/// Full analysis record for one proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalAnalysis {
    pub topic_id: String,
    pub title: String,
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<DeepEvaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis: Option<SentimentAggregate>,
}

pub struct AnalysisPipeline {
    discourse: DiscourseClient,
    scorer: CategoryScorer,
    evaluator: EvaluatorDispatcher,
    sentiment: SentimentAggregator,
}

impl AnalysisPipeline {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &Config) -> Self {
        Self {
            discourse: DiscourseClient::new(),
            scorer: CategoryScorer::new(gateway.clone(), config),
            evaluator: EvaluatorDispatcher::new(gateway.clone(), config),
            sentiment: SentimentAggregator::new(gateway, config),
        }
    }

    /// Analyzes the proposal behind a topic URL.
    ///
    /// URL and fetch failures surface as errors; model failures inside the
    /// stages degrade into zero-valued results instead. A classification
    /// that recovered into the `"error"` label has no category to evaluate,
    /// so `evaluation` stays absent while sentiment still runs if requested.
    pub async fn analyze_url(
        &self,
        url: &str,
        include_sentiment: bool,
    ) -> Result<ProposalAnalysis, AnalyzerError> {
        let (topic_id, proposal) = self.discourse.fetch_proposal(url).await?;
        self.analyze_proposal(topic_id, proposal, include_sentiment)
            .await
    }

    async fn analyze_proposal(
        &self,
        topic_id: String,
        proposal: ProposalRecord,
        include_sentiment: bool,
    ) -> Result<ProposalAnalysis, AnalyzerError> {
        let classification = self.scorer.score(&proposal).await;

        let evaluation = match Category::parse(&classification.primary_category) {
            Some(category) => Some(self.evaluator.evaluate_category(category, &proposal).await),
            None => {
                tracing::warn!(
                    primary_category = %classification.primary_category,
                    "No evaluator for primary category, skipping deep evaluation"
                );
                None
            }
        };

        let sentiment_analysis = if include_sentiment {
            Some(self.sentiment.aggregate(&proposal.comments, None).await)
        } else {
            None
        };

        tracing::info!(
            topic_id = %topic_id,
            primary_category = %classification.primary_category,
            include_sentiment,
            "Proposal analysis complete"
        );

        Ok(ProposalAnalysis {
            topic_id,
            title: proposal.title,
            analyzed_at: Utc::now(),
            classification,
            evaluation,
            sentiment_analysis,
        })
    }

    /// Sentiment for an ad-hoc comment list, without fetching a proposal.
    pub async fn analyze_comments(&self, comments: &[CommentRecord]) -> SentimentAggregate {
        self.sentiment.aggregate(comments, None).await
    }
}

/// Writes the analysis artifact as `proposal_{topic_id}_analysis.json` under
/// `dir`, creating the directory if needed, and returns the full path.
pub fn write_artifact(analysis: &ProposalAnalysis, dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("proposal_{}_analysis.json", analysis.topic_id));
    let json = serde_json::to_string_pretty(analysis)?;
    fs::write(&path, json)?;
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
