//! Comment sentiment stage.
//!
//! Comments are analyzed in fixed-size contiguous batches, in forum order.
//! Each batch produces a [`SentimentBatchResult`]; aggregation averages over
//! all batches with failed ones held at zero, so a flaky batch drags the
//! average toward neutral instead of silently vanishing from it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use govlens_common::Config;
use govlens_model::{extract_json, CompletionRequest, ModelGateway};

use crate::discourse::CommentRecord;
use crate::prompts;

/// Analysis of one comment batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentBatchResult {
    /// Batch sentiment in [-1, 1]; 0.0 for a failed batch.
    pub sentiment_score: f64,
    pub summary: String,
    pub key_points: Vec<String>,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
}

impl SentimentBatchResult {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            summary: reason.into(),
            ..Default::default()
        }
    }
}

/// Aggregated sentiment across every batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentAggregate {
    pub sentiment_score: f64,
    pub summary: String,
    pub key_points: Vec<String>,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
    pub num_comments: usize,
}

pub struct SentimentAggregator {
    gateway: Arc<dyn ModelGateway>,
    batch_size: usize,
    max_tokens: u32,
    synthesis_max_tokens: u32,
    temperature: f64,
    synthesize_summary: bool,
}

impl SentimentAggregator {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &Config) -> Self {
        Self {
            gateway,
            // chunks(0) panics
            batch_size: config.analysis.batch_size.max(1),
            max_tokens: config.model.max_tokens_sentiment,
            synthesis_max_tokens: config.model.max_tokens_synthesis,
            temperature: config.model.temperature,
            synthesize_summary: config.analysis.synthesize_summary,
        }
    }

    /// Analyzes all comments and aggregates the batch results. A proposal
    /// summary, when given, seeds every batch prompt as context.
    ///
    /// No comments means no model calls: a zero aggregate comes straight
    /// back. The aggregate score is the mean over all batches, failed ones
    /// included at zero. Lists keep the first occurrence of each item in
    /// batch order.
    pub async fn aggregate(
        &self,
        comments: &[CommentRecord],
        proposal_summary: Option<&str>,
    ) -> SentimentAggregate {
        if comments.is_empty() {
            return SentimentAggregate {
                summary: "No comments to analyze".to_string(),
                ..Default::default()
            };
        }

        let mut batch_results = Vec::new();
        for batch in comments.chunks(self.batch_size) {
            batch_results.push(self.analyze_batch(batch, proposal_summary).await);
        }

        let avg_sentiment = batch_results
            .iter()
            .map(|r| r.sentiment_score)
            .sum::<f64>()
            / batch_results.len() as f64;

        let mut key_points = Vec::new();
        let mut concerns = Vec::new();
        let mut suggestions = Vec::new();
        for result in &batch_results {
            key_points.extend(result.key_points.iter().cloned());
            concerns.extend(result.concerns.iter().cloned());
            suggestions.extend(result.suggestions.iter().cloned());
        }
        let key_points = dedup_first_occurrence(key_points);
        let concerns = dedup_first_occurrence(concerns);
        let suggestions = dedup_first_occurrence(suggestions);

        let summary = self
            .final_summary(
                &batch_results,
                &key_points,
                &concerns,
                &suggestions,
                avg_sentiment,
            )
            .await;

        SentimentAggregate {
            sentiment_score: avg_sentiment,
            summary,
            key_points,
            concerns,
            suggestions,
            num_comments: comments.len(),
        }
    }

    /// Analyzes one batch. Every failure mode lands in a zeroed result whose
    /// summary carries the reason.
    async fn analyze_batch(
        &self,
        batch: &[CommentRecord],
        context: Option<&str>,
    ) -> SentimentBatchResult {
        let prompt = prompts::sentiment_batch_prompt(batch, context);
        let request =
            CompletionRequest::new(prompt, self.max_tokens).with_temperature(self.temperature);

        let response = match self.gateway.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(batch_len = batch.len(), error = %e, "Sentiment batch call failed");
                return SentimentBatchResult::failed(format!("Error analyzing comments: {}", e));
            }
        };

        let Some(json) = extract_json(&response) else {
            tracing::warn!(
                batch_len = batch.len(),
                "Sentiment batch response carried no JSON object"
            );
            return SentimentBatchResult::failed(
                "Error analyzing comments: no JSON object found in response",
            );
        };

        let mut result: SentimentBatchResult = serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(batch_len = batch.len(), error = %e, "Sentiment batch response carried malformed JSON");
            SentimentBatchResult::failed(format!("Error analyzing comments: {}", e))
        });
        result.sentiment_score = result.sentiment_score.clamp(-1.0, 1.0);
        result
    }

    /// Synthesizes the cross-batch summary, falling back to concatenated
    /// batch summaries when synthesis is disabled or its call fails.
    async fn final_summary(
        &self,
        batch_results: &[SentimentBatchResult],
        key_points: &[String],
        concerns: &[String],
        suggestions: &[String],
        avg_sentiment: f64,
    ) -> String {
        if self.synthesize_summary {
            let prompt =
                prompts::synthesis_prompt(key_points, concerns, suggestions, avg_sentiment);
            let request = CompletionRequest::new(prompt, self.synthesis_max_tokens)
                .with_temperature(self.temperature);

            match self.gateway.complete(request).await {
                Ok(response) => {
                    let text = response.trim();
                    if !text.is_empty() {
                        return text.to_string();
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Sentiment synthesis failed, concatenating batch summaries");
                }
            }
        }

        batch_results
            .iter()
            .map(|r| r.summary.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn dedup_first_occurrence(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
