//! Category weighting stage.
//!
//! Sends the classification prompt and turns the reply into a
//! [`Classification`]. The model's own `sum` and `primary_category` fields
//! are ignored: the total is recomputed from the weights and the primary is
//! re-derived after renormalization, so downstream stages never depend on
//! the model doing its arithmetic correctly.

use std::sync::Arc;

use serde_json::Value;

use govlens_common::Config;
use govlens_model::{extract_json, CompletionRequest, ModelGateway};

use crate::discourse::ProposalRecord;
use crate::prompts;

use super::{string_field, Category, CategoryWeights, Classification, WEIGHT_SUM_TOLERANCE};

pub struct CategoryScorer {
    gateway: Arc<dyn ModelGateway>,
    max_tokens: u32,
    temperature: f64,
    max_prompt_comments: usize,
    comment_preview_chars: usize,
}

impl CategoryScorer {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &Config) -> Self {
        Self {
            gateway,
            max_tokens: config.model.max_tokens_classification,
            temperature: config.model.temperature,
            max_prompt_comments: config.analysis.max_prompt_comments,
            comment_preview_chars: config.analysis.comment_preview_chars,
        }
    }

    /// Classifies a proposal across the eight categories.
    ///
    /// Model and parse failures degrade into the zero-weight `"error"`
    /// classification instead of surfacing, so one flaky completion does not
    /// sink the whole analysis.
    pub async fn score(&self, proposal: &ProposalRecord) -> Classification {
        let prompt = prompts::classification_prompt(
            proposal,
            self.max_prompt_comments,
            self.comment_preview_chars,
        );
        let request =
            CompletionRequest::new(prompt, self.max_tokens).with_temperature(self.temperature);

        match self.gateway.complete(request).await {
            Ok(response) => self.parse_classification(&response),
            Err(e) => {
                tracing::warn!(error = %e, "Classification call failed");
                Classification::error_fallback(format!("Error analyzing proposal: {}", e))
            }
        }
    }

    fn parse_classification(&self, response: &str) -> Classification {
        let Some(json) = extract_json(response) else {
            tracing::warn!("Classification response carried no JSON object");
            return Classification::error_fallback(
                "Error analyzing proposal: no JSON object found in response",
            );
        };

        let value: Value = match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Classification response carried malformed JSON");
                return Classification::error_fallback(format!(
                    "Error analyzing proposal: malformed JSON in response: {}",
                    e
                ));
            }
        };

        let mut weights = CategoryWeights::default();
        for category in Category::ALL {
            let weight = value
                .get(category.as_str())
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            weights.set(category, weight.max(0.0));
        }

        let summary = string_field(&value, "summary");

        let total = weights.total();
        if total != 0.0 && (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            tracing::warn!(
                observed_sum = total,
                "Category weights do not sum to 1.0, renormalizing"
            );
            weights.normalize();
        }

        Classification {
            sum: weights.total(),
            primary_category: weights.primary().as_str().to_string(),
            weights,
            summary,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
