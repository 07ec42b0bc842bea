//! Category-specific deep evaluation stage.
//!
//! Dispatches the winning category to its evaluator template and parses the
//! structured reply. Parsing is per-field: a malformed `key_findings` array
//! never invalidates a score the model did deliver.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use govlens_common::Config;
use govlens_model::{extract_json, CompletionRequest, ModelGateway};

use crate::discourse::ProposalRecord;
use crate::error::AnalyzerError;
use crate::prompts;

use super::{string_field, string_list, Category};

/// One structured observation inside a deep evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyFinding {
    pub aspect: String,
    pub analysis: String,
    pub impact: String,
}

/// Output of the category-specific evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepEvaluation {
    /// How central the category is to this proposal, in [0, 1].
    pub score: f64,
    pub reasoning: String,
    pub key_findings: Vec<KeyFinding>,
    pub information_gaps: Vec<String>,
    pub recommendations: Vec<String>,
    /// Wire id of the category the evaluation ran under.
    pub category: String,
}

pub struct EvaluatorDispatcher {
    gateway: Arc<dyn ModelGateway>,
    max_tokens: u32,
    temperature: f64,
    max_prompt_comments: usize,
    comment_preview_chars: usize,
}

impl EvaluatorDispatcher {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &Config) -> Self {
        Self {
            gateway,
            max_tokens: config.model.max_tokens_evaluation,
            temperature: config.model.temperature,
            max_prompt_comments: config.analysis.max_prompt_comments,
            comment_preview_chars: config.analysis.comment_preview_chars,
        }
    }

    /// Evaluates under a named category.
    ///
    /// Fails with `UnknownCategory` before any model call when the id is
    /// not one of the eight.
    pub async fn evaluate(
        &self,
        category: &str,
        proposal: &ProposalRecord,
    ) -> Result<DeepEvaluation, AnalyzerError> {
        let parsed = Category::parse(category)
            .ok_or_else(|| AnalyzerError::UnknownCategory(category.to_string()))?;
        Ok(self.evaluate_category(parsed, proposal).await)
    }

    /// Evaluates under a known category. Model and parse failures degrade
    /// into a zero-score result carrying the reason in `reasoning`.
    pub async fn evaluate_category(
        &self,
        category: Category,
        proposal: &ProposalRecord,
    ) -> DeepEvaluation {
        let prompt = prompts::evaluation_prompt(
            category,
            proposal,
            self.max_prompt_comments,
            self.comment_preview_chars,
        );
        let request =
            CompletionRequest::new(prompt, self.max_tokens).with_temperature(self.temperature);

        match self.gateway.complete(request).await {
            Ok(response) => parse_evaluation(&response, category),
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "Evaluation call failed");
                failed_evaluation(category, format!("Error evaluating proposal: {}", e))
            }
        }
    }
}

fn parse_evaluation(response: &str, category: Category) -> DeepEvaluation {
    let Some(json) = extract_json(response) else {
        tracing::warn!(category = %category, "Evaluation response carried no JSON object");
        return failed_evaluation(
            category,
            "Error evaluating proposal: no JSON object found in response",
        );
    };

    let value: Value = match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(category = %category, error = %e, "Evaluation response carried malformed JSON");
            return failed_evaluation(
                category,
                format!("Error evaluating proposal: malformed JSON in response: {}", e),
            );
        }
    };

    DeepEvaluation {
        score: value
            .get("score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
        reasoning: string_field(&value, "reasoning"),
        key_findings: key_findings(&value),
        information_gaps: string_list(&value, "information_gaps"),
        recommendations: string_list(&value, "recommendations"),
        category: category.as_str().to_string(),
    }
}

/// Non-object entries are dropped rather than invalidating the whole list.
fn key_findings(value: &Value) -> Vec<KeyFinding> {
    value
        .get("key_findings")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .map(|item| KeyFinding {
                    aspect: string_field(item, "aspect"),
                    analysis: string_field(item, "analysis"),
                    impact: string_field(item, "impact"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn failed_evaluation(category: Category, reason: impl Into<String>) -> DeepEvaluation {
    DeepEvaluation {
        reasoning: reason.into(),
        category: category.as_str().to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
