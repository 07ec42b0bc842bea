//! Proposal analysis stages.
//!
//! `classifier` weighs a proposal across the eight governance categories,
//! `evaluator` runs the category-specific deep dive on the winner,
//! `sentiment` batches comment analysis, and `pipeline` wires the stages
//! behind a single entry point.

pub mod classifier;
pub mod evaluator;
pub mod pipeline;
pub mod sentiment;

pub use classifier::CategoryScorer;
pub use evaluator::{DeepEvaluation, EvaluatorDispatcher, KeyFinding};
pub use pipeline::{write_artifact, AnalysisPipeline, ProposalAnalysis};
pub use sentiment::{SentimentAggregate, SentimentAggregator, SentimentBatchResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Weight totals within this distance of 1.0 count as already normalized.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-4;

// ============================================================================
// Categories
// ============================================================================

/// The eight governance categories, in scoring order.
///
/// Enumeration order doubles as the tie-break: when two categories carry the
/// same weight, the one listed first takes the primary slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ProtocolParameters,
    TreasuryManagement,
    Tokenomics,
    ProtocolUpgrades,
    GovernanceProcess,
    PartnershipsIntegrations,
    RiskManagement,
    CommunityInitiatives,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ProtocolParameters,
        Category::TreasuryManagement,
        Category::Tokenomics,
        Category::ProtocolUpgrades,
        Category::GovernanceProcess,
        Category::PartnershipsIntegrations,
        Category::RiskManagement,
        Category::CommunityInitiatives,
    ];

    /// Wire identifier, matching the classification JSON keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ProtocolParameters => "protocol_parameters",
            Category::TreasuryManagement => "treasury_management",
            Category::Tokenomics => "tokenomics",
            Category::ProtocolUpgrades => "protocol_upgrades",
            Category::GovernanceProcess => "governance_process",
            Category::PartnershipsIntegrations => "partnerships_integrations",
            Category::RiskManagement => "risk_management",
            Category::CommunityInitiatives => "community_initiatives",
        }
    }

    /// Maps a wire identifier back to a category.
    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Weights
// ============================================================================

/// Per-category weight vector from the classification stage.
///
/// A valid vector sums to 1.0 within [`WEIGHT_SUM_TOLERANCE`], or is all
/// zero after a recovered failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub protocol_parameters: f64,
    pub treasury_management: f64,
    pub tokenomics: f64,
    pub protocol_upgrades: f64,
    pub governance_process: f64,
    pub partnerships_integrations: f64,
    pub risk_management: f64,
    pub community_initiatives: f64,
}

impl CategoryWeights {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::ProtocolParameters => self.protocol_parameters,
            Category::TreasuryManagement => self.treasury_management,
            Category::Tokenomics => self.tokenomics,
            Category::ProtocolUpgrades => self.protocol_upgrades,
            Category::GovernanceProcess => self.governance_process,
            Category::PartnershipsIntegrations => self.partnerships_integrations,
            Category::RiskManagement => self.risk_management,
            Category::CommunityInitiatives => self.community_initiatives,
        }
    }

    pub fn set(&mut self, category: Category, weight: f64) {
        *self.get_mut(category) = weight;
    }

    fn get_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::ProtocolParameters => &mut self.protocol_parameters,
            Category::TreasuryManagement => &mut self.treasury_management,
            Category::Tokenomics => &mut self.tokenomics,
            Category::ProtocolUpgrades => &mut self.protocol_upgrades,
            Category::GovernanceProcess => &mut self.governance_process,
            Category::PartnershipsIntegrations => &mut self.partnerships_integrations,
            Category::RiskManagement => &mut self.risk_management,
            Category::CommunityInitiatives => &mut self.community_initiatives,
        }
    }

    /// Sum across all eight categories.
    pub fn total(&self) -> f64 {
        Category::ALL.iter().map(|&c| self.get(c)).sum()
    }

    pub fn is_zero(&self) -> bool {
        Category::ALL.iter().all(|&c| self.get(c) == 0.0)
    }

    /// Rescales the weights to sum to 1.0 by dividing by the observed total.
    /// No-op on an all-zero vector, which has nothing to rescale.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total == 0.0 {
            return;
        }
        for category in Category::ALL {
            *self.get_mut(category) /= total;
        }
    }

    /// The highest-weighted category. Earlier-listed categories win ties,
    /// so an all-zero vector yields `protocol_parameters`.
    pub fn primary(&self) -> Category {
        let mut best = Category::ProtocolParameters;
        for category in Category::ALL {
            if self.get(category) > self.get(best) {
                best = category;
            }
        }
        best
    }
}

// ============================================================================
// Classification record
// ============================================================================

/// Classification stage output, mirroring the wire format: the eight weight
/// keys flattened beside `sum`, `primary_category` and `summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    #[serde(flatten)]
    pub weights: CategoryWeights,
    pub sum: f64,
    pub primary_category: String,
    pub summary: String,
}

impl Classification {
    /// Zero-weight fallback for a recovered failure. The primary category is
    /// the literal `"error"` and the summary carries the failure reason.
    pub fn error_fallback(reason: impl Into<String>) -> Self {
        Self {
            weights: CategoryWeights::default(),
            sum: 0.0,
            primary_category: "error".to_string(),
            summary: reason.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.primary_category == "error"
    }
}

// ============================================================================
// Shared parse helpers
// ============================================================================

pub(crate) fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Test support
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
