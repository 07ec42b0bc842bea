//! Prompt templates for the classification, evaluation and sentiment stages.
//!
//! Template wording is part of the scoring contract: category weights and
//! evaluation scores shift when it drifts, so changes here should be
//! deliberate. The JSON format blocks are what the parsers in `analysis`
//! expect back.

use crate::analysis::Category;
use crate::discourse::{CommentRecord, ProposalRecord};
use crate::text;

// ============================================================================
// Classification
// ============================================================================

const CLASSIFICATION_PROMPT: &str = r#"You are an expert DAO governance delegate that has been tasked with analyzing a proposal. Analyze this proposal and:
1. Provide a insightful summary addressing: main problem/opportunity, changes suggested
2. Explain the potential outcomes if the proposal passes or fails
3. Assign weights to 8 categories (total must equal 1.0)

Categories:
1. Protocol Parameters: Specific numerical adjustments to existing protocol variables (interest rates, transaction fees, voting thresholds, time locks) without changing core functionality.
2. Treasury Management: Explicit movement, allocation or utilization of protocol-owned funds for defined purposes including investments, grants, or operational expenses.
3. Tokenomics: Changes affecting token supply, distribution, inflation/deflation mechanisms, vesting schedules, or fundamental token utility/governance rights.
4. Protocol Upgrades: Implementation of new technical features, smart contract deployments, security improvements, or modifications to the underlying protocol logic.
5. Governance Process: Alterations to decision-making mechanisms, voting systems, proposal frameworks, or the roles/powers of governance participants.
6. Partnerships & Integrations: Formal collaborations with external protocols, projects, or entities that create technical connections or business relationships.
7. Risk Management: Measures specifically designed to address protocol vulnerabilities, market exposures, or operational threats through defined safeguards.
8. Community Initiatives: Programs directly targeting ecosystem participants through education, outreach, incentives, or support structures with clear community benefit.

Scoring Guidelines:
- Primary category identified should receive highest score (>0.35)
- Secondary aspects: 0.1-0.25
- Minor aspects: 0.0-0.1
- Total must equal 1.0

Proposal to analyze:
"#;

const CLASSIFICATION_FORMAT: &str = r#"Please provide the analysis in the following JSON format:
{
    "protocol_parameters": <score>,
    "treasury_management": <score>,
    "tokenomics": <score>,
    "protocol_upgrades": <score>,
    "governance_process": <score>,
    "partnerships_integrations": <score>,
    "risk_management": <score>,
    "community_initiatives": <score>,
    "sum": <total of all scores>,
    "primary_category": "<category with highest score>",
    "summary": "<brief summary of the proposal>"
}

Make sure all scores are between 0 and 1, and the sum equals exactly 1.0."#;

/// Builds the category weighting prompt for a proposal.
pub fn classification_prompt(
    proposal: &ProposalRecord,
    max_comments: usize,
    preview_chars: usize,
) -> String {
    format!(
        "{}{}\n\n{}",
        CLASSIFICATION_PROMPT,
        proposal_text(proposal, max_comments, preview_chars),
        CLASSIFICATION_FORMAT
    )
}

// ============================================================================
// Category evaluation
// ============================================================================

struct EvaluatorTemplate {
    system: &'static str,
    key_points: [&'static str; 3],
    output_instructions: [&'static str; 4],
}

static PROTOCOL_PARAMETERS: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a protocol engineering analyst specializing in blockchain parameter optimization. Analyze this DAO governance proposal for protocol parameter changes, recognizing that proposals may not explicitly address all relevant aspects.",
    key_points: [
        "Parameter Identification: Identify protocol parameters mentioned (explicit or implicit)",
        "Change Assessment: For identified parameters",
        "Parameter Relationships: Note interdependencies between parameters",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central protocol parameter changes are to this proposal",
        "List of parameters being modified",
        "Brief analysis of potential impacts",
        "Information gaps: What additional parameter details would strengthen this proposal?",
    ],
};

static TREASURY_MANAGEMENT: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a financial strategist specializing in DAO treasury management. Analyze this governance proposal for treasury implications, understanding that financial details may be partial or implicit.",
    key_points: [
        "Resource Allocation: Quantify assets being allocated",
        "Financial Strategy: Purpose categorization and risk profile",
        "Accountability: Success metrics and reporting requirements",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central treasury management is to this proposal",
        "Summary of financial allocations proposed",
        "Risk/reward analysis based on available information",
        "Information gaps: What additional treasury details would strengthen this proposal?",
    ],
};

static TOKENOMICS: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a tokenomic architect specializing in incentive design. Analyze this DAO governance proposal for tokenomic implications, recognizing that token-related specifications may be incomplete.",
    key_points: [
        "Token Mechanism Changes: Identify token-related mechanisms being modified",
        "Supply Dynamics: Note changes to emission, burning, or locking mechanisms",
        "Incentive Structure: Identify behavioral incentives created or modified",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central tokenomics is to this proposal",
        "Summary of token-related changes",
        "Brief analysis of potential economic impacts",
        "Information gaps: What additional tokenomic details would strengthen this proposal?",
    ],
};

static PROTOCOL_UPGRADES: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a blockchain protocol architect specializing in technical implementation. Analyze this DAO governance proposal for technical upgrades, understanding that technical specifications may vary in detail.",
    key_points: [
        "Technical Changes: Identify components being modified",
        "Architecture Impact: Note changes to protocol architecture",
        "Performance Implications: Potential efficiency impacts",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central protocol upgrades are to this proposal",
        "Summary of technical changes proposed",
        "Brief risk assessment",
        "Information gaps: What additional technical details would strengthen this proposal?",
    ],
};

static GOVERNANCE_PROCESS: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a governance architect specializing in decentralized decision-making. Analyze this DAO proposal for governance process implications, recognizing that governance details may be implicit or partial.",
    key_points: [
        "Governance Mechanisms: Identify governance procedures being modified",
        "Decision Rights: Note changes to authority distribution",
        "Participation Changes: Changes to participation incentives or accessibility",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central governance process changes are to this proposal",
        "Summary of governance mechanisms being modified",
        "Brief analysis of power distribution impacts",
        "Information gaps: What additional governance details would strengthen this proposal?",
    ],
};

static PARTNERSHIPS_INTEGRATIONS: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are an ecosystem strategist specializing in protocol interoperability. Analyze this DAO governance proposal for partnership implications, understanding that relationship details may be incomplete.",
    key_points: [
        "Relationship Identification: Identify external entities involved",
        "Technical Integration: API or data sharing specifications",
        "Strategic Alignment: Alignment with DAO's objectives",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central partnerships are to this proposal",
        "Summary of external relationships proposed",
        "Brief analysis of strategic implications",
        "Information gaps: What additional partnership details would strengthen this proposal?",
    ],
};

static RISK_MANAGEMENT: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a risk engineer specializing in blockchain security and resilience. Analyze this DAO governance proposal for risk management implications, recognizing that risk analysis may be partial.",
    key_points: [
        "Risk Vectors: Identify risk categories addressed",
        "Mitigation Mechanisms: Technical safeguards proposed",
        "Resilience Improvements: Recovery capability enhancements",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central risk management is to this proposal",
        "Summary of risk vectors being addressed",
        "Brief analysis of mitigation effectiveness",
        "Information gaps: What additional risk management details would strengthen this proposal?",
    ],
};

static COMMUNITY_INITIATIVES: EvaluatorTemplate = EvaluatorTemplate {
    system: "You are a community architect specializing in ecosystem development. Analyze this DAO governance proposal for community implications, understanding that community initiatives may have varying levels of detail.",
    key_points: [
        "Initiative Identification: Identify community-focused activities",
        "User Journey: Onboarding/retention pathway improvements",
        "Resource Allocation: Resources dedicated to community building",
    ],
    output_instructions: [
        "Provide a score (0.00-1.00) reflecting how central community initiatives are to this proposal",
        "Summary of community activities proposed",
        "Brief analysis of potential ecosystem impact",
        "Information gaps: What additional community details would strengthen this proposal?",
    ],
};

const EVALUATION_FORMAT: &str = r#"Please provide your evaluation in the following JSON format:
{
    "score": <score between 0.00 and 1.00>,
    "reasoning": "<why this score>",
    "key_findings": [{"aspect": "<aspect>", "analysis": "<analysis>", "impact": "<impact>"}, ...],
    "information_gaps": ["<gap 1>", "<gap 2>", ...],
    "recommendations": ["<recommendation 1>", "<recommendation 2>", ...]
}"#;

fn template_for(category: Category) -> &'static EvaluatorTemplate {
    match category {
        Category::ProtocolParameters => &PROTOCOL_PARAMETERS,
        Category::TreasuryManagement => &TREASURY_MANAGEMENT,
        Category::Tokenomics => &TOKENOMICS,
        Category::ProtocolUpgrades => &PROTOCOL_UPGRADES,
        Category::GovernanceProcess => &GOVERNANCE_PROCESS,
        Category::PartnershipsIntegrations => &PARTNERSHIPS_INTEGRATIONS,
        Category::RiskManagement => &RISK_MANAGEMENT,
        Category::CommunityInitiatives => &COMMUNITY_INITIATIVES,
    }
}

/// Builds the category-specific deep evaluation prompt.
pub fn evaluation_prompt(
    category: Category,
    proposal: &ProposalRecord,
    max_comments: usize,
    preview_chars: usize,
) -> String {
    let template = template_for(category);
    format!(
        "{}\n\nKey Analysis Points:\n{}\n\nOutput Instructions:\n{}\n\n{}\n\nPlease analyze the following proposal:\n\n{}",
        template.system,
        bulleted(&template.key_points),
        bulleted(&template.output_instructions),
        EVALUATION_FORMAT,
        proposal_text(proposal, max_comments, preview_chars)
    )
}

// ============================================================================
// Sentiment
// ============================================================================

const SENTIMENT_FORMAT: &str = r#"Please provide your analysis in the following JSON format:
{
    "sentiment_score": <score between -1 and 1>,
    "summary": "<brief summary of the comments>",
    "key_points": ["<point 1>", "<point 2>", ...],
    "concerns": ["<concern 1>", "<concern 2>", ...],
    "suggestions": ["<suggestion 1>", "<suggestion 2>", ...]
}

Make sure to:
1. Consider both positive and negative sentiment
2. Identify key points and concerns
3. Note any suggestions for improvement
4. Provide a balanced summary"#;

/// Builds the per-batch sentiment prompt, numbering comments in order. A
/// proposal summary, when given, is prepended as context for the batch.
pub fn sentiment_batch_prompt(comments: &[CommentRecord], context: Option<&str>) -> String {
    let formatted = comments
        .iter()
        .enumerate()
        .map(|(i, comment)| format!("Comment {}:\n{}", i + 1, comment.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let context_block = match context {
        Some(summary) if !summary.is_empty() => format!("Proposal context:\n{}\n\n", summary),
        _ => String::new(),
    };

    format!(
        "Analyze the sentiment and key points of these comments on a DAO governance proposal.\n\n{}Comments:\n{}\n\n{}",
        context_block, formatted, SENTIMENT_FORMAT
    )
}

/// Builds the cross-batch synthesis prompt from the top aggregated items.
pub fn synthesis_prompt(
    key_points: &[String],
    concerns: &[String],
    suggestions: &[String],
    avg_sentiment: f64,
) -> String {
    format!(
        "Create a concise summary of the community sentiment and key points from this proposal discussion.\n\n\
         Key Points:\n{}\n\n\
         Concerns:\n{}\n\n\
         Suggestions:\n{}\n\n\
         Overall Sentiment Score: {:.2}\n\n\
         Please provide a brief, balanced summary that captures the main sentiment and key takeaways.",
        bulleted_capped(key_points, 5),
        bulleted_capped(concerns, 5),
        bulleted_capped(suggestions, 5),
        avg_sentiment
    )
}

// ============================================================================
// Assembly helpers
// ============================================================================

/// Flattens a proposal into the text block shared by the classification and
/// evaluation prompts: title, normalized content, then the first few comment
/// previews.
pub fn proposal_text(
    proposal: &ProposalRecord,
    max_comments: usize,
    preview_chars: usize,
) -> String {
    let mut out = format!(
        "Title: {}\n\nProposal Content:\n{}",
        proposal.title, proposal.content
    );

    if max_comments > 0 && !proposal.comments.is_empty() {
        out.push_str("\n\nKey Comments:");
        for comment in proposal.comments.iter().take(max_comments) {
            out.push_str("\n- ");
            out.push_str(&text::truncate_preview(&comment.content, preview_chars));
        }
    }

    out
}

fn bulleted(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bulleted_capped(items: &[String], cap: usize) -> String {
    items
        .iter()
        .take(cap)
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal_with_comments(count: usize) -> ProposalRecord {
        ProposalRecord {
            title: "Raise the fee switch".into(),
            content: "Turn on protocol fees for the top pools.".into(),
            comments: (0..count)
                .map(|i| CommentRecord {
                    content: format!("comment number {}", i),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classification_prompt_structure() {
        let prompt = classification_prompt(&proposal_with_comments(1), 3, 500);
        assert!(prompt.contains("Title: Raise the fee switch"));
        assert!(prompt.contains("1. Protocol Parameters:"));
        assert!(prompt.contains("8. Community Initiatives:"));
        assert!(prompt.contains("\"primary_category\""));
        assert!(prompt.contains("the sum equals exactly 1.0"));
    }

    #[test]
    fn test_proposal_text_caps_comments() {
        let text = proposal_text(&proposal_with_comments(5), 3, 500);
        assert_eq!(text.matches("\n- ").count(), 3);
        assert!(text.contains("comment number 2"));
        assert!(!text.contains("comment number 3"));
    }

    #[test]
    fn test_proposal_text_without_comments() {
        let text = proposal_text(&proposal_with_comments(0), 3, 500);
        assert!(!text.contains("Key Comments"));
    }

    #[test]
    fn test_proposal_text_truncates_long_comments() {
        let mut proposal = proposal_with_comments(1);
        proposal.comments[0].content = "word ".repeat(200);
        let text = proposal_text(&proposal, 3, 50);
        assert!(text.contains("..."));
        assert!(!text.contains(&"word ".repeat(20)));
    }

    #[test]
    fn test_evaluation_prompt_role_per_category() {
        let proposal = proposal_with_comments(1);
        let treasury = evaluation_prompt(Category::TreasuryManagement, &proposal, 3, 500);
        assert!(treasury.contains("financial strategist"));

        let risk = evaluation_prompt(Category::RiskManagement, &proposal, 3, 500);
        assert!(risk.contains("risk engineer"));
    }

    #[test]
    fn test_evaluation_prompt_shared_skeleton() {
        let proposal = proposal_with_comments(1);
        for category in Category::ALL {
            let prompt = evaluation_prompt(category, &proposal, 3, 500);
            assert!(prompt.contains("Provide a score (0.00-1.00)"), "{:?}", category);
            assert!(prompt.contains("Information gaps:"), "{:?}", category);
            assert!(prompt.contains("\"key_findings\""), "{:?}", category);
            assert!(prompt.contains("Please analyze the following proposal:"));
        }
    }

    #[test]
    fn test_sentiment_batch_prompt_numbers_comments() {
        let comments = vec![
            CommentRecord {
                content: "great idea".into(),
                ..Default::default()
            },
            CommentRecord {
                content: "needs work".into(),
                ..Default::default()
            },
        ];
        let prompt = sentiment_batch_prompt(&comments, None);
        assert!(prompt.contains("Comment 1:\ngreat idea"));
        assert!(prompt.contains("Comment 2:\nneeds work"));
        assert!(prompt.contains("\"sentiment_score\""));
        assert!(!prompt.contains("Proposal context:"));
    }

    #[test]
    fn test_sentiment_batch_prompt_with_context() {
        let comments = vec![CommentRecord {
            content: "great idea".into(),
            ..Default::default()
        }];
        let prompt =
            sentiment_batch_prompt(&comments, Some("Fee switch pilot for the top pools."));
        assert!(prompt.contains("Proposal context:\nFee switch pilot for the top pools."));
        assert!(prompt.contains("Comment 1:\ngreat idea"));
    }

    #[test]
    fn test_synthesis_prompt_caps_lists_at_five() {
        let points: Vec<String> = (0..7).map(|i| format!("point {}", i)).collect();
        let prompt = synthesis_prompt(&points, &[], &[], 0.4545);
        assert!(prompt.contains("point 4"));
        assert!(!prompt.contains("point 5"));
        assert!(prompt.contains("Overall Sentiment Score: 0.45"));
    }
}
