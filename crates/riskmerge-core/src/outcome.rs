//! Comparison results, provenance records and the decision log.

use serde::{Deserialize, Serialize};

use crate::risk::{Risk, Tier};

/// Per-field similarity between two risks, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDetails {
    pub title: f64,
    pub description: f64,
    pub category: f64,
    /// Weighted combination of the three field scores.
    pub overall: f64,
}

/// Classification of one incoming risk against its best candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicationDetection {
    pub general_risk: Risk,
    /// Best-matching candidate, `None` when nothing scored above zero.
    pub template_risk: Option<Risk>,
    /// Index of `template_risk` within the candidate list.
    pub matched_index: Option<usize>,
    pub similarity_score: f64,
    pub is_duplicate: bool,
    pub reason: String,
    pub comparison_details: ComparisonDetails,
    /// The verdict came from a manual override rather than the score.
    #[serde(default)]
    pub overridden: bool,
}

/// How a final risk entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Single source.
    Unique,
    /// First duplicate folded in.
    Merged,
    /// Further duplicates folded into an already merged entry.
    Enhanced,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Merged => "merged",
            Self::Enhanced => "enhanced",
        }
    }
}

/// One tier finding absorbed into a final entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub tier: Tier,
    pub risk_id: u64,
}

/// Provenance of the final risk at `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSourceRecord {
    pub position: usize,
    pub risk_id: u64,
    /// Distinct tiers, in the order they contributed.
    pub sources: Vec<Tier>,
    pub strategy: Strategy,
    pub contributions: Vec<Contribution>,
}

/// One entry of the consolidation audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Zero-based processing order.
    pub sequence: usize,
    pub tier: Tier,
    pub risk_id: u64,
    pub risk_title: String,
    pub is_duplicate: bool,
    pub similarity_score: f64,
    /// Final-list position of the best candidate, if any.
    pub matched_position: Option<usize>,
    pub matched_risk_id: Option<u64>,
    /// Final-list position the incoming risk ended up in.
    pub position: usize,
    /// Strategy of that entry right after this decision.
    pub strategy: Strategy,
    pub reason: String,
    pub comparison_details: ComparisonDetails,
    #[serde(default)]
    pub overridden: bool,
}
