//! Debug trace records. Built by the engine's trace builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::risk::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracePhase {
    /// Raw tier records coerced into risks.
    TierParse,
    /// One incoming risk scored against every candidate.
    Comparison,
    /// The merge or append applied for one incoming risk.
    MergeDecision,
    /// Run totals.
    Summary,
}

impl TracePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TierParse => "tier_parse",
            Self::Comparison => "comparison",
            Self::MergeDecision => "merge_decision",
            Self::Summary => "summary",
        }
    }
}

/// A single step of a consolidation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    pub sequence: usize,
    pub phase: TracePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    pub recorded_at: DateTime<Utc>,
    pub input: Value,
    pub output: Value,
}

/// Ordered steps of one run, suitable for replay and inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugTrace {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<TraceStep>,
}

impl DebugTrace {
    /// Steps of one phase, in recording order.
    pub fn phase(&self, phase: TracePhase) -> impl Iterator<Item = &TraceStep> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }
}
