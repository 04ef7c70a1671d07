//! Top-level result of a three-tier analysis.

use serde::{Deserialize, Serialize};

use crate::outcome::{Decision, RiskSourceRecord};
use crate::risk::{Risk, Severity};
use crate::tier::{IndustryDetection, TierResult};
use crate::trace::DebugTrace;

/// Counts over the consolidated risk list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeveritySummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Industry and general risks classified.
    pub incoming: usize,
    /// Of those, how many were folded into an existing entry.
    pub duplicates: usize,
    /// `duplicates / incoming`, zero when nothing came in.
    pub duplicate_rate: f64,
}

impl SeveritySummary {
    pub fn from_run(risks: &[Risk], decisions: &[Decision]) -> Self {
        let count = |sev: Severity| risks.iter().filter(|r| r.severity == sev).count();
        let incoming = decisions.len();
        let duplicates = decisions.iter().filter(|d| d.is_duplicate).count();
        let duplicate_rate = if incoming == 0 {
            0.0
        } else {
            duplicates as f64 / incoming as f64
        };
        Self {
            total: risks.len(),
            high: count(Severity::High),
            medium: count(Severity::Medium),
            low: count(Severity::Low),
            incoming,
            duplicates,
            duplicate_rate,
        }
    }
}

/// The de-duplicated, provenance-tagged risk list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedResult {
    pub risks: Vec<Risk>,
    /// Index-aligned with `risks`.
    pub sources: Vec<RiskSourceRecord>,
    pub overall_confidence: f64,
    pub summary: SeveritySummary,
}

/// Wall-clock timings. Metadata only; never feeds a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierTimings {
    pub template_ms: u64,
    pub industry_ms: u64,
    pub general_ms: u64,
    pub consolidation_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInformation {
    pub tier_timings: TierTimings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_detection: Option<IndustryDetection>,
    pub decisions: Vec<Decision>,
    pub trace: DebugTrace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeTierAnalysisResult {
    pub template: TierResult,
    pub industry: TierResult,
    pub general: TierResult,
    pub consolidated_result: ConsolidatedResult,
    pub debug_information: DebugInformation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ComparisonDetails, Strategy};
    use crate::risk::Tier;

    fn decision(sequence: usize, is_duplicate: bool) -> Decision {
        Decision {
            sequence,
            tier: Tier::General,
            risk_id: sequence as u64,
            risk_title: String::new(),
            is_duplicate,
            similarity_score: 0.0,
            matched_position: None,
            matched_risk_id: None,
            position: 0,
            strategy: Strategy::Unique,
            reason: String::new(),
            comparison_details: ComparisonDetails::default(),
            overridden: false,
        }
    }

    #[test]
    fn summary_counts_severities_and_duplicates() {
        let risks = vec![
            Risk::new(1, "a", "a", "x", Severity::High),
            Risk::new(2, "b", "b", "x", Severity::Low),
            Risk::new(3, "c", "c", "x", Severity::High),
        ];
        let decisions = vec![decision(0, true), decision(1, false), decision(2, true), decision(3, true)];
        let summary = SeveritySummary::from_run(&risks, &decisions);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.incoming, 4);
        assert_eq!(summary.duplicates, 3);
        assert!((summary.duplicate_rate - 0.75).abs() < 1e-12);
    }

    #[test]
    fn summary_empty_run() {
        let summary = SeveritySummary::from_run(&[], &[]);
        assert_eq!(summary, SeveritySummary::default());
    }
}
