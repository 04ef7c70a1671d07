//! Raw output of one analysis tier, as handed to the consolidation engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::risk::{RawRisk, Risk};

/// Industry detected by the industry-pattern tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryDetection {
    pub industry: String,
    pub confidence: f64,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

/// Tier-specific metadata. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<IndustryDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{ risks, metadata, processingTimeMs }` from one tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierResult {
    pub risks: Vec<RawRisk>,
    pub metadata: TierMetadata,
    pub processing_time_ms: u64,
}

impl TierResult {
    /// A tier result holding already-validated risks.
    pub fn from_risks(risks: &[Risk]) -> Self {
        Self {
            risks: risks.iter().cloned().map(RawRisk::from).collect(),
            ..Default::default()
        }
    }

    /// Coerce every raw record into a [`Risk`], in tier order.
    ///
    /// Records without an id get fresh ids counting up from one past the
    /// largest explicit id in the tier, so they never collide with it.
    pub fn parse_risks(&self) -> Vec<Risk> {
        let mut next_id = self
            .risks
            .iter()
            .filter_map(|r| r.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.risks
            .iter()
            .cloned()
            .map(|raw| {
                let fallback = next_id;
                if raw.id.is_none() {
                    next_id = next_id.saturating_add(1);
                }
                Risk::from_raw(raw, fallback)
            })
            .collect()
    }
}

impl From<Risk> for RawRisk {
    fn from(risk: Risk) -> Self {
        Self {
            id: Some(risk.id),
            title: Some(risk.title),
            description: Some(risk.description),
            category: Some(risk.category),
            severity: Some(risk.severity.as_str().to_string()),
            recommendation: Some(risk.recommendation),
            source: risk.source,
            confidence: risk.confidence,
            original_text: risk.original_text,
            processing_notes: risk.processing_notes,
        }
    }
}
