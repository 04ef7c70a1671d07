//! Risk records as produced by the analysis tiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Risk severity. Unknown or missing severities coerce to [`Severity::Medium`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a severity label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Which producer a risk record says it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskOrigin {
    Template,
    AiInsight,
    /// Set on records built by merging findings from more than one tier.
    Hybrid,
}

/// One of the three independent analysis tiers.
///
/// Declaration order is the consolidation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Contract-template guided analysis. Authoritative base set.
    Template,
    /// Industry-pattern analysis.
    Industry,
    /// Open-ended general analysis.
    General,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Template, Tier::Industry, Tier::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Industry => "industry",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single risk finding.
///
/// `id` is unique within one tier's output only. Two tiers may reuse the same
/// id for unrelated findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RiskOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processing_notes: Vec<String>,
}

/// A risk record as delivered by a tier, before validation.
///
/// Every field is optional so that a single bad record never fails the
/// deserialisation of a whole tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRisk {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub severity: Option<String>,
    pub recommendation: Option<String>,
    pub source: Option<RiskOrigin>,
    pub confidence: Option<f64>,
    pub original_text: Option<String>,
    pub processing_notes: Vec<String>,
}

impl Risk {
    /// Build a well-formed risk with no optional metadata.
    pub fn new(
        id: u64,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            severity,
            recommendation: String::new(),
            source: None,
            confidence: None,
            original_text: None,
            processing_notes: Vec::new(),
        }
    }

    /// Coerce a raw tier record into a [`Risk`].
    ///
    /// Missing required fields become neutral values (empty string, `medium`
    /// severity) and each coercion leaves a processing note on the record.
    /// `fallback_id` becomes the id when the record has none; the caller is
    /// responsible for it being unused within the tier
    /// (see [`TierResult::parse_risks`](crate::TierResult::parse_risks)).
    pub fn from_raw(raw: RawRisk, fallback_id: u64) -> Self {
        let mut notes = raw.processing_notes;
        let carried = notes.len();

        let id = match raw.id {
            Some(id) => id,
            None => {
                notes.push(format!("missing id; assigned unused id {fallback_id}"));
                fallback_id
            }
        };

        let title = required_text(raw.title, "title", &mut notes);
        let category = required_text(raw.category, "category", &mut notes);
        let description = raw.description.unwrap_or_default();
        let recommendation = raw.recommendation.unwrap_or_default();

        let severity = match raw.severity.as_deref() {
            None => {
                notes.push("missing severity; coerced to medium".to_string());
                Severity::Medium
            }
            Some(label) => Severity::from_label(label).unwrap_or_else(|| {
                notes.push(format!("unrecognised severity {label:?}; coerced to medium"));
                Severity::Medium
            }),
        };

        let confidence = match raw.confidence {
            Some(c) if c.is_nan() => {
                notes.push("confidence is not a number; dropped".to_string());
                None
            }
            Some(c) if !(0.0..=1.0).contains(&c) => {
                let clamped = c.clamp(0.0, 1.0);
                notes.push(format!("confidence {c} outside [0, 1]; clamped to {clamped}"));
                Some(clamped)
            }
            other => other,
        };

        let coerced = notes.len() - carried;
        if coerced > 0 {
            warn!(id, coerced, "malformed risk record coerced");
        }

        Self {
            id,
            title,
            description,
            category,
            severity,
            recommendation,
            source: raw.source,
            confidence,
            original_text: raw.original_text,
            processing_notes: notes,
        }
    }

    /// Title, description and category all carry some alphanumeric text.
    pub fn is_well_formed(&self) -> bool {
        [&self.title, &self.description, &self.category]
            .iter()
            .all(|field| field.chars().any(char::is_alphanumeric))
    }
}

fn required_text(value: Option<String>, field: &str, notes: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            notes.push(format!("missing {field}; coerced to empty string"));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_case_insensitive() {
        assert_eq!(Severity::from_label("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_label(" Medium "), Some(Severity::Medium));
        assert_eq!(Severity::from_label("low"), Some(Severity::Low));
        assert_eq!(Severity::from_label("critical"), None);
    }

    #[test]
    fn from_raw_keeps_complete_record() {
        let raw = RawRisk {
            id: Some(7),
            title: Some("Unlimited Liability".into()),
            description: Some("No cap on damages".into()),
            category: Some("Liability".into()),
            severity: Some("High".into()),
            recommendation: Some("Negotiate a liability cap".into()),
            source: Some(RiskOrigin::Template),
            confidence: Some(0.9),
            original_text: None,
            processing_notes: vec![],
        };
        let risk = Risk::from_raw(raw, 1);
        assert_eq!(risk.id, 7);
        assert_eq!(risk.severity, Severity::High);
        assert_eq!(risk.source, Some(RiskOrigin::Template));
        assert!(risk.processing_notes.is_empty());
        assert!(risk.is_well_formed());
    }

    #[test]
    fn from_raw_coerces_missing_fields_with_notes() {
        let raw = RawRisk {
            description: Some("Vendor may terminate at will".into()),
            ..Default::default()
        };
        let risk = Risk::from_raw(raw, 5);
        assert_eq!(risk.id, 5);
        assert_eq!(risk.title, "");
        assert_eq!(risk.category, "");
        assert_eq!(risk.severity, Severity::Medium);
        assert_eq!(risk.processing_notes.len(), 4);
        assert!(risk.processing_notes.iter().any(|n| n.contains("title")));
        assert!(risk.processing_notes.iter().any(|n| n.contains("severity")));
        assert!(!risk.is_well_formed());
    }

    #[test]
    fn from_raw_unknown_severity_becomes_medium() {
        let raw = RawRisk {
            id: Some(1),
            title: Some("Auto-renewal".into()),
            category: Some("Term".into()),
            severity: Some("catastrophic".into()),
            ..Default::default()
        };
        let risk = Risk::from_raw(raw, 1);
        assert_eq!(risk.severity, Severity::Medium);
        assert_eq!(risk.processing_notes.len(), 1);
        assert!(risk.processing_notes[0].contains("catastrophic"));
    }

    #[test]
    fn from_raw_clamps_confidence() {
        let raw = RawRisk {
            id: Some(1),
            title: Some("t".into()),
            category: Some("c".into()),
            severity: Some("low".into()),
            confidence: Some(1.4),
            ..Default::default()
        };
        let risk = Risk::from_raw(raw, 1);
        assert_eq!(risk.confidence, Some(1.0));
        assert_eq!(risk.processing_notes.len(), 1);
    }

    #[test]
    fn raw_risk_tolerates_sparse_json() {
        let json = r#"[
            {"id": 3, "title": "Indemnity", "severity": "high"},
            {"description": "Governing law is unclear", "aiField": true}
        ]"#;
        let parsed: Vec<RawRisk> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, Some(3));
        assert!(parsed[1].title.is_none());
    }

    #[test]
    fn risk_json_uses_camel_case() {
        let mut risk = Risk::new(1, "Payment Terms", "Net 60", "Payment", Severity::Medium);
        risk.original_text = Some("Payment is due sixty days after invoice.".into());
        let json = serde_json::to_value(&risk).unwrap();
        assert!(json.get("originalText").is_some());
        assert!(json.get("processingNotes").is_none());
        assert_eq!(json["severity"], "medium");
    }

    #[test]
    fn origin_serialises_snake_case() {
        let json = serde_json::to_string(&RiskOrigin::AiInsight).unwrap();
        assert_eq!(json, "\"ai_insight\"");
    }

    #[test]
    fn tiers_order_by_priority() {
        assert!(Tier::Template < Tier::Industry);
        assert!(Tier::Industry < Tier::General);
        assert_eq!(Tier::General.to_string(), "general");
    }
}
