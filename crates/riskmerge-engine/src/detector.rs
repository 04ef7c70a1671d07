//! Duplicate detection: best candidate per incoming risk, classified against
//! the similarity threshold.
//!
//! Every incoming risk is scored against every candidate; nothing is capped
//! or sampled. Incoming risks are independent of each other and are scored in
//! parallel, but results always come back in input order.

use rayon::prelude::*;
use riskmerge_core::{
    ComparisonDetails, ConsolidationConfig, DuplicationDetection, OverrideVerdict, Risk, Tier,
};
use tracing::debug;

use crate::similarity::score;

pub const NO_CANDIDATE_REASON: &str = "no comparable template risk found";

/// A result-set entry offered for matching, tagged with the tier that seeded it.
///
/// Ids are only unique within a tier, so overrides use the tier as well as
/// the id to pick out a candidate.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub tier: Tier,
    pub risk: &'a Risk,
}

impl<'a> Candidate<'a> {
    /// Tag every risk of one tier.
    pub fn all(tier: Tier, risks: &'a [Risk]) -> Vec<Self> {
        risks.iter().map(|risk| Self { tier, risk }).collect()
    }
}

/// A detection plus the overall score against every candidate.
///
/// `candidate_scores[i]` is `None` when a manual override excluded candidate `i`.
#[derive(Debug, Clone)]
pub struct Scan {
    pub detection: DuplicationDetection,
    pub candidate_scores: Vec<Option<f64>>,
}

/// Classify each `general` risk against its best match in `template`.
///
/// Returns exactly one detection per general risk, in input order.
pub fn detect(
    general: &[Risk],
    template: &[Risk],
    config: &ConsolidationConfig,
) -> Vec<DuplicationDetection> {
    let candidates = Candidate::all(Tier::Template, template);
    scan(general, &candidates, config, None)
        .into_iter()
        .map(|s| s.detection)
        .collect()
}

/// Like [`detect`], keeping per-candidate scores.
///
/// `tier` names the tier the incoming risks belong to; it scopes manual
/// overrides that are restricted to one tier.
pub fn scan(
    incoming: &[Risk],
    candidates: &[Candidate<'_>],
    config: &ConsolidationConfig,
    tier: Option<Tier>,
) -> Vec<Scan> {
    incoming
        .par_iter()
        .map(|risk| scan_one(risk, candidates, config, tier))
        .collect()
}

struct Best {
    index: usize,
    id: u64,
    details: ComparisonDetails,
}

fn scan_one(
    risk: &Risk,
    candidates: &[Candidate<'_>],
    config: &ConsolidationConfig,
    tier: Option<Tier>,
) -> Scan {
    let mut best: Option<Best> = None;
    let mut forced: Option<Best> = None;
    let mut excluded = 0usize;
    let mut candidate_scores = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        let verdict = config.override_for(tier, risk.id, Some(candidate.tier), candidate.risk.id);
        if verdict == Some(OverrideVerdict::Distinct) {
            excluded += 1;
            candidate_scores.push(None);
            continue;
        }

        let candidate = candidate.risk;
        let details = score(risk, candidate, config);
        candidate_scores.push(Some(details.overall));

        if verdict == Some(OverrideVerdict::Duplicate) && forced.is_none() {
            forced = Some(Best {
                index,
                id: candidate.id,
                details,
            });
        }

        // Highest score wins; ties go to the lower id, then the earlier position.
        let better = match &best {
            None => true,
            Some(b) => {
                details.overall > b.overall()
                    || (details.overall == b.overall() && candidate.id < b.id)
            }
        };
        if better {
            best = Some(Best {
                index,
                id: candidate.id,
                details,
            });
        }
    }

    let threshold = config.similarity_threshold;
    let detection = if let Some(f) = forced {
        DuplicationDetection {
            general_risk: risk.clone(),
            template_risk: Some(candidates[f.index].risk.clone()),
            matched_index: Some(f.index),
            similarity_score: f.details.overall,
            is_duplicate: true,
            reason: "manual override: forced duplicate".to_string(),
            comparison_details: f.details,
            overridden: true,
        }
    } else {
        match best {
            Some(b) if b.overall() > 0.0 => {
                let overall = b.overall();
                let is_duplicate = overall >= threshold;
                let mut reason = if is_duplicate {
                    describe_match(&b.details, threshold)
                } else {
                    format!("below threshold: {overall:.2} < {threshold:.2}")
                };
                if excluded > 0 {
                    reason.push_str(&format!("; manual override excluded {excluded} candidate(s)"));
                }
                DuplicationDetection {
                    general_risk: risk.clone(),
                    template_risk: Some(candidates[b.index].risk.clone()),
                    matched_index: Some(b.index),
                    similarity_score: overall,
                    is_duplicate,
                    reason,
                    comparison_details: b.details,
                    overridden: excluded > 0,
                }
            }
            _ => DuplicationDetection {
                general_risk: risk.clone(),
                template_risk: None,
                matched_index: None,
                similarity_score: 0.0,
                is_duplicate: false,
                reason: no_candidate_reason(excluded, candidates.len()),
                comparison_details: ComparisonDetails::default(),
                overridden: excluded > 0,
            },
        }
    };

    debug!(
        incoming = risk.id,
        candidates = candidates.len(),
        matched = ?detection.template_risk.as_ref().map(|r| r.id),
        score = detection.similarity_score,
        duplicate = detection.is_duplicate,
        "scanned risk"
    );

    Scan {
        detection,
        candidate_scores,
    }
}

impl Best {
    fn overall(&self) -> f64 {
        self.details.overall
    }
}

fn no_candidate_reason(excluded: usize, total: usize) -> String {
    if excluded == 0 {
        NO_CANDIDATE_REASON.to_string()
    } else if excluded == total {
        format!("manual override excluded all {total} candidate(s)")
    } else {
        format!("{NO_CANDIDATE_REASON}; manual override excluded {excluded} candidate(s)")
    }
}

/// Name the fields that individually reached the threshold. Fields that
/// scored zero never count, whatever the threshold.
fn describe_match(details: &ComparisonDetails, threshold: f64) -> String {
    let fields: Vec<&str> = [
        ("title", details.title),
        ("description", details.description),
        ("category", details.category),
    ]
    .into_iter()
    .filter(|&(_, s)| s > 0.0 && s >= threshold)
    .map(|(name, _)| name)
    .collect();

    match fields.as_slice() {
        [] => format!(
            "combined similarity {:.2} >= {threshold:.2}",
            details.overall
        ),
        [one] => format!("high {one} overlap"),
        [first, second] => format!("high {first} and {second} overlap"),
        [init @ .., last] => format!("high {} and {last} overlap", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskmerge_core::{ManualOverride, Severity};

    fn risk(id: u64, title: &str, category: &str, description: &str) -> Risk {
        Risk::new(id, title, description, category, Severity::Medium)
    }

    fn payment_template() -> Risk {
        risk(1, "Payment Terms", "Payment", "Payment due in 60 days")
    }

    fn payment_general() -> Risk {
        risk(
            9,
            "Delayed Payment",
            "Payment Terms",
            "Invoice payment occurs after 60 days, which is long",
        )
    }

    #[test]
    fn one_detection_per_general_risk() {
        let general = vec![
            payment_general(),
            risk(10, "Governing Law", "Dispute Resolution", "Disputes heard in Delaware"),
            risk(11, "", "", ""),
        ];
        let template = vec![payment_template()];
        let detections = detect(&general, &template, &ConsolidationConfig::default());
        assert_eq!(detections.len(), 3);
        let ids: Vec<u64> = detections.iter().map(|d| d.general_risk.id).collect();
        assert_eq!(ids, vec![9, 10, 11]);
    }

    #[test]
    fn payment_pair_is_duplicate() {
        let detections = detect(
            &[payment_general()],
            &[payment_template()],
            &ConsolidationConfig::default(),
        );
        let d = &detections[0];
        assert!(d.is_duplicate);
        assert_eq!(d.template_risk.as_ref().map(|r| r.id), Some(1));
        assert_eq!(d.matched_index, Some(0));
        assert_eq!(d.reason, "high title and description overlap");
    }

    #[test]
    fn empty_template_yields_no_candidate() {
        let detections = detect(&[payment_general()], &[], &ConsolidationConfig::default());
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert!(!d.is_duplicate);
        assert!(d.template_risk.is_none());
        assert_eq!(d.reason, NO_CANDIDATE_REASON);
    }

    #[test]
    fn zero_score_yields_no_candidate() {
        let template = vec![risk(1, "Confidentiality Duration", "Confidentiality", "Secrecy survives")];
        let general = vec![risk(2, "Non-Compete Scope", "Non-Compete", "Competitors barred")];
        let detections = detect(&general, &template, &ConsolidationConfig::default());
        assert!(detections[0].template_risk.is_none());
        assert_eq!(detections[0].reason, NO_CANDIDATE_REASON);
    }

    #[test]
    fn below_threshold_reason() {
        let template = vec![risk(1, "Payment Terms", "Payment", "Net 30 payment")];
        let general = vec![risk(2, "Late Fees", "Termination", "Interest on overdue payment")];
        let d = &detect(&general, &template, &ConsolidationConfig::default())[0];
        assert!(!d.is_duplicate);
        assert!(d.template_risk.is_some());
        assert!(d.reason.starts_with("below threshold: "), "{}", d.reason);
        assert!(d.reason.ends_with("< 0.70"), "{}", d.reason);
    }

    #[test]
    fn picks_highest_scoring_candidate() {
        let template = vec![
            risk(1, "Late Fees", "Payment", "Interest charged on overdue invoices"),
            payment_template(),
            risk(3, "Termination Notice", "Termination", "Thirty days notice"),
        ];
        let d = &detect(&[payment_general()], &template, &ConsolidationConfig::default())[0];
        assert_eq!(d.matched_index, Some(1));
        assert_eq!(d.template_risk.as_ref().map(|r| r.id), Some(1));
    }

    #[test]
    fn ties_go_to_lower_id() {
        let template = vec![
            risk(5, "Payment Terms", "Payment", "Payment due in 60 days"),
            risk(2, "Payment Terms", "Payment", "Payment due in 60 days"),
            risk(7, "Payment Terms", "Payment", "Payment due in 60 days"),
        ];
        let d = &detect(&[payment_general()], &template, &ConsolidationConfig::default())[0];
        assert_eq!(d.template_risk.as_ref().map(|r| r.id), Some(2));
        assert_eq!(d.matched_index, Some(1));
    }

    #[test]
    fn ties_with_equal_ids_go_to_earlier_position() {
        let template = vec![payment_template(), payment_template()];
        let d = &detect(&[payment_general()], &template, &ConsolidationConfig::default())[0];
        assert_eq!(d.matched_index, Some(0));
    }

    #[test]
    fn scan_records_every_candidate_score() {
        let template = vec![
            payment_template(),
            risk(2, "Termination Notice", "Termination", "Thirty days notice"),
        ];
        let general = vec![payment_general(), risk(4, "x", "y", "z")];
        let candidates = Candidate::all(Tier::Template, &template);
        let scans = scan(&general, &candidates, &ConsolidationConfig::default(), None);
        assert_eq!(scans.len(), 2);
        for s in &scans {
            assert_eq!(s.candidate_scores.len(), 2);
            assert!(s.candidate_scores.iter().all(Option::is_some));
        }
    }

    #[test]
    fn forced_duplicate_override() {
        let template = vec![risk(3, "Termination Notice", "Termination", "Thirty days notice")];
        let general = vec![payment_general()];
        let config = ConsolidationConfig {
            enable_manual_overrides: true,
            overrides: vec![ManualOverride {
                tier: None,
                incoming_id: 9,
                candidate_tier: None,
                candidate_id: 3,
                verdict: OverrideVerdict::Duplicate,
            }],
            ..Default::default()
        };
        let d = &detect(&general, &template, &config)[0];
        assert!(d.is_duplicate);
        assert!(d.overridden);
        assert_eq!(d.reason, "manual override: forced duplicate");
    }

    #[test]
    fn forced_distinct_override() {
        let config = ConsolidationConfig {
            enable_manual_overrides: true,
            overrides: vec![ManualOverride {
                tier: None,
                incoming_id: 9,
                candidate_tier: None,
                candidate_id: 1,
                verdict: OverrideVerdict::Distinct,
            }],
            ..Default::default()
        };
        let template = [payment_template()];
        let candidates = Candidate::all(Tier::Template, &template);
        let scans = scan(&[payment_general()], &candidates, &config, None);
        let d = &scans[0].detection;
        assert!(!d.is_duplicate);
        assert!(d.overridden);
        assert!(d.template_risk.is_none());
        assert_eq!(d.reason, "manual override excluded all 1 candidate(s)");
        assert_eq!(scans[0].candidate_scores, vec![None]);
    }

    #[test]
    fn override_only_hits_candidate_from_named_tier() {
        let template = risk(1, "Payment Terms", "Payment", "Payment due in 60 days");
        let industry = risk(1, "Retention Money", "Retention", "Ten percent retention withheld");
        let candidates = vec![
            Candidate {
                tier: Tier::Template,
                risk: &template,
            },
            Candidate {
                tier: Tier::Industry,
                risk: &industry,
            },
        ];
        let incoming = risk(9, "Retention Money Withheld", "Retention", "Ten percent retention withheld");
        let config = ConsolidationConfig {
            enable_manual_overrides: true,
            overrides: vec![ManualOverride {
                tier: Some(Tier::General),
                incoming_id: 9,
                candidate_tier: Some(Tier::Template),
                candidate_id: 1,
                verdict: OverrideVerdict::Distinct,
            }],
            ..Default::default()
        };

        let scans = scan(&[incoming], &candidates, &config, Some(Tier::General));
        assert_eq!(scans[0].candidate_scores[0], None);
        assert!(scans[0].candidate_scores[1].is_some());
        let d = &scans[0].detection;
        assert!(d.is_duplicate);
        assert_eq!(d.matched_index, Some(1));
        assert!(d.reason.ends_with("; manual override excluded 1 candidate(s)"), "{}", d.reason);
    }

    #[test]
    fn zero_fields_never_called_high_overlap() {
        let details = ComparisonDetails {
            title: 0.4,
            description: 0.0,
            category: 0.0,
            overall: 0.16,
        };
        assert_eq!(describe_match(&details, 0.0), "high title overlap");
        let none = ComparisonDetails::default();
        assert_eq!(describe_match(&none, 0.0), "combined similarity 0.00 >= 0.00");
    }

    #[test]
    fn overrides_ignored_when_disabled() {
        let config = ConsolidationConfig {
            overrides: vec![ManualOverride {
                tier: None,
                incoming_id: 9,
                candidate_tier: None,
                candidate_id: 1,
                verdict: OverrideVerdict::Distinct,
            }],
            ..Default::default()
        };
        let d = &detect(&[payment_general()], &[payment_template()], &config)[0];
        assert!(d.is_duplicate);
        assert!(!d.overridden);
    }

    #[test]
    fn describe_match_lists_fields() {
        let details = ComparisonDetails {
            title: 0.9,
            description: 0.8,
            category: 1.0,
            overall: 0.9,
        };
        assert_eq!(
            describe_match(&details, 0.7),
            "high title, description and category overlap"
        );
        let combined = ComparisonDetails {
            title: 0.6,
            description: 0.6,
            category: 0.5,
            overall: 0.58,
        };
        assert_eq!(describe_match(&combined, 0.5), "high title, description and category overlap");
        assert_eq!(describe_match(&combined, 0.58), "high title and description overlap");
        assert_eq!(describe_match(&combined, 0.65), "combined similarity 0.58 >= 0.65");
    }
}
