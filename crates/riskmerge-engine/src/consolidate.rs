//! Three-tier consolidation.
//!
//! Template risks seed the result set. Industry risks, then general risks, are
//! each classified against the entries that existed before their tier began
//! and either folded into the matched entry or appended as new unique entries.
//! Caller-owned risks are never modified; merged entries are fresh values.

use std::collections::BTreeSet;

use riskmerge_core::{
    ConsolidationConfig, Contribution, Decision, Risk, RiskOrigin, RiskSourceRecord, Strategy,
    Tier,
};
use tracing::{debug, info, warn};

use crate::EngineError;
use crate::detector::{Candidate, scan};
use crate::trace::TraceBuilder;

/// Confidence assumed for a contributing risk that reports none.
pub const DEFAULT_RISK_CONFIDENCE: f64 = 0.5;

/// Separator placed before text appended from another tier.
pub const MERGE_SEPARATOR: &str = "\n\n";

/// Output of one consolidation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub risks: Vec<Risk>,
    /// Index-aligned with `risks`.
    pub sources: Vec<RiskSourceRecord>,
    /// Every classification, in processing order.
    pub decisions: Vec<Decision>,
    /// Per-entry confidence, index-aligned with `risks`.
    pub entry_confidence: Vec<f64>,
}

impl Consolidation {
    /// Mean per-entry confidence. Zero for an empty result.
    ///
    /// Each entry's confidence is the noisy-or of its contributors'
    /// confidences, so an extra corroborating source never lowers it.
    pub fn overall_confidence(&self) -> f64 {
        if self.entry_confidence.is_empty() {
            return 0.0;
        }
        self.entry_confidence.iter().sum::<f64>() / self.entry_confidence.len() as f64
    }
}

/// Validated consolidation settings for a run.
#[derive(Debug, Clone)]
pub struct Consolidator {
    config: ConsolidationConfig,
}

impl Consolidator {
    /// Validate `config`. Fails before any comparison work is done.
    pub fn new(config: &ConsolidationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        if !config.enable_manual_overrides && !config.overrides.is_empty() {
            warn!(
                count = config.overrides.len(),
                "manual overrides present but disabled; ignoring"
            );
        }
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Consolidate three tiers without recording a trace.
    pub fn run(&self, template: &[Risk], industry: &[Risk], general: &[Risk]) -> Consolidation {
        self.run_inner(template, industry, general, None)
    }

    /// Consolidate three tiers, recording comparison and merge steps.
    pub fn run_traced(
        &self,
        template: &[Risk],
        industry: &[Risk],
        general: &[Risk],
        trace: &mut TraceBuilder,
    ) -> Consolidation {
        self.run_inner(template, industry, general, Some(trace))
    }

    fn run_inner(
        &self,
        template: &[Risk],
        industry: &[Risk],
        general: &[Risk],
        mut trace: Option<&mut TraceBuilder>,
    ) -> Consolidation {
        let mut entries: Vec<Entry> = template
            .iter()
            .map(|r| Entry::seed(r.clone(), Tier::Template))
            .collect();
        let mut decisions: Vec<Decision> = Vec::new();

        for (tier, incoming) in [(Tier::Industry, industry), (Tier::General, general)] {
            if incoming.is_empty() {
                continue;
            }

            // Candidates are frozen at the start of the tier so risks from the
            // same tier are never compared with each other.
            let candidates: Vec<Candidate<'_>> = entries
                .iter()
                .map(|e| Candidate {
                    tier: e.seed_tier(),
                    risk: &e.risk,
                })
                .collect();
            let scans = scan(incoming, &candidates, &self.config, Some(tier));

            for s in scans {
                if let Some(t) = trace.as_deref_mut() {
                    t.comparison(tier, &s);
                }
                let d = s.detection;

                let position = match (d.is_duplicate, d.matched_index) {
                    (true, Some(index)) => {
                        entries[index].absorb(&d.general_risk, tier, d.similarity_score);
                        index
                    }
                    _ => {
                        entries.push(Entry::seed(d.general_risk.clone(), tier));
                        entries.len() - 1
                    }
                };

                let decision = Decision {
                    sequence: decisions.len(),
                    tier,
                    risk_id: d.general_risk.id,
                    risk_title: d.general_risk.title.clone(),
                    is_duplicate: d.is_duplicate,
                    similarity_score: d.similarity_score,
                    matched_position: d.matched_index,
                    matched_risk_id: d.template_risk.as_ref().map(|r| r.id),
                    position,
                    strategy: entries[position].strategy,
                    reason: d.reason,
                    comparison_details: d.comparison_details,
                    overridden: d.overridden,
                };
                debug!(
                    sequence = decision.sequence,
                    tier = %tier,
                    risk = decision.risk_id,
                    position,
                    strategy = decision.strategy.as_str(),
                    "consolidation decision"
                );
                if let Some(t) = trace.as_deref_mut() {
                    t.merge_decision(&decision, &entries[position].risk);
                }
                decisions.push(decision);
            }
        }

        let merged = entries.iter().filter(|e| e.strategy != Strategy::Unique).count();
        info!(
            template = template.len(),
            industry = industry.len(),
            general = general.len(),
            consolidated = entries.len(),
            merged,
            "consolidation complete"
        );

        let mut risks = Vec::with_capacity(entries.len());
        let mut sources = Vec::with_capacity(entries.len());
        let mut entry_confidence = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            entry_confidence.push(noisy_or(&entry.confidences));
            sources.push(RiskSourceRecord {
                position,
                risk_id: entry.risk.id,
                sources: entry.sources,
                strategy: entry.strategy,
                contributions: entry.contributions,
            });
            risks.push(entry.risk);
        }

        Consolidation {
            risks,
            sources,
            decisions,
            entry_confidence,
        }
    }
}

/// Consolidate three tiers under `config`.
///
/// Fails only when `config` is invalid.
pub fn consolidate(
    template: &[Risk],
    industry: &[Risk],
    general: &[Risk],
    config: &ConsolidationConfig,
) -> Result<Consolidation, EngineError> {
    Ok(Consolidator::new(config)?.run(template, industry, general))
}

/// A result-set entry under construction.
struct Entry {
    risk: Risk,
    sources: Vec<Tier>,
    strategy: Strategy,
    contributions: Vec<Contribution>,
    confidences: Vec<f64>,
}

impl Entry {
    fn seed(risk: Risk, tier: Tier) -> Self {
        let confidence = risk.confidence.unwrap_or(DEFAULT_RISK_CONFIDENCE);
        Self {
            contributions: vec![Contribution {
                tier,
                risk_id: risk.id,
            }],
            sources: vec![tier],
            strategy: Strategy::Unique,
            confidences: vec![confidence],
            risk,
        }
    }

    /// The tier whose risk founded this entry.
    fn seed_tier(&self) -> Tier {
        self.contributions
            .first()
            .map_or(Tier::Template, |c| c.tier)
    }

    /// Fold a duplicate into this entry.
    ///
    /// Title, category and severity stay as they are. Description and
    /// recommendation gain any sentences of the incoming risk they lack.
    fn absorb(&mut self, incoming: &Risk, tier: Tier, score: f64) {
        self.strategy = if self.sources.len() > 1 {
            Strategy::Enhanced
        } else {
            Strategy::Merged
        };
        if !self.sources.contains(&tier) {
            self.sources.push(tier);
        }
        self.contributions.push(Contribution {
            tier,
            risk_id: incoming.id,
        });
        self.confidences
            .push(incoming.confidence.unwrap_or(DEFAULT_RISK_CONFIDENCE));

        self.risk.description = append_novel(&self.risk.description, &incoming.description, tier);
        self.risk.recommendation =
            append_novel(&self.risk.recommendation, &incoming.recommendation, tier);
        self.risk.source = Some(RiskOrigin::Hybrid);
        self.risk.confidence = Some(noisy_or(&self.confidences));
        self.risk.processing_notes.push(format!(
            "absorbed {tier} risk #{} {:?} (similarity {score:.2})",
            incoming.id, incoming.title
        ));
    }
}

/// Append the sentences of `incoming` not already present in `existing`.
///
/// Sentences are compared whole, ignoring case, whitespace and any `[tier]`
/// tag left by an earlier merge; a fragment of an existing sentence is still
/// new. Added text goes after [`MERGE_SEPARATOR`] and a `[tier]` tag, or just
/// the tag when `existing` is blank. Existing prose is never rewritten.
pub fn append_novel(existing: &str, incoming: &str, tier: Tier) -> String {
    let mut known: BTreeSet<String> = sentences(existing).into_iter().map(sentence_key).collect();
    let mut fresh: Vec<&str> = Vec::new();
    for sentence in sentences(incoming) {
        if known.insert(sentence_key(sentence)) {
            fresh.push(sentence);
        }
    }

    if fresh.is_empty() {
        return existing.to_string();
    }
    let addition = format!("[{tier}] {}.", fresh.join(". "));
    if existing.trim().is_empty() {
        addition
    } else {
        format!("{existing}{MERGE_SEPARATOR}{addition}")
    }
}

/// Split on line breaks and on `.`, `!`, `?` or `;` followed by whitespace or
/// the end of the text, so decimals like `1.5%` stay whole. An abbreviation
/// followed by a space (`U.S. law`) still ends a sentence.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' | ';' => chars.peek().is_none_or(|&(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            out.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    out.push(&text[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect()
}

/// Lowercased, whitespace-collapsed sentence without a leading `[tier]` tag.
fn sentence_key(sentence: &str) -> String {
    let squashed = squash(sentence);
    for tier in Tier::ALL {
        if let Some(rest) = squashed.strip_prefix(&format!("[{tier}] ")) {
            return rest.to_string();
        }
    }
    squashed
}

/// Lowercase with whitespace runs collapsed.
fn squash(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1 - Π(1 - cᵢ)`: the chance at least one contributor is right.
fn noisy_or(confidences: &[f64]) -> f64 {
    let miss: f64 = confidences
        .iter()
        .map(|c| 1.0 - c.clamp(0.0, 1.0))
        .product();
    (1.0 - miss).clamp(0.0, 1.0)
}
