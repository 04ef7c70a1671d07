//! Plain-text report rendering for consolidation results.
//!
//! Renders into a `String` so the layout can be checked without capturing
//! stdout.

use std::fmt::Write;

use riskmerge_core::{
    Decision, DuplicationDetection, Risk, RiskSourceRecord, ThreeTierAnalysisResult, Tier,
};

const MAX_TEXT_CHARS: usize = 160;

// ── Public API ──

pub fn print_report(result: &ThreeTierAnalysisResult) {
    print!("{}", render_report(result));
}

pub fn print_detection(candidate: &Risk, detection: &DuplicationDetection, threshold: f64) {
    print!("{}", render_detection(candidate, detection, threshold));
}

/// The full consolidation report: inputs, risk cards, decisions, summary.
pub fn render_report(result: &ThreeTierAnalysisResult) -> String {
    let mut out = String::new();
    let consolidated = &result.consolidated_result;
    let debug = &result.debug_information;

    let _ = writeln!(out, "=== Consolidated risks ===");
    let _ = writeln!(
        out,
        "{} risks from {} template, {} industry, {} general",
        consolidated.risks.len(),
        result.template.risks.len(),
        result.industry.risks.len(),
        result.general.risks.len()
    );
    if let Some(detected) = &debug.industry_detection {
        let _ = writeln!(
            out,
            "industry: {} ({:.0}%)",
            detected.industry,
            detected.confidence * 100.0
        );
    }
    let _ = writeln!(out);

    for (risk, source) in consolidated.risks.iter().zip(&consolidated.sources) {
        render_risk(&mut out, risk, source);
    }

    if !debug.decisions.is_empty() {
        let _ = writeln!(out, "Decisions");
        for decision in &debug.decisions {
            render_decision(&mut out, decision);
        }
        let _ = writeln!(out);
    }

    let s = &consolidated.summary;
    let _ = writeln!(out, "Summary");
    row(&mut out, "total", s.total);
    row(&mut out, "high / medium / low", format!("{} / {} / {}", s.high, s.medium, s.low));
    row(
        &mut out,
        "duplicates",
        format!("{} of {} ({:.0}%)", s.duplicates, s.incoming, s.duplicate_rate * 100.0),
    );
    row(
        &mut out,
        "overall confidence",
        format!("{:.2}", consolidated.overall_confidence),
    );
    let t = &debug.tier_timings;
    row(
        &mut out,
        "timings (ms)",
        format!(
            "template {} · industry {} · general {} · consolidation {}",
            t.template_ms, t.industry_ms, t.general_ms, t.consolidation_ms
        ),
    );
    out
}

/// One pairwise comparison.
pub fn render_detection(candidate: &Risk, d: &DuplicationDetection, threshold: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== #{} {} vs #{} {} ===",
        d.general_risk.id, d.general_risk.title, candidate.id, candidate.title
    );
    let c = &d.comparison_details;
    row(&mut out, "title", format!("{:.2}", c.title));
    row(&mut out, "description", format!("{:.2}", c.description));
    row(&mut out, "category", format!("{:.2}", c.category));
    row(&mut out, "overall", format!("{:.2}", c.overall));
    row(&mut out, "threshold", format!("{threshold:.2}"));
    row(&mut out, "duplicate", if d.is_duplicate { "yes" } else { "no" });
    row(&mut out, "reason", &d.reason);
    out
}

// ── Sections ──

fn render_risk(out: &mut String, risk: &Risk, source: &RiskSourceRecord) {
    let _ = writeln!(
        out,
        "[{}] #{} {} ({})",
        source.position + 1,
        risk.id,
        risk.title,
        risk.severity.as_str()
    );
    row(out, "category", &risk.category);
    row(out, "sources", tier_list(&source.sources));
    row(out, "strategy", source.strategy.as_str());
    if source.contributions.len() > 1 {
        let ids: Vec<String> = source
            .contributions
            .iter()
            .map(|c| format!("{}#{}", c.tier, c.risk_id))
            .collect();
        row(out, "contributions", ids.join(", "));
    }
    if let Some(confidence) = risk.confidence {
        row(out, "confidence", format!("{confidence:.2}"));
    }
    if !risk.description.is_empty() {
        row(out, "description", truncate(&risk.description));
    }
    if !risk.recommendation.is_empty() {
        row(out, "recommendation", truncate(&risk.recommendation));
    }
    for note in &risk.processing_notes {
        row(out, "note", note);
    }
    let _ = writeln!(out);
}

fn render_decision(out: &mut String, d: &Decision) {
    let verdict = if d.is_duplicate {
        match d.matched_risk_id {
            Some(id) => format!("merged into #{id}"),
            None => "merged".to_string(),
        }
    } else {
        "kept".to_string()
    };
    let flag = if d.overridden { " [override]" } else { "" };
    let _ = writeln!(
        out,
        "  {:>3}. {:<8} #{:<5} {:<30} {:.2}  {}{} ({})",
        d.sequence + 1,
        d.tier.as_str(),
        d.risk_id,
        truncate_to(&d.risk_title, 30),
        d.similarity_score,
        verdict,
        flag,
        d.reason
    );
}

// ── Formatting helpers ──

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {:<26} {}", label, value);
}

fn tier_list(tiers: &[Tier]) -> String {
    tiers.iter().map(Tier::as_str).collect::<Vec<_>>().join(" + ")
}

/// First line only, capped at [`MAX_TEXT_CHARS`].
fn truncate(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    let mut s = truncate_to(first, MAX_TEXT_CHARS);
    if first.len() < text.trim_end().len() && !s.ends_with('…') {
        s.push_str(" …");
    }
    s
}

fn truncate_to(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max.saturating_sub(1)).collect();
    s.push('…');
    s
}
