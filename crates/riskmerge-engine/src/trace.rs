//! Accumulates per-step records of a consolidation run into a [`DebugTrace`].
//!
//! Timestamps come from the builder's clock and live only in the trace. They
//! never flow back into decisions.

use chrono::{DateTime, Utc};
use riskmerge_core::{
    Decision, DebugTrace, Risk, SeveritySummary, Tier, TierResult, TracePhase, TraceStep,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::detector::Scan;

pub type Clock = fn() -> DateTime<Utc>;

pub struct TraceBuilder {
    clock: Clock,
    started_at: DateTime<Utc>,
    steps: Vec<TraceStep>,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceBuilder {
    /// A builder stamping steps with the current UTC time.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// A builder with a caller-supplied clock, e.g. a fixed instant for
    /// reproducible traces.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            started_at: clock(),
            steps: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a raw step.
    pub fn record(&mut self, phase: TracePhase, tier: Option<Tier>, input: Value, output: Value) {
        let step = TraceStep {
            sequence: self.steps.len(),
            phase,
            tier,
            recorded_at: (self.clock)(),
            input,
            output,
        };
        self.steps.push(step);
    }

    /// Raw tier records were coerced into `parsed`.
    pub fn tier_parse(&mut self, tier: Tier, raw: &TierResult, parsed: &[Risk]) {
        let notes: Vec<Value> = parsed
            .iter()
            .filter(|r| !r.processing_notes.is_empty())
            .map(|r| json!({ "id": r.id, "notes": r.processing_notes }))
            .collect();
        self.record(
            TracePhase::TierParse,
            Some(tier),
            json!({
                "records": raw.risks.len(),
                "processingTimeMs": raw.processing_time_ms,
                "metadata": to_value(&raw.metadata),
            }),
            json!({
                "risks": parsed.len(),
                "malformed": notes.len(),
                "notes": notes,
            }),
        );
    }

    /// One incoming risk was scored against every candidate.
    pub fn comparison(&mut self, tier: Tier, scan: &Scan) {
        let d = &scan.detection;
        self.record(
            TracePhase::Comparison,
            Some(tier),
            json!({
                "riskId": d.general_risk.id,
                "title": d.general_risk.title,
                "candidates": scan.candidate_scores.len(),
            }),
            json!({
                "candidateScores": scan.candidate_scores,
                "matchedIndex": d.matched_index,
                "matchedRiskId": d.template_risk.as_ref().map(|r| r.id),
                "similarityScore": d.similarity_score,
                "isDuplicate": d.is_duplicate,
                "reason": d.reason,
                "comparisonDetails": to_value(&d.comparison_details),
                "overridden": d.overridden,
            }),
        );
    }

    /// A merge or append was applied.
    pub fn merge_decision(&mut self, decision: &Decision, merged: &Risk) {
        self.record(
            TracePhase::MergeDecision,
            Some(decision.tier),
            to_value(decision),
            json!({
                "position": decision.position,
                "strategy": decision.strategy.as_str(),
                "risk": to_value(merged),
            }),
        );
    }

    /// Totals for the finished run.
    pub fn summary(&mut self, summary: &SeveritySummary, overall_confidence: f64) {
        self.record(
            TracePhase::Summary,
            None,
            Value::Null,
            json!({
                "summary": to_value(summary),
                "overallConfidence": overall_confidence,
            }),
        );
    }

    pub fn finish(self) -> DebugTrace {
        DebugTrace {
            started_at: self.started_at,
            finished_at: (self.clock)(),
            steps: self.steps,
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::detector::Candidate;
    use riskmerge_core::{ConsolidationConfig, Severity};

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn steps_are_sequenced_and_stamped() {
        let mut trace = TraceBuilder::with_clock(fixed_clock);
        trace.record(TracePhase::TierParse, Some(Tier::Template), Value::Null, Value::Null);
        trace.record(TracePhase::Summary, None, Value::Null, Value::Null);
        assert_eq!(trace.len(), 2);

        let done = trace.finish();
        assert_eq!(done.started_at, fixed_clock());
        assert_eq!(done.finished_at, fixed_clock());
        let seqs: Vec<usize> = done.steps.iter().map(|s| s.sequence).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert!(done.steps.iter().all(|s| s.recorded_at == fixed_clock()));
    }

    #[test]
    fn tier_parse_reports_malformed_records() {
        let raw: TierResult =
            serde_json::from_str(r#"{"risks": [{"id": 1, "title": "a", "category": "b", "severity": "low"}, {"id": 2}]}"#)
                .unwrap();
        let parsed = raw.parse_risks();
        let mut trace = TraceBuilder::with_clock(fixed_clock);
        trace.tier_parse(Tier::Industry, &raw, &parsed);

        let done = trace.finish();
        let step = &done.steps[0];
        assert_eq!(step.phase, TracePhase::TierParse);
        assert_eq!(step.tier, Some(Tier::Industry));
        assert_eq!(step.input["records"], 2);
        assert_eq!(step.output["malformed"], 1);
        assert_eq!(step.output["notes"][0]["id"], 2);
    }

    #[test]
    fn comparison_step_carries_candidate_scores() {
        let template = vec![Risk::new(1, "Payment Terms", "Net 60", "Payment", Severity::Low)];
        let general = vec![Risk::new(4, "Payment Terms", "Net 60", "Payment", Severity::Low)];
        let candidates = Candidate::all(Tier::Template, &template);
        let scans = crate::detector::scan(&general, &candidates, &ConsolidationConfig::default(), None);

        let mut trace = TraceBuilder::with_clock(fixed_clock);
        trace.comparison(Tier::General, &scans[0]);
        let done = trace.finish();
        let out = &done.steps[0].output;
        assert_eq!(out["candidateScores"][0], 1.0);
        assert_eq!(out["isDuplicate"], true);
        assert_eq!(out["matchedRiskId"], 1);
    }

    #[test]
    fn phase_filter() {
        let mut trace = TraceBuilder::with_clock(fixed_clock);
        trace.record(TracePhase::Comparison, Some(Tier::General), Value::Null, Value::Null);
        trace.record(TracePhase::MergeDecision, Some(Tier::General), Value::Null, Value::Null);
        trace.record(TracePhase::Comparison, Some(Tier::General), Value::Null, Value::Null);
        let done = trace.finish();
        assert_eq!(done.phase(TracePhase::Comparison).count(), 2);
    }
}
