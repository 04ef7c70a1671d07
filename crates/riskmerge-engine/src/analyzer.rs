//! Assemble a [`ThreeTierAnalysisResult`] from three raw tier results.

use std::time::Instant;

use riskmerge_core::{
    ConsolidatedResult, ConsolidationConfig, DebugInformation, SeveritySummary,
    ThreeTierAnalysisResult, Tier, TierResult, TierTimings,
};
use tracing::info;

use crate::EngineError;
use crate::consolidate::Consolidator;
use crate::trace::TraceBuilder;

/// Runs parse → consolidate → report for one request.
pub struct ThreeTierAnalyzer {
    consolidator: Consolidator,
}

impl ThreeTierAnalyzer {
    pub fn new(config: &ConsolidationConfig) -> Result<Self, EngineError> {
        Ok(Self {
            consolidator: Consolidator::new(config)?,
        })
    }

    pub fn analyze(
        &self,
        template: TierResult,
        industry: TierResult,
        general: TierResult,
    ) -> ThreeTierAnalysisResult {
        self.analyze_with_trace(template, industry, general, TraceBuilder::new())
    }

    /// Like [`analyze`](Self::analyze) with a caller-provided trace builder.
    pub fn analyze_with_trace(
        &self,
        template: TierResult,
        industry: TierResult,
        general: TierResult,
        mut trace: TraceBuilder,
    ) -> ThreeTierAnalysisResult {
        let template_risks = template.parse_risks();
        trace.tier_parse(Tier::Template, &template, &template_risks);
        let industry_risks = industry.parse_risks();
        trace.tier_parse(Tier::Industry, &industry, &industry_risks);
        let general_risks = general.parse_risks();
        trace.tier_parse(Tier::General, &general, &general_risks);

        let start = Instant::now();
        let consolidation = self.consolidator.run_traced(
            &template_risks,
            &industry_risks,
            &general_risks,
            &mut trace,
        );
        let consolidation_ms = start.elapsed().as_millis() as u64;

        let overall_confidence = consolidation.overall_confidence();
        let summary = SeveritySummary::from_run(&consolidation.risks, &consolidation.decisions);
        trace.summary(&summary, overall_confidence);

        info!(
            total = summary.total,
            high = summary.high,
            duplicates = summary.duplicates,
            overall_confidence,
            consolidation_ms,
            "three-tier analysis complete"
        );

        let tier_timings = TierTimings {
            template_ms: template.processing_time_ms,
            industry_ms: industry.processing_time_ms,
            general_ms: general.processing_time_ms,
            consolidation_ms,
        };
        let industry_detection = industry.metadata.industry.clone();

        ThreeTierAnalysisResult {
            template,
            industry,
            general,
            consolidated_result: ConsolidatedResult {
                risks: consolidation.risks,
                sources: consolidation.sources,
                overall_confidence,
                summary,
            },
            debug_information: DebugInformation {
                tier_timings,
                industry_detection,
                decisions: consolidation.decisions,
                trace: trace.finish(),
            },
        }
    }
}
