//! Shared types for contract risk consolidation: risk records, tier results,
//! comparison outcomes, debug traces, and run configuration.

pub mod analysis;
pub mod config;
pub mod error;
pub mod outcome;
pub mod risk;
pub mod tier;
pub mod trace;

pub use analysis::{
    ConsolidatedResult, DebugInformation, SeveritySummary, ThreeTierAnalysisResult, TierTimings,
};
pub use config::{ConsolidationConfig, ManualOverride, OverrideVerdict, Weights};
pub use error::ConfigError;
pub use outcome::{
    ComparisonDetails, Contribution, Decision, DuplicationDetection, RiskSourceRecord, Strategy,
};
pub use risk::{RawRisk, Risk, RiskOrigin, Severity, Tier};
pub use tier::{IndustryDetection, TierMetadata, TierResult};
pub use trace::{DebugTrace, TracePhase, TraceStep};
