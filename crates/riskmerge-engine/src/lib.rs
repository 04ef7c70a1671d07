//! Risk consolidation engine: similarity scoring, duplicate detection, and
//! three-tier merging with a full decision trail.

pub mod aliases;
pub mod analyzer;
pub mod consolidate;
pub mod detector;
mod error;
pub mod similarity;
pub mod tokenize;
pub mod trace;

pub use analyzer::ThreeTierAnalyzer;
pub use consolidate::{Consolidation, Consolidator, consolidate};
pub use detector::{Candidate, Scan, detect, scan};
pub use error::EngineError;
pub use similarity::score;
pub use trace::TraceBuilder;
