//! Field-weighted similarity between two risk records.

use riskmerge_core::{ComparisonDetails, ConsolidationConfig, Risk};

use crate::aliases::category_similarity;
use crate::tokenize::{normalize_label, overlap_coefficient, tokenize};

/// Score two risks field by field and combine with the configured weights.
///
/// `overall = Σ wᵢ·sᵢ / Σ wᵢ`. Negative or non-finite weights count as zero,
/// and if no weight is positive the overall score is zero. Never fails:
/// empty fields simply score zero. Symmetric in `a` and `b`.
pub fn score(a: &Risk, b: &Risk, config: &ConsolidationConfig) -> ComparisonDetails {
    let title = clamp_unit(text_similarity(&a.title, &b.title));
    let description = clamp_unit(text_similarity(&a.description, &b.description));
    let category = clamp_unit(category_similarity(&a.category, &b.category));

    let tw = usable_weight(config.title_weight);
    let dw = usable_weight(config.description_weight);
    let cw = usable_weight(config.category_weight);
    let total = tw + dw + cw;

    let overall = if total > 0.0 && total.is_finite() {
        clamp_unit((tw * title + dw * description + cw * category) / total)
    } else {
        0.0
    };

    ComparisonDetails {
        title,
        description,
        category,
        overall,
    }
}

/// Token-set overlap of two free texts.
///
/// Identical texts (after label normalisation) score 1.0 even when they
/// tokenise to nothing useful.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let na = normalize_label(a);
    let nb = normalize_label(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }
    overlap_coefficient(&tokenize(a), &tokenize(b))
}

fn usable_weight(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}
