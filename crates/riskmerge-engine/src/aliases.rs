//! Category alias table.
//!
//! Categories are an open vocabulary, but tiers keep reaching for a handful of
//! near-synonyms ("Payment", "Payment Terms", "Compensation"). Labels in the
//! same group earn partial credit when compared. Entries are stored already
//! normalised (see [`normalize_label`]) and no label appears in two groups.

use crate::tokenize::normalize_label;

/// Score for two different labels in the same alias group.
pub const CATEGORY_ALIAS_CREDIT: f64 = 0.5;

pub const CATEGORY_ALIASES: &[&[&str]] = &[
    &[
        "payment",
        "payments",
        "payment terms",
        "compensation",
        "fees",
        "pricing",
        "invoicing",
        "billing",
    ],
    &[
        "termination",
        "term and termination",
        "contract term",
        "renewal",
        "duration",
        "expiry",
    ],
    &[
        "liability",
        "limitation of liability",
        "indemnification",
        "indemnity",
        "damages",
    ],
    &[
        "confidentiality",
        "non disclosure",
        "nda",
        "privacy",
        "data protection",
    ],
    &[
        "intellectual property",
        "ip",
        "ip rights",
        "ownership",
        "licensing",
        "license",
    ],
    &[
        "dispute resolution",
        "governing law",
        "jurisdiction",
        "arbitration",
    ],
    &["compliance", "regulatory", "legal compliance", "regulation"],
    &[
        "non compete",
        "restrictive covenants",
        "non solicitation",
        "exclusivity",
    ],
    &[
        "warranty",
        "warranties",
        "representations",
        "representations and warranties",
    ],
    &[
        "service levels",
        "sla",
        "service level agreement",
        "performance",
    ],
    &["insurance", "coverage"],
];

/// Index of the alias group containing an already normalised label.
pub fn alias_group(normalized: &str) -> Option<usize> {
    CATEGORY_ALIASES
        .iter()
        .position(|group| group.contains(&normalized))
}

/// Category similarity: 1.0 on a normalised exact match, alias credit within
/// a group, 0.0 otherwise or when either label is empty.
pub fn category_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_label(a);
    let b = normalize_label(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    match (alias_group(&a), alias_group(&b)) {
        (Some(ga), Some(gb)) if ga == gb => CATEGORY_ALIAS_CREDIT,
        _ => 0.0,
    }
}
