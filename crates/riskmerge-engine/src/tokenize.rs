//! Word tokenisation for risk text.
//!
//! Text is lowercased, split on every non-alphanumeric character, stripped of
//! English function words, lightly stemmed, and stripped of filler words that
//! appear in almost every risk title ("risk", "clause", "terms", ...). The
//! result is a set: repeated words count once.
//!
//! If filtering would leave nothing (a title like "The Risk"), the stemmed but
//! unfiltered tokens are used instead so that short texts still compare.

use std::collections::BTreeSet;

/// Function words dropped before stemming.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "nor", "of", "in", "on", "at", "to", "for", "by", "with",
    "from", "as", "is", "are", "be", "been", "being", "was", "were", "which", "who", "whom",
    "that", "this", "these", "those", "it", "its", "after", "before", "into", "onto", "than",
    "then", "there", "their", "they", "them", "will", "shall", "may", "can", "could", "would",
    "should", "any", "all", "such", "upon", "per", "if", "so", "but", "has", "have", "had",
];

/// Stems too common in risk findings to say anything about the underlying issue.
pub const FILLER_STEMS: &[&str] = &[
    "risk", "term", "clause", "provision", "issue", "concern", "potential",
];

/// Tokenise `text` into a set of normalised word stems.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let filtered: BTreeSet<String> = words
        .iter()
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| stem(w))
        .filter(|s| !FILLER_STEMS.contains(&s.as_str()))
        .collect();

    if filtered.is_empty() {
        words.iter().map(|w| stem(w)).collect()
    } else {
        filtered
    }
}

/// Strip common English inflections.
///
/// Deliberately crude: "liabilities" → "liability", "days" → "day",
/// "delayed" → "delay", "binding" → "bind". Both sides of every comparison go
/// through the same rules, so consistency matters more than linguistics.
pub fn stem(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let ends_with = |suffix: &str| word.ends_with(suffix);

    let mut stem: String = if n > 4 && ends_with("ies") {
        let mut s: String = chars[..n - 3].iter().collect();
        s.push('y');
        s
    } else if n > 3 && ends_with("s") && !ends_with("ss") && !ends_with("us") && !ends_with("is") {
        chars[..n - 1].iter().collect()
    } else {
        word.to_string()
    };

    let len = stem.chars().count();
    if len > 4 && stem.ends_with("ed") {
        stem.truncate(stem.len() - 2);
    } else if len > 5 && stem.ends_with("ing") {
        stem.truncate(stem.len() - 3);
    }
    stem
}

/// Lowercase, collapse non-alphanumeric runs to single spaces, trim.
///
/// "Payment-Terms " and "payment terms" normalise to the same label.
pub fn normalize_label(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Szymkiewicz–Simpson overlap: `|A ∩ B| / min(|A|, |B|)`.
///
/// Symmetric, in [0, 1], and insensitive to one text being much longer than
/// the other. Zero if either set is empty.
pub fn overlap_coefficient(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / smaller as f64
}
