//! Name and affiliation normalization plus the edit-distance ratio shared by
//! identity resolution and relevance filtering.

use similar::TextDiff;
use unicode_normalization::UnicodeNormalization;

/// Strip combining marks after canonical decomposition ("Müller" -> "Muller").
pub fn fold_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Canonical form of a person name for comparison.
///
/// Lowercases, folds accents, turns "Last, First" into "First Last", drops
/// periods and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    let folded = fold_accents(name.trim()).to_lowercase();
    let reordered = match folded.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => folded,
    };
    reordered
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last token of the normalized name; empty when the name has no letters.
pub fn surname_key(name: &str) -> String {
    normalize_name(name)
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_string()
}

/// Canonical form of an institute for natural-key and substring comparison.
pub fn normalize_institute(institute: &str) -> String {
    fold_accents(institute.trim())
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2 * matches / total_len` over a character diff; 1.0 for two empty strings.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Similarity of two person names after normalization.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    similarity_ratio(&normalize_name(a), &normalize_name(b))
}

/// True if one affiliation contains the other after normalization.
pub fn affiliation_matches(affiliation: &str, hint: &str) -> bool {
    let a = normalize_institute(affiliation);
    let h = normalize_institute(hint);
    if a.is_empty() || h.is_empty() {
        return false;
    }
    a.contains(&h) || h.contains(&a)
}

/// Institutes are compatible when equal after normalization or when either is unknown.
pub fn institutes_compatible(a: &str, b: &str) -> bool {
    let a = normalize_institute(a);
    let b = normalize_institute(b);
    a.is_empty() || b.is_empty() || a == b
}

/// Same surname and given names that agree on every shared position, where
/// an initial agrees with any name starting with it.
///
/// "J. Smith" ~ "John Smith", "John A. Smith" ~ "John Smith", but
/// "Jane Doe" !~ "John Roe" even though their edit ratio is above 0.5.
pub fn names_compatible(a: &str, b: &str) -> bool {
    let a = normalize_name(a);
    let b = normalize_name(b);
    let ta: Vec<&str> = a.split_whitespace().collect();
    let tb: Vec<&str> = b.split_whitespace().collect();
    let (Some((last_a, given_a)), Some((last_b, given_b))) = (ta.split_last(), tb.split_last()) else {
        return false;
    };
    if last_a != last_b {
        return false;
    }
    given_a
        .iter()
        .zip(given_b.iter())
        .all(|(x, y)| given_name_agrees(x, y))
}

fn given_name_agrees(x: &str, y: &str) -> bool {
    if x == y {
        return true;
    }
    let (short, long) = if x.len() <= y.len() { (x, y) } else { (y, x) };
    short.chars().count() == 1 && long.starts_with(short)
}

/// Pick the institute segment out of a free-text affiliation.
///
/// Returns the first comma-separated segment containing one of `hint_words`,
/// otherwise the whole affiliation truncated to 120 characters.
pub fn extract_institute(affiliation: &str, hint_words: &[String]) -> String {
    let affiliation = affiliation.trim();
    if affiliation.is_empty() {
        return String::new();
    }
    for part in affiliation.split(',').map(str::trim) {
        let lower = part.to_lowercase();
        if hint_words.iter().any(|w| lower.contains(w.as_str())) {
            return part.to_string();
        }
    }
    affiliation.chars().take(120).collect()
}
