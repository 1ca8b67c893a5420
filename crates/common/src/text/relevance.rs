//! Keyword relevance scoring
//!
//! Exact substring hits score 1.0; otherwise the best edit ratio between a
//! term and any window of the text slightly longer than the term.

use super::normalize::similarity_ratio;
use std::collections::{BTreeMap, HashSet};

/// Characters added to each window so partial matches can still align.
const WINDOW_SLACK: usize = 5;

/// Scores free text against a field keyword table.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    terms: Vec<String>,
    threshold: f64,
}

impl RelevanceFilter {
    /// Build from keywords plus a synonym table; terms are lowercased and deduplicated.
    pub fn new(
        keywords: &[String],
        synonyms: &BTreeMap<String, Vec<String>>,
        threshold: f64,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();
        let expanded = keywords
            .iter()
            .chain(synonyms.values().flatten());
        for term in expanded {
            let lower = term.trim().to_lowercase();
            if !lower.is_empty() && seen.insert(lower.clone()) {
                terms.push(lower);
            }
        }
        Self { terms, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Relevance of `text` in [0, 1].
    pub fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let lower = text.to_lowercase();
        if self.terms.iter().any(|t| lower.contains(t.as_str())) {
            return 1.0;
        }

        let chars: Vec<char> = lower.chars().collect();
        let mut best = 0.0_f64;
        for term in &self.terms {
            best = best.max(best_window_ratio(term, &chars));
        }
        best
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        self.score(text) >= self.threshold
    }
}

fn best_window_ratio(term: &str, text: &[char]) -> f64 {
    let term_len = term.chars().count();
    let starts = text.len().saturating_sub(term_len) + 1;
    let mut best = 0.0_f64;
    let mut window = String::with_capacity(term.len() + WINDOW_SLACK * 4);
    for start in 0..starts.max(1) {
        let end = (start + term_len + WINDOW_SLACK).min(text.len());
        if start >= end {
            break;
        }
        window.clear();
        window.extend(&text[start..end]);
        best = best.max(similarity_ratio(term, &window));
    }
    best
}
