//! Identity resolution
//!
//! Best-effort disambiguation of provider author candidates using name
//! similarity, affiliation overlap, citation volume and, when known, an
//! expected h-index. This is a heuristic: two people with the same name at
//! the same institute will still collide.

use crate::gateway::AuthorCandidate;
use crate::text::{affiliation_matches, name_similarity};

/// Hints known about the person being resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityHints {
    pub institute: Option<String>,
    pub expected_h_index: Option<i32>,
}

impl IdentityHints {
    pub fn institute(institute: impl Into<String>) -> Self {
        Self {
            institute: Some(institute.into()),
            expected_h_index: None,
        }
    }

    pub fn with_h_index(mut self, h_index: Option<i32>) -> Self {
        self.expected_h_index = h_index;
        self
    }
}

/// A candidate with its resolver score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub candidate: AuthorCandidate,
    pub score: f64,
}

/// Scoring knobs for candidate selection
#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver {
    /// Candidates below this name similarity are discarded
    pub min_similarity: f64,
    /// Added when the affiliation contains the hint institute (or vice versa)
    pub affiliation_bonus: f64,
    /// Cap of the log-scaled citation tie-breaker
    pub citation_bonus_cap: f64,
    /// Accepted distance from the expected h-index
    pub h_index_tolerance: i32,
    /// Minimum final score for a match
    pub accept_threshold: f64,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            affiliation_bonus: 0.3,
            citation_bonus_cap: 0.1,
            h_index_tolerance: 5,
            accept_threshold: 0.5,
        }
    }
}

impl IdentityResolver {
    /// Score one candidate, `None` when it falls below the similarity floor.
    pub fn score(&self, query: &str, hints: &IdentityHints, candidate: &AuthorCandidate) -> Option<f64> {
        let similarity = name_similarity(query, &candidate.name);
        if similarity < self.min_similarity {
            return None;
        }

        let mut score = similarity;
        if let Some(hint) = hints.institute.as_deref() {
            if candidate.affiliations.iter().any(|a| affiliation_matches(a, hint)) {
                score += self.affiliation_bonus;
            }
        }
        if let Some(cites) = candidate.citation_count.filter(|c| *c > 0) {
            score += ((cites as f64).log10() / 60.0).clamp(0.0, self.citation_bonus_cap);
        }
        Some(score)
    }

    /// Rank candidates best-first; only acceptable matches are returned.
    pub fn rank(
        &self,
        query: &str,
        hints: &IdentityHints,
        candidates: Vec<AuthorCandidate>,
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter_map(|candidate| {
                self.score(query, hints, &candidate)
                    .filter(|s| *s >= self.accept_threshold)
                    .map(|score| RankedCandidate { candidate, score })
            })
            .collect();

        match hints.expected_h_index {
            Some(expected) => {
                let within: Vec<RankedCandidate> = ranked
                    .iter()
                    .filter(|r| {
                        r.candidate
                            .h_index
                            .is_some_and(|h| (h - expected).abs() <= self.h_index_tolerance)
                    })
                    .cloned()
                    .collect();
                if !within.is_empty() {
                    ranked = within;
                } else if ranked.iter().any(|r| r.candidate.h_index.is_some()) {
                    ranked.retain(|r| r.candidate.h_index.is_some());
                }
                ranked.sort_by(|a, b| {
                    h_distance(a, expected)
                        .cmp(&h_distance(b, expected))
                        .then(b.score.total_cmp(&a.score))
                        .then(b.candidate.h_index.cmp(&a.candidate.h_index))
                });
            }
            None => {
                ranked.sort_by(|a, b| {
                    b.score
                        .total_cmp(&a.score)
                        .then(b.candidate.h_index.cmp(&a.candidate.h_index))
                });
            }
        }
        ranked
    }

    /// Best acceptable candidate, or no match.
    pub fn select(
        &self,
        query: &str,
        hints: &IdentityHints,
        candidates: Vec<AuthorCandidate>,
    ) -> Option<RankedCandidate> {
        self.rank(query, hints, candidates).into_iter().next()
    }
}

fn h_distance(r: &RankedCandidate, expected: i32) -> i32 {
    r.candidate
        .h_index
        .map(|h| (h - expected).abs())
        .unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str, h: Option<i32>) -> AuthorCandidate {
        AuthorCandidate {
            author_id: id.into(),
            name: name.into(),
            h_index: h,
            ..Default::default()
        }
    }

    #[test]
    fn test_expected_h_index_picks_closest_higher_on_tie() {
        let resolver = IdentityResolver::default();
        let candidates = [15, 118, 122, 200, 60]
            .iter()
            .enumerate()
            .map(|(i, h)| candidate(&i.to_string(), "Feng Zhang", Some(*h)))
            .collect();
        let hints = IdentityHints::default().with_h_index(Some(120));
        let best = resolver.select("Feng Zhang", &hints, candidates).unwrap();
        assert_eq!(best.candidate.h_index, Some(122));
    }

    #[test]
    fn test_h_index_filter_relaxes_to_closest() {
        let resolver = IdentityResolver::default();
        let candidates = vec![
            candidate("a", "Feng Zhang", Some(15)),
            candidate("b", "Feng Zhang", Some(90)),
            candidate("c", "Feng Zhang", None),
        ];
        let hints = IdentityHints::default().with_h_index(Some(120));
        let ranked = resolver.rank("Feng Zhang", &hints, candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].candidate.author_id, "b");
    }

    #[test]
    fn test_affiliation_bonus_breaks_name_tie() {
        let resolver = IdentityResolver::default();
        let mut mit = candidate("mit", "Jane Doe", Some(20));
        mit.affiliations = vec!["Massachusetts Institute of Technology".into()];
        let mut eth = candidate("eth", "Jane Doe", Some(30));
        eth.affiliations = vec!["ETH Zurich".into()];
        let hints = IdentityHints::institute("ETH Zurich");
        let best = resolver.select("Doe, Jane", &hints, vec![mit, eth]).unwrap();
        assert_eq!(best.candidate.author_id, "eth");
        assert!(best.score > 1.2);
    }

    #[test]
    fn test_citation_bonus_is_capped() {
        let resolver = IdentityResolver::default();
        let mut famous = candidate("x", "Jane Doe", None);
        famous.citation_count = Some(10_i64.pow(9));
        let score = resolver.score("Jane Doe", &IdentityHints::default(), &famous).unwrap();
        assert!((score - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_dissimilar_names_yield_no_match() {
        let resolver = IdentityResolver::default();
        let candidates = vec![candidate("z", "Xiaowei Zhuang", Some(100))];
        assert!(resolver
            .select("George Church", &IdentityHints::default(), candidates)
            .is_none());
        assert!(resolver.select("George Church", &IdentityHints::default(), vec![]).is_none());
    }
}
