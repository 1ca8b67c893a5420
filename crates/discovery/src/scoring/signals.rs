//! The five recommendation signals. Each returns a value in [0, 1].

use crate::rankings::{tier_score, InstitutionRankings};
use piscout_common::gateway::AuthorProfile;
use piscout_common::text::cosine_similarity;

/// Score when a candidate's activity cannot be looked up
pub const UNKNOWN_ACTIVITY: f64 = 0.2;

/// Best cosine similarity against any seed vector
pub fn field_similarity(candidate: Option<&[f64]>, seeds: &[Vec<f64>]) -> f64 {
    let Some(candidate) = candidate else {
        return 0.0;
    };
    seeds
        .iter()
        .map(|seed| cosine_similarity(candidate, seed))
        .fold(0.0, f64::max)
}

/// Saturating blend of seed links, shared papers and citation volume
pub fn connection_strength(seed_links: usize, shared_papers: i64, citations: i64) -> f64 {
    let coauthor = saturate(0.5 * seed_links as f64 + 0.1 * shared_papers.max(0) as f64);
    let citation = saturate(0.3 * citations.max(0) as f64);
    0.6 * coauthor + 0.4 * citation
}

/// Stored tier, else a lookup of the institute
pub fn institution_ranking(tier: Option<i32>, institute: &str, rankings: &InstitutionRankings) -> f64 {
    tier_score(tier.or_else(|| rankings.tier_of(institute)))
}

pub fn h_index(h: Option<i32>, max_h: i32) -> f64 {
    match h {
        Some(h) if max_h > 0 => (f64::from(h.max(0)) / f64::from(max_h)).min(1.0),
        _ => 0.0,
    }
}

/// Recency-weighted paper count over the last `window_years`.
///
/// A paper from this year weighs 1.0, one from `window_years` ago 1/e.
pub fn recent_activity(profile: Option<&AuthorProfile>, current_year: i32, window_years: f64) -> f64 {
    let Some(profile) = profile else {
        return UNKNOWN_ACTIVITY;
    };
    if profile.papers.is_empty() {
        return 0.0;
    }

    let cutoff = f64::from(current_year) - window_years;
    let weighted: f64 = profile
        .papers
        .iter()
        .filter_map(|paper| paper.year)
        .filter(|&year| f64::from(year) >= cutoff)
        .map(|year| {
            let age = f64::from((current_year - year).max(0));
            (-age / window_years).exp()
        })
        .sum();

    saturate(0.2 * weighted)
}

fn saturate(x: f64) -> f64 {
    1.0 - 1.0 / (1.0 + x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use piscout_common::gateway::Paper;

    fn profile(years: &[i32]) -> AuthorProfile {
        AuthorProfile {
            papers: years
                .iter()
                .map(|&y| Paper {
                    paper_id: format!("p{}", y),
                    year: Some(y),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_field_similarity_takes_best_seed() {
        let seeds = vec![vec![1.0, 0.0], vec![0.0, 1.0, 0.0]];
        assert!((field_similarity(Some(&[0.0, 1.0][..]), &seeds) - 1.0).abs() < 1e-9);
        assert_eq!(field_similarity(None, &seeds), 0.0);
        assert_eq!(field_similarity(Some(&[1.0][..]), &[]), 0.0);
    }

    #[test]
    fn test_connection_strength_formula() {
        assert_eq!(connection_strength(0, 0, 0), 0.0);
        // one seed, two shared papers, one citation
        let coauthor = 1.0 - 1.0 / (1.0 + 0.5 + 0.2);
        let citation = 1.0 - 1.0 / 1.3;
        let expected = 0.6 * coauthor + 0.4 * citation;
        assert!((connection_strength(1, 2, 1) - expected).abs() < 1e-12);
        assert!(connection_strength(1000, 1000, 1000) < 1.0);
    }

    #[test]
    fn test_h_index_normalization() {
        assert_eq!(h_index(Some(20), 40), 0.5);
        assert_eq!(h_index(Some(80), 40), 1.0);
        assert_eq!(h_index(None, 40), 0.0);
        assert_eq!(h_index(Some(10), 0), 0.0);
    }

    #[test]
    fn test_institution_ranking_prefers_stored_tier() {
        let rankings = InstitutionRankings::from_json(
            r#"{"tiers": {"1": {"institutions": ["Stanford University"]}}}"#,
        )
        .unwrap();
        assert_eq!(institution_ranking(Some(3), "Stanford University", &rankings), 0.5);
        assert_eq!(institution_ranking(None, "Stanford University", &rankings), 1.0);
        assert_eq!(institution_ranking(None, "", &rankings), 0.15);
    }

    #[test]
    fn test_recent_activity_decays_with_age() {
        let this_year = recent_activity(Some(&profile(&[2026])), 2026, 2.0);
        let two_years_ago = recent_activity(Some(&profile(&[2024])), 2026, 2.0);
        assert!((this_year - (1.0 - 1.0 / 1.2)).abs() < 1e-12);
        assert!(two_years_ago < this_year);
        assert_eq!(recent_activity(Some(&profile(&[2010])), 2026, 2.0), 0.0);
        assert_eq!(recent_activity(Some(&profile(&[])), 2026, 2.0), 0.0);
        assert_eq!(recent_activity(None, 2026, 2.0), UNKNOWN_ACTIVITY);
    }
}
