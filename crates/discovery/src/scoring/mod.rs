//! Composite recommendation scoring
//!
//! Every non-seed PI gets five sub-scores in [0, 1] which are combined with
//! the configured weights:
//! - Field similarity (research vector vs. seeds)
//! - Connection strength (seed links, shared papers, citations)
//! - Institution ranking (tier)
//! - H-index (relative to the graph maximum)
//! - Recent activity (recency-weighted paper count)

pub mod signals;

use crate::graph::DiscoveryGraph;
use crate::rankings::InstitutionRankings;
use piscout_common::config::{ScoreWeights, ScoringConfig};
use piscout_common::db::ScoreUpdate;
use piscout_common::errors::Result;
use piscout_common::text::parse_vector;
use piscout_common::{metrics, AcademicGateway, GraphStore};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Sub-scores of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub field_similarity: f64,
    pub connection_strength: f64,
    pub institution_ranking: f64,
    pub h_index: f64,
    pub recent_activity: f64,
}

impl ScoreBreakdown {
    /// Weighted sum clamped to [0, 1]
    pub fn composite(&self, weights: &ScoreWeights) -> f64 {
        let sum = weights.field_similarity * self.field_similarity
            + weights.connection_strength * self.connection_strength
            + weights.institution_ranking * self.institution_ranking
            + weights.h_index * self.h_index
            + weights.recent_activity * self.recent_activity;
        sum.clamp(0.0, 1.0)
    }
}

/// A scored non-seed PI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub pi_id: i64,
    pub name: String,
    pub composite: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    fn to_update(&self) -> ScoreUpdate {
        ScoreUpdate {
            pi_id: self.pi_id,
            composite: self.composite,
            field_similarity: self.breakdown.field_similarity,
            connection_strength: self.breakdown.connection_strength,
            institution_ranking: self.breakdown.institution_ranking,
            h_index: self.breakdown.h_index,
            recent_activity: self.breakdown.recent_activity,
        }
    }
}

pub struct CompositeScorer<'a> {
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
    config: ScoringConfig,
}

impl<'a> CompositeScorer<'a> {
    pub fn new(
        store: &'a GraphStore,
        gateway: &'a AcademicGateway,
        rankings: &'a InstitutionRankings,
        config: &ScoringConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            rankings,
            config: config.clone(),
        }
    }

    /// Score all candidates, best first. Scores are persisted in one
    /// transaction unless running dry.
    pub async fn score_all(&self) -> Result<Vec<ScoredCandidate>> {
        let started = Instant::now();
        let graph = DiscoveryGraph::load(self.store).await?;

        let seed_vectors: Vec<Vec<f64>> = graph
            .seeds()
            .filter_map(|seed| parse_vector(seed.research_vector.as_deref()))
            .collect();
        let max_h = graph.max_h_index();
        let current_year = crate::current_year();

        let candidates: Vec<_> = graph.candidates().collect();
        if candidates.is_empty() {
            info!("No candidate PIs to score");
            return Ok(Vec::new());
        }
        info!(
            candidates = candidates.len(),
            seeds = graph.seeds().count(),
            "Scoring candidate PIs"
        );

        let mut results = Vec::with_capacity(candidates.len());
        for pi in candidates {
            let vector = parse_vector(pi.research_vector.as_deref());
            let profile = match pi.semantic_id.as_deref() {
                Some(id) => self.gateway.get_author_profile(id).await,
                None => None,
            };

            let breakdown = ScoreBreakdown {
                field_similarity: signals::field_similarity(vector.as_deref(), &seed_vectors),
                connection_strength: signals::connection_strength(
                    graph.connected_seeds(pi.id).len(),
                    graph.shared_papers(pi.id),
                    graph.citation_total(pi.id),
                ),
                institution_ranking: signals::institution_ranking(pi.tier, &pi.institute, self.rankings),
                h_index: signals::h_index(pi.h_index, max_h),
                recent_activity: signals::recent_activity(
                    profile.as_ref(),
                    current_year,
                    self.config.activity_window_years,
                ),
            };
            let composite = breakdown.composite(&self.config.weights);
            debug!(pi_id = pi.id, name = %pi.name, composite, ?breakdown, "Scored PI");

            results.push(ScoredCandidate {
                pi_id: pi.id,
                name: pi.name.clone(),
                composite,
                breakdown,
            });
        }

        results.sort_by(|a, b| {
            b.composite
                .total_cmp(&a.composite)
                .then_with(|| a.pi_id.cmp(&b.pi_id))
        });

        if self.config.dry_run {
            info!(scored = results.len(), "Dry run: scores computed but not persisted");
        } else {
            let updates: Vec<ScoreUpdate> = results.iter().map(ScoredCandidate::to_update).collect();
            self.store.persist_scores(&updates).await?;
            info!(scored = results.len(), "Recommendation scores persisted");
        }

        metrics::record_scoring(results.len(), started.elapsed());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use piscout_common::gateway::SnapshotProvider;
    use piscout_common::PiRecord;

    async fn seeded_store() -> (GraphStore, i64, i64, i64) {
        let store = testing::store().await;
        let mut seed = PiRecord::new("Jane Doe").institute("Stanford University").seed();
        seed.h_index = Some(40);
        seed.research_vector = Some(vec![0.6, 0.8]);
        let (seed_id, _) = store.upsert_pi(&seed).await.unwrap();

        let mut close = PiRecord::new("John Roe")
            .institute("Stanford University")
            .recommended()
            .semantic_id("A2")
            .connected_to(["Jane Doe"]);
        close.h_index = Some(20);
        close.research_vector = Some(vec![0.6, 0.8]);
        let (close_id, _) = store.upsert_pi(&close).await.unwrap();

        let mut far = PiRecord::new("Ann Lee").institute("Smith College").recommended();
        far.h_index = Some(5);
        let (far_id, _) = store.upsert_pi(&far).await.unwrap();

        store.upsert_coauthorship(seed_id, close_id, 3).await.unwrap();
        store.upsert_citation(close_id, seed_id).await.unwrap();
        (store, seed_id, close_id, far_id)
    }

    fn rankings() -> InstitutionRankings {
        InstitutionRankings::from_json(r#"{"tiers": {"1": {"institutions": ["Stanford University"]}}}"#)
            .unwrap()
    }

    #[tokio::test]
    async fn test_scores_are_bounded_sorted_and_persisted() {
        let (store, seed_id, close_id, far_id) = seeded_store().await;
        let year = crate::current_year();
        let provider = SnapshotProvider::new("snapshot").with_author(testing::profile(
            testing::author("A2", "John Roe", 20, "Stanford University"),
            vec![testing::paper("p1", "CRISPR", "", year, &[("A2", "John Roe")])],
        ));
        let (gateway, _) = testing::gateway(provider);
        let rankings = rankings();

        let scorer = CompositeScorer::new(&store, &gateway, &rankings, &ScoringConfig::default());
        let results = scorer.score_all().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].pi_id, close_id);
        assert_eq!(results[1].pi_id, far_id);
        for r in &results {
            assert!((0.0..=1.0).contains(&r.composite));
            for s in [
                r.breakdown.field_similarity,
                r.breakdown.connection_strength,
                r.breakdown.institution_ranking,
                r.breakdown.h_index,
                r.breakdown.recent_activity,
            ] {
                assert!((0.0..=1.0).contains(&s));
            }
        }

        let close = &results[0].breakdown;
        assert!((close.field_similarity - 1.0).abs() < 1e-9);
        assert_eq!(close.institution_ranking, 1.0);
        assert_eq!(close.h_index, 0.5);
        assert!((close.recent_activity - (1.0 - 1.0 / 1.2)).abs() < 1e-9);

        let far = &results[1].breakdown;
        assert_eq!(far.field_similarity, 0.0);
        assert_eq!(far.connection_strength, 0.0);
        assert_eq!(far.institution_ranking, 0.15);
        assert_eq!(far.recent_activity, signals::UNKNOWN_ACTIVITY);

        let stored = store.find_pi(close_id).await.unwrap().unwrap();
        assert_eq!(stored.recommendation_score, Some(results[0].composite));
        assert_eq!(stored.h_index_score, Some(0.5));
        assert_eq!(store.find_pi(seed_id).await.unwrap().unwrap().recommendation_score, None);

        let recommended = store.get_recommended_pis(0.0).await.unwrap();
        assert_eq!(recommended[0].id, close_id);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_persist() {
        let (store, _, close_id, _) = seeded_store().await;
        let (gateway, _) = testing::gateway(SnapshotProvider::new("snapshot"));
        let rankings = InstitutionRankings::default();
        let config = ScoringConfig {
            dry_run: true,
            ..Default::default()
        };

        let results = CompositeScorer::new(&store, &gateway, &rankings, &config)
            .score_all()
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(store.find_pi(close_id).await.unwrap().unwrap().recommendation_score, None);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let store = testing::store().await;
        store.upsert_pi(&PiRecord::new("Jane Doe").seed()).await.unwrap();
        let (gateway, provider) = testing::gateway(SnapshotProvider::new("snapshot"));
        let rankings = InstitutionRankings::default();

        let results = CompositeScorer::new(&store, &gateway, &rankings, &ScoringConfig::default())
            .score_all()
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_composite_is_clamped() {
        let breakdown = ScoreBreakdown {
            field_similarity: 1.0,
            connection_strength: 1.0,
            institution_ranking: 1.0,
            h_index: 1.0,
            recent_activity: 1.0,
        };
        let heavy = ScoreWeights {
            field_similarity: 1.0,
            ..Default::default()
        };
        assert_eq!(breakdown.composite(&heavy), 1.0);
        assert!((breakdown.composite(&ScoreWeights::default()) - 1.0).abs() < 1e-9);
    }
}
