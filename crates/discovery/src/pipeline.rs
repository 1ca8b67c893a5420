//! Discovery pipeline
//!
//! One batch run: register and profile seeds, explore co-authors, trace
//! citations, optionally search topics, fill in profiles of the
//! recommendations those paths found, then score every candidate.

use crate::citation::{CitationSummary, CitationTracer};
use crate::enricher::{EnrichSummary, PiEnricher};
use crate::frontier::{FrontierExplorer, FrontierSummary};
use crate::profiler::{ProfileSummary, SeedProfiler};
use crate::rankings::InstitutionRankings;
use crate::scoring::{CompositeScorer, ScoredCandidate};
use crate::topic::{TopicDiscovery, TopicSummary};
use piscout_common::errors::Result;
use piscout_common::{AcademicGateway, AppConfig, GraphStore};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Candidates kept in the run summary
const TOP_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub seeds_registered: usize,
    pub profile: ProfileSummary,
    pub frontier: FrontierSummary,
    pub citations: CitationSummary,
    pub topic: Option<TopicSummary>,
    pub enrichment: Option<EnrichSummary>,
    pub scored: usize,
    pub top: Vec<ScoredCandidate>,
    pub total_pis: u64,
    pub recommended: usize,
    pub elapsed_ms: u64,
}

pub struct DiscoveryPipeline<'a> {
    config: &'a AppConfig,
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
}

impl<'a> DiscoveryPipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a GraphStore,
        gateway: &'a AcademicGateway,
        rankings: &'a InstitutionRankings,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            rankings,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let discovery = &self.config.discovery;
        let mut summary = RunSummary::default();

        let profiler = SeedProfiler::new(self.store, self.gateway, self.rankings, discovery);
        summary.seeds_registered = profiler.register_seeds(&discovery.seeds).await?;
        summary.profile = profiler.profile_seeds().await?;

        summary.frontier = FrontierExplorer::new(self.store, self.gateway, self.rankings, discovery)
            .explore()
            .await?;

        summary.citations = CitationTracer::new(self.store, self.gateway, self.rankings, discovery)
            .trace()
            .await?;

        if discovery.topic_discovery {
            let topic = TopicDiscovery::new(self.store, self.gateway, self.rankings, discovery)
                .discover()
                .await?;
            summary.topic = Some(topic);
        }

        if discovery.enrichment {
            let enrichment = PiEnricher::new(self.store, self.gateway, self.rankings, discovery)
                .enrich()
                .await?;
            summary.enrichment = Some(enrichment);
        }

        let scored = CompositeScorer::new(self.store, self.gateway, self.rankings, &self.config.scoring)
            .score_all()
            .await?;
        summary.scored = scored.len();
        summary.top = scored.into_iter().take(TOP_CANDIDATES).collect();

        summary.total_pis = self.store.count_pis().await?;
        summary.recommended = self
            .store
            .get_recommended_pis(self.config.scoring.min_recommend_score)
            .await?
            .len();
        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            total_pis = summary.total_pis,
            recommended = summary.recommended,
            scored = summary.scored,
            breaker = ?self.gateway.breaker_state(),
            elapsed_ms = summary.elapsed_ms,
            "Discovery run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use piscout_common::config::SeedConfig;
    use piscout_common::gateway::SnapshotProvider;

    fn provider(year: i32) -> SnapshotProvider {
        let joint = testing::paper(
            "p1",
            "Editing extreme genomes",
            "CRISPR tools for thermophilic archaea",
            year,
            &[("R1", "John Roe"), ("J1", "Jane Doe")],
        );
        SnapshotProvider::new("snapshot")
            .with_author(testing::profile(
                testing::author("J1", "Jane Doe", 40, "Stanford University"),
                vec![joint.clone()],
            ))
            .with_author(testing::profile(
                testing::author("R1", "John Roe", 12, "MIT"),
                vec![joint],
            ))
            .with_author(testing::profile(
                testing::author("C9", "Cal Nine", 8, "Caltech"),
                vec![testing::paper("p9", "Cas9 variants", "", year, &[("C9", "Cal Nine")])],
            ))
            .with_citation("p9", "p1")
    }

    fn config() -> AppConfig {
        let mut config = testing::app_config();
        config.discovery.seeds = vec![SeedConfig {
            name: "Jane Doe".into(),
            institute: Some("Stanford University".into()),
            department: None,
        }];
        config
    }

    #[tokio::test]
    async fn test_rerun_over_same_data_is_idempotent() {
        let store = testing::store().await;
        let (gateway, _) = testing::gateway(provider(crate::current_year()));
        let rankings = InstitutionRankings::default();
        let config = config();
        let pipeline = DiscoveryPipeline::new(&config, &store, &gateway, &rankings);

        let first = pipeline.run().await.unwrap();
        assert_eq!(first.seeds_registered, 1);
        assert_eq!(first.profile.profiled, 1);
        assert_eq!(first.frontier.new_pis, 1);
        assert_eq!(first.citations.new_pis, 1);
        assert_eq!(first.total_pis, 3);
        assert_eq!(first.scored, 2);
        assert_eq!(first.recommended, 2);
        assert!(first.topic.is_none());
        let enrichment = first.enrichment.clone().unwrap();
        assert_eq!(enrichment.candidates, 1);
        assert_eq!(enrichment.enriched, 1);

        let cal = store.find_pi_by_key("Cal Nine", "").await.unwrap().unwrap();
        assert_eq!(cal.h_index, Some(8));
        assert!(cal.research_vector.is_some());

        let edges = store.coauthorships().await.unwrap();
        let citations = store.citations().await.unwrap();

        let second = pipeline.run().await.unwrap();
        assert_eq!(second.seeds_registered, 0);
        assert_eq!(second.total_pis, 3);
        assert_eq!(second.enrichment.unwrap().candidates, 0);
        let edges_again = store.coauthorships().await.unwrap();
        let citations_again = store.citations().await.unwrap();
        assert_eq!(edges.len(), edges_again.len());
        assert_eq!(edges[0].shared_papers, edges_again[0].shared_papers);
        assert_eq!(citations.len(), citations_again.len());
        assert_eq!(citations[0].citation_count, citations_again[0].citation_count);

        for candidate in &second.top {
            assert!((0.0..=1.0).contains(&candidate.composite));
        }
    }
}
