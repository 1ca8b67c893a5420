//! Seed profiling
//!
//! Registers curated seed PIs and enriches them from the academic graph:
//! identifier, metrics, homepage and a research vector built from their
//! paper titles and abstracts.

use crate::rankings::InstitutionRankings;
use chrono::Utc;
use piscout_common::config::{DiscoveryConfig, SeedConfig};
use piscout_common::db::models::Pi;
use piscout_common::errors::Result;
use piscout_common::gateway::AuthorProfile;
use piscout_common::identity::IdentityHints;
use piscout_common::text::ResearchVectorizer;
use piscout_common::{AcademicGateway, GraphStore, PiRecord};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub seeds: usize,
    pub profiled: usize,
    pub unresolved: usize,
}

pub struct SeedProfiler<'a> {
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
    config: &'a DiscoveryConfig,
    vectorizer: ResearchVectorizer,
}

impl<'a> SeedProfiler<'a> {
    pub fn new(
        store: &'a GraphStore,
        gateway: &'a AcademicGateway,
        rankings: &'a InstitutionRankings,
        config: &'a DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            rankings,
            config,
            vectorizer: ResearchVectorizer::default(),
        }
    }

    /// Upsert scraper-style seed hints as seed PIs. Returns how many were new.
    pub async fn register_seeds(&self, seeds: &[SeedConfig]) -> Result<usize> {
        let mut created = 0;
        for seed in seeds {
            let institute = seed.institute.clone().unwrap_or_default();
            let mut record = PiRecord::new(seed.name.as_str()).institute(institute.as_str()).seed();
            record.department = seed.department.clone();
            record.tier = self.rankings.tier_of(&institute);

            let (pi_id, is_new) = self.store.upsert_pi(&record).await?;
            if is_new {
                created += 1;
                info!(pi_id, name = %seed.name, institute = %institute, "Registered seed PI");
            }
        }
        Ok(created)
    }

    /// Resolve and enrich every seed in the store
    pub async fn profile_seeds(&self) -> Result<ProfileSummary> {
        let seeds = self.store.get_seed_pis().await?;
        let mut summary = ProfileSummary {
            seeds: seeds.len(),
            ..Default::default()
        };

        for seed in &seeds {
            let Some(author_id) = self.resolve_id(seed).await else {
                warn!(pi_id = seed.id, name = %seed.name, "Could not resolve seed in academic graph");
                summary.unresolved += 1;
                continue;
            };

            let profile = self.gateway.get_author_profile(&author_id).await;
            let record = self.profile_record(seed, &author_id, profile.as_ref());
            self.store.upsert_pi(&record).await?;

            info!(
                pi_id = seed.id,
                name = %seed.name,
                author_id = %author_id,
                h_index = ?record.h_index,
                papers = profile.as_ref().map_or(0, |p| p.papers.len()),
                "Profiled seed PI"
            );
            summary.profiled += 1;
        }

        Ok(summary)
    }

    /// Stored id, then the configured known-id table, then author search
    async fn resolve_id(&self, seed: &Pi) -> Option<String> {
        if let Some(id) = seed.semantic_id.as_deref() {
            return Some(id.to_string());
        }
        if let Some(id) = self.config.known_author_id(&seed.name) {
            info!(name = %seed.name, author_id = %id, "Using known author id");
            return Some(id.to_string());
        }

        let hints = if seed.institute.is_empty() {
            IdentityHints::default()
        } else {
            IdentityHints::institute(seed.institute.as_str())
        };
        self.gateway
            .resolve_author(&seed.name, &hints)
            .await
            .map(|candidate| candidate.author_id)
            .filter(|id| !id.is_empty())
    }

    fn profile_record(&self, seed: &Pi, author_id: &str, profile: Option<&AuthorProfile>) -> PiRecord {
        let mut record = PiRecord::new(seed.name.as_str())
            .institute(seed.institute.as_str())
            .seed()
            .semantic_id(author_id);
        record.last_scraped = Some(Utc::now());
        if seed.tier.is_none() {
            record.tier = self.rankings.tier_of(&seed.institute);
        }

        if let Some(profile) = profile {
            let author = &profile.author;
            record.h_index = author.h_index;
            record.citations = author.citation_count;
            record.paper_count = author.paper_count;
            record.homepage = author.homepage.clone();

            let texts: Vec<String> = profile.papers.iter().map(|p| p.text()).collect();
            record.research_vector = self.vectorizer.vectorize(texts.iter().map(String::as_str));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use piscout_common::config::KnownAuthorId;
    use piscout_common::gateway::SnapshotProvider;

    fn seeds() -> Vec<SeedConfig> {
        vec![
            SeedConfig {
                name: "Jane Doe".into(),
                institute: Some("Stanford University".into()),
                department: Some("Bioengineering".into()),
            },
            SeedConfig {
                name: "Feng Zhang".into(),
                institute: None,
                department: None,
            },
        ]
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = testing::store().await;
        let (gateway, _) = testing::gateway(SnapshotProvider::new("snapshot"));
        let rankings = InstitutionRankings::from_json(
            r#"{"tiers": {"1": {"institutions": ["Stanford University"]}}}"#,
        )
        .unwrap();
        let config = DiscoveryConfig::default();
        let profiler = SeedProfiler::new(&store, &gateway, &rankings, &config);

        assert_eq!(profiler.register_seeds(&seeds()).await.unwrap(), 2);
        assert_eq!(profiler.register_seeds(&seeds()).await.unwrap(), 0);

        let stored = store.get_seed_pis().await.unwrap();
        assert_eq!(stored.len(), 2);
        let jane = stored.iter().find(|p| p.name == "Jane Doe").unwrap();
        assert_eq!(jane.tier, Some(1));
        assert_eq!(jane.department.as_deref(), Some("Bioengineering"));
        assert!(stored.iter().all(|p| p.is_seed && !p.is_recommended));
    }

    #[tokio::test]
    async fn test_profile_resolves_by_search_and_known_id() {
        let store = testing::store().await;
        let year = crate::current_year();
        let provider = SnapshotProvider::new("snapshot")
            .with_author(testing::profile(
                testing::author("J1", "Jane Doe", 40, "Stanford University"),
                vec![testing::paper("p1", "CRISPR screens in archaea", "", year, &[("J1", "Jane Doe")])],
            ))
            .with_author(testing::profile(testing::author("J2", "Jane Doe", 3, "Ohio State"), vec![]))
            .with_author(testing::profile(testing::author("F122", "Feng Zhang", 122, "Broad Institute"), vec![]));
        let (gateway, _) = testing::gateway(provider);
        let rankings = InstitutionRankings::default();
        let config = DiscoveryConfig {
            known_author_ids: vec![KnownAuthorId {
                name: "feng zhang".into(),
                author_id: "F122".into(),
            }],
            ..Default::default()
        };
        let profiler = SeedProfiler::new(&store, &gateway, &rankings, &config);
        profiler.register_seeds(&seeds()).await.unwrap();

        let summary = profiler.profile_seeds().await.unwrap();
        assert_eq!(summary, ProfileSummary { seeds: 2, profiled: 2, unresolved: 0 });

        let jane = store.find_pi_by_key("Jane Doe", "Stanford University").await.unwrap().unwrap();
        assert_eq!(jane.semantic_id.as_deref(), Some("J1"));
        assert_eq!(jane.h_index, Some(40));
        assert!(jane.research_vector.is_some());
        assert!(jane.last_scraped.is_some());
        assert!(jane.is_seed);

        let feng = store.find_pi_by_key("Feng Zhang", "").await.unwrap().unwrap();
        assert_eq!(feng.semantic_id.as_deref(), Some("F122"));
        assert_eq!(feng.h_index, Some(122));
        assert_eq!(store.count_pis().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unresolved_seed_is_counted() {
        let store = testing::store().await;
        let (gateway, _) = testing::gateway(SnapshotProvider::new("snapshot"));
        let rankings = InstitutionRankings::default();
        let config = DiscoveryConfig::default();
        let profiler = SeedProfiler::new(&store, &gateway, &rankings, &config);
        profiler.register_seeds(&seeds()[..1]).await.unwrap();

        let summary = profiler.profile_seeds().await.unwrap();
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.profiled, 0);
    }
}
