//! Citation tracing
//!
//! For each profiled seed, walks one level of citations around its recent
//! papers in both directions:
//! - forward: papers citing the seed's paper (discovered PI cites seed)
//! - backward: papers the seed's paper cites (seed cites discovered PI)
//!
//! The last listed author of an in-field related paper is taken as its
//! corresponding author. That is a life-science convention and will be wrong
//! for some papers.

use crate::rankings::InstitutionRankings;
use chrono::Utc;
use piscout_common::config::DiscoveryConfig;
use piscout_common::db::models::Pi;
use piscout_common::db::CitationObservation;
use piscout_common::errors::Result;
use piscout_common::gateway::{Paper, RelationDirection};
use piscout_common::text::{normalize_name, RelevanceFilter};
use piscout_common::metrics::{self, FilterReason};
use piscout_common::{AcademicGateway, GraphStore, PiRecord};
use serde::Serialize;
use tracing::{debug, info};

const PATH: &str = "citation";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CitationSummary {
    pub seeds_processed: usize,
    pub seeds_skipped: usize,
    pub papers_examined: usize,
    pub forward: usize,
    pub backward: usize,
    pub new_pis: usize,
    pub filtered: usize,
}

pub struct CitationTracer<'a> {
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
    config: &'a DiscoveryConfig,
    relevance: RelevanceFilter,
}

impl<'a> CitationTracer<'a> {
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
            relevance: RelevanceFilter::new(&config.keywords, &config.synonyms, config.relevance_threshold),
        }
    }

    pub async fn trace(&self) -> Result<CitationSummary> {
        let mut summary = CitationSummary::default();
        let seeds = self.store.get_seed_pis().await?;

        for seed in &seeds {
            let Some(author_id) = seed.semantic_id.as_deref() else {
                info!(pi_id = seed.id, name = %seed.name, "Skipping seed without academic id");
                summary.seeds_skipped += 1;
                continue;
            };
            let Some(profile) = self.gateway.get_author_profile(author_id).await else {
                debug!(pi_id = seed.id, author_id, "No profile for seed, skipping citations");
                summary.seeds_skipped += 1;
                continue;
            };

            let mut papers: Vec<&Paper> = profile
                .recent_papers(crate::since_year(self.config.recent_years))
                .filter(|p| !p.paper_id.is_empty())
                .collect();
            papers.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.paper_id.cmp(&b.paper_id)));
            papers.truncate(self.config.max_papers_per_seed);

            info!(pi_id = seed.id, name = %seed.name, papers = papers.len(), "Tracing citations");
            summary.seeds_processed += 1;

            for paper in papers {
                summary.papers_examined += 1;
                for direction in [RelationDirection::Citing, RelationDirection::Cited] {
                    let related = self
                        .gateway
                        .get_paper_relations(&paper.paper_id, direction, self.config.citation_max_results)
                        .await;
                    for other in &related {
                        self.process_related(seed, author_id, paper, other, direction, &mut summary)
                            .await?;
                    }
                }
            }
        }

        info!(?summary, "Citation tracing complete");
        Ok(summary)
    }

    async fn process_related(
        &self,
        seed: &Pi,
        seed_author_id: &str,
        seed_paper: &Paper,
        other: &Paper,
        direction: RelationDirection,
        summary: &mut CitationSummary,
    ) -> Result<()> {
        if other.paper_id.is_empty() || other.paper_id == seed_paper.paper_id {
            return Ok(());
        }
        if !self.relevance.is_relevant(&other.text()) {
            debug!(paper_id = %other.paper_id, direction = direction.as_str(), "Related paper not field-relevant");
            metrics::record_candidate_filtered(PATH, FilterReason::Irrelevant);
            summary.filtered += 1;
            return Ok(());
        }
        let Some(author) = other.last_author() else {
            return Ok(());
        };
        let is_seed = author.author_id.as_deref() == Some(seed_author_id)
            || normalize_name(&author.name) == normalize_name(&seed.name);
        if is_seed {
            return Ok(());
        }

        let mut record = PiRecord::new(author.name.trim())
            .institute(author.affiliations.first().map(String::as_str).unwrap_or_default())
            .recommended()
            .connected_to([seed.name.clone()]);
        record.semantic_id = author.author_id.clone().filter(|id| !id.is_empty());
        record.tier = self.rankings.best_tier(author.affiliations.iter().map(String::as_str));
        record.last_scraped = Some(Utc::now());

        let (pi_id, is_new) = self.store.merge_pi(&record).await?;
        if pi_id == seed.id {
            return Ok(());
        }

        let (citing, cited, evidence) = match direction {
            RelationDirection::Citing => (
                pi_id,
                seed.id,
                CitationObservation {
                    citing_paper_id: other.paper_id.clone(),
                    cited_paper_id: seed_paper.paper_id.clone(),
                },
            ),
            RelationDirection::Cited => (
                seed.id,
                pi_id,
                CitationObservation {
                    citing_paper_id: seed_paper.paper_id.clone(),
                    cited_paper_id: other.paper_id.clone(),
                },
            ),
        };
        let counted = self.store.record_citation(citing, cited, &evidence).await?;

        match direction {
            RelationDirection::Citing => summary.forward += 1,
            RelationDirection::Cited => summary.backward += 1,
        }
        metrics::record_pi_discovered(PATH, is_new);
        if is_new {
            summary.new_pis += 1;
            info!(
                pi_id,
                name = %record.name,
                direction = direction.as_str(),
                via = %seed.name,
                "New PI from citations"
            );
        } else {
            debug!(pi_id, counted, direction = direction.as_str(), "Known PI from citations");
        }
        Ok(())
    }
}
