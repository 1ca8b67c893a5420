//! PI enrichment
//!
//! Citation and topic paths only see a paper's author line, so the PIs they
//! add carry no metrics and no research vector. This pass fetches the full
//! profile of each such recommendation so that the field-similarity and
//! h-index signals have something to work with.

use crate::rankings::InstitutionRankings;
use chrono::Utc;
use piscout_common::config::DiscoveryConfig;
use piscout_common::db::models::Pi;
use piscout_common::errors::Result;
use piscout_common::gateway::AuthorProfile;
use piscout_common::identity::IdentityHints;
use piscout_common::text::ResearchVectorizer;
use piscout_common::{AcademicGateway, GraphStore, PiRecord};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    pub candidates: usize,
    pub enriched: usize,
    pub unresolved: usize,
}

pub struct PiEnricher<'a> {
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
    config: &'a DiscoveryConfig,
    vectorizer: ResearchVectorizer,
}

impl<'a> PiEnricher<'a> {
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

    /// Profile every recommended PI still missing an h-index or vector
    pub async fn enrich(&self) -> Result<EnrichSummary> {
        let pending = self.store.get_pis_needing_enrichment(self.config.enrich_limit).await?;
        let mut summary = EnrichSummary {
            candidates: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            debug!("No PIs need enrichment");
            return Ok(summary);
        }
        info!(candidates = pending.len(), "Enriching recommended PIs");

        for pi in &pending {
            let Some(author_id) = self.resolve_id(pi).await? else {
                debug!(pi_id = pi.id, name = %pi.name, "Could not resolve PI for enrichment");
                summary.unresolved += 1;
                continue;
            };
            let Some(profile) = self.gateway.get_author_profile(&author_id).await else {
                debug!(pi_id = pi.id, author_id = %author_id, "No profile for PI");
                summary.unresolved += 1;
                continue;
            };

            let record = self.enriched_record(pi, &author_id, &profile);
            self.store.upsert_pi(&record).await?;
            debug!(
                pi_id = pi.id,
                name = %pi.name,
                h_index = ?record.h_index,
                vector = record.research_vector.is_some(),
                "Enriched PI"
            );
            summary.enriched += 1;
        }

        info!(?summary, "Enrichment complete");
        Ok(summary)
    }

    /// Stored id, else an author search keyed on institute and any known
    /// h-index. A searched id is claimed for this node before use.
    async fn resolve_id(&self, pi: &Pi) -> Result<Option<String>> {
        if let Some(id) = pi.semantic_id.as_deref().filter(|id| !id.is_empty()) {
            return Ok(Some(id.to_string()));
        }

        let mut hints = IdentityHints::default().with_h_index(pi.h_index);
        if !pi.institute.is_empty() {
            hints.institute = Some(pi.institute.clone());
        }
        let Some(candidate) = self.gateway.resolve_author(&pi.name, &hints).await else {
            return Ok(None);
        };
        if candidate.author_id.is_empty() {
            return Ok(None);
        }
        if !self.store.set_semantic_id(pi.id, &candidate.author_id).await? {
            return Ok(None);
        }
        Ok(Some(candidate.author_id))
    }

    fn enriched_record(&self, pi: &Pi, author_id: &str, profile: &AuthorProfile) -> PiRecord {
        let author = &profile.author;
        let mut record = PiRecord::new(pi.name.as_str())
            .institute(pi.institute.as_str())
            .semantic_id(author_id);
        record.h_index = author.h_index;
        record.citations = author.citation_count;
        record.paper_count = author.paper_count;
        record.homepage = author.homepage.clone();
        if pi.tier.is_none() {
            record.tier = self.rankings.best_tier(author.affiliations.iter().map(String::as_str));
        }

        let texts: Vec<String> = profile.papers.iter().map(|p| p.text()).collect();
        record.research_vector = self.vectorizer.vectorize(texts.iter().map(String::as_str));
        record.last_scraped = Some(Utc::now());
        record
    }
}
