//! Topic discovery
//!
//! Finds PIs outside the seed network: searches recent papers for each field
//! keyword (plus synonyms) and adds the last listed author of every in-field
//! hit as a recommended PI. People already in the store are left alone.

use crate::rankings::InstitutionRankings;
use chrono::Utc;
use piscout_common::config::DiscoveryConfig;
use piscout_common::errors::Result;
use piscout_common::gateway::Paper;
use piscout_common::text::{extract_institute, normalize_name, RelevanceFilter};
use piscout_common::metrics::{self, FilterReason};
use piscout_common::{AcademicGateway, GraphStore, PiRecord};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

const PATH: &str = "topic";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    pub queries_run: usize,
    pub papers_found: usize,
    pub new_pis: usize,
    pub skipped_known: usize,
    pub filtered: usize,
}

pub struct TopicDiscovery<'a> {
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
    config: &'a DiscoveryConfig,
    relevance: RelevanceFilter,
}

impl<'a> TopicDiscovery<'a> {
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

    /// OR-query over a keyword and its synonyms, phrases quoted
    pub fn build_query(&self, keyword: &str) -> String {
        let mut terms = vec![keyword.trim().to_string()];
        if let Some(synonyms) = self.config.synonyms.get(&keyword.trim().to_lowercase()) {
            terms.extend(synonyms.iter().map(|s| s.trim().to_string()));
        }
        terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| if t.contains(' ') { format!("\"{}\"", t) } else { t.clone() })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub async fn discover(&self) -> Result<TopicSummary> {
        let mut summary = TopicSummary::default();
        let mut known: HashSet<String> = self
            .store
            .get_all_pis()
            .await?
            .iter()
            .map(|pi| normalize_name(&pi.name))
            .collect();
        let mut seen_papers = HashSet::new();
        let since = crate::since_year(self.config.topic_lookback_years);

        info!(queries = self.config.keywords.len(), since, "Running topic queries");

        for keyword in &self.config.keywords {
            let query = self.build_query(keyword);
            let papers = self
                .gateway
                .search_papers(&query, Some(since), self.config.topic_max_results)
                .await;
            summary.queries_run += 1;
            debug!(keyword = %keyword, results = papers.len(), "Topic query");

            for paper in &papers {
                if !seen_papers.insert(paper.paper_id.clone()) {
                    continue;
                }
                summary.papers_found += 1;
                self.process_paper(paper, &mut known, &mut summary).await?;
            }
        }

        info!(?summary, "Topic discovery complete");
        Ok(summary)
    }

    async fn process_paper(
        &self,
        paper: &Paper,
        known: &mut HashSet<String>,
        summary: &mut TopicSummary,
    ) -> Result<()> {
        if !self.relevance.is_relevant(&paper.text()) {
            metrics::record_candidate_filtered(PATH, FilterReason::Irrelevant);
            summary.filtered += 1;
            return Ok(());
        }
        let Some(author) = paper.last_author() else {
            return Ok(());
        };
        let name = author.name.trim();
        if !known.insert(normalize_name(name)) {
            summary.skipped_known += 1;
            return Ok(());
        }

        let affiliation = author.affiliations.first().map(String::as_str).unwrap_or_default();
        let institute = extract_institute(affiliation, &self.config.institute_hint_words);
        let mut record = PiRecord::new(name).institute(institute.as_str()).recommended();
        record.semantic_id = author.author_id.clone().filter(|id| !id.is_empty());
        record.tier = self.rankings.tier_of(&institute);
        record.last_scraped = Some(Utc::now());

        let (pi_id, is_new) = self.store.merge_pi(&record).await?;
        metrics::record_pi_discovered(PATH, is_new);
        if is_new {
            summary.new_pis += 1;
            info!(pi_id, name, institute = %institute, paper = %paper.title, "New PI from topic search");
        } else {
            summary.skipped_known += 1;
        }
        Ok(())
    }
}
