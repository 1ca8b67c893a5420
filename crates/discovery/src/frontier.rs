//! Co-author frontier exploration
//!
//! Breadth-first expansion of the co-author graph outward from the seed PIs.
//! Each hop fetches the recent co-authors of every frontier PI, keeps the
//! ones that are in-field and PI-level, merges them into the store and
//! records the co-authorship. Accepted co-authors not yet explored form the
//! next frontier.

use crate::graph::DiscoveryGraph;
use crate::rankings::InstitutionRankings;
use chrono::Utc;
use piscout_common::config::DiscoveryConfig;
use piscout_common::db::models::Pi;
use piscout_common::errors::Result;
use piscout_common::gateway::AuthorProfile;
use piscout_common::identity::IdentityHints;
use piscout_common::text::{RelevanceFilter, ResearchVectorizer};
use piscout_common::metrics::{self, FilterReason};
use piscout_common::{AcademicGateway, GraphStore, PiRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

const PATH: &str = "coauthor";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrontierSummary {
    pub seeds: usize,
    pub hops: u32,
    pub frontier_sizes: Vec<usize>,
    pub explored: usize,
    pub discovered: usize,
    pub new_pis: usize,
    pub filtered: usize,
    pub cross_connections: usize,
}

/// What the recent papers of a frontier PI say about one co-author
#[derive(Debug, Default)]
struct CoauthorEvidence {
    name: String,
    affiliations: Vec<String>,
    texts: Vec<String>,
    joint_papers: usize,
}

#[derive(Debug, Clone, Copy)]
struct Accepted {
    id: i64,
    is_new: bool,
}

pub struct FrontierExplorer<'a> {
    store: &'a GraphStore,
    gateway: &'a AcademicGateway,
    rankings: &'a InstitutionRankings,
    config: &'a DiscoveryConfig,
    relevance: RelevanceFilter,
    vectorizer: ResearchVectorizer,
}

impl<'a> FrontierExplorer<'a> {
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
            vectorizer: ResearchVectorizer::default(),
        }
    }

    /// Run the BFS for up to `max_hops` levels, then the cross-connection pass
    pub async fn explore(&self) -> Result<FrontierSummary> {
        let seeds = self.store.get_seed_pis().await?;
        let mut summary = FrontierSummary {
            seeds: seeds.len(),
            ..Default::default()
        };
        if seeds.is_empty() {
            info!("No seed PIs in store, skipping co-author exploration");
            return Ok(summary);
        }

        info!(
            seeds = seeds.len(),
            max_hops = self.config.max_hops,
            min_h_index = self.config.min_h_index,
            min_papers = self.config.min_papers,
            min_recent_papers = self.config.min_recent_papers,
            "Building co-author network"
        );

        let mut explored: HashSet<i64> = seeds.iter().map(|s| s.id).collect();
        let mut origins: HashMap<i64, BTreeSet<String>> = seeds
            .iter()
            .map(|s| (s.id, BTreeSet::from([s.name.clone()])))
            .collect();
        let mut frontier: BTreeSet<i64> = explored.iter().copied().collect();

        for hop in 1..=self.config.max_hops {
            if frontier.is_empty() {
                break;
            }
            summary.hops = hop;
            summary.frontier_sizes.push(frontier.len());
            info!(hop, frontier = frontier.len(), "Expanding hop");

            let mut next_frontier = BTreeSet::new();
            for &pi_id in &frontier {
                let Some(pi) = self.store.find_pi(pi_id).await? else {
                    continue;
                };
                let Some(author_id) = self.author_id_for(&pi).await? else {
                    debug!(pi_id, name = %pi.name, "No academic id, skipping expansion");
                    continue;
                };
                let Some(profile) = self.gateway.get_author_profile(&author_id).await else {
                    debug!(pi_id, author_id = %author_id, "No profile, skipping expansion");
                    continue;
                };

                let pi_origins = origins.get(&pi_id).cloned().unwrap_or_default();
                let coauthors = collect_coauthors(&profile, &author_id, crate::since_year(self.config.recent_years));
                for (coauthor_id, evidence) in &coauthors {
                    match self.process_coauthor(&pi, coauthor_id, evidence, &pi_origins, hop).await? {
                        Some(accepted) => {
                            summary.discovered += 1;
                            if accepted.is_new {
                                summary.new_pis += 1;
                            }
                            origins
                                .entry(accepted.id)
                                .or_default()
                                .extend(pi_origins.iter().cloned());
                            if !explored.contains(&accepted.id) {
                                next_frontier.insert(accepted.id);
                            }
                        }
                        None => summary.filtered += 1,
                    }
                }
            }

            explored.extend(next_frontier.iter().copied());
            frontier = next_frontier;
        }

        summary.explored = explored.len();
        summary.cross_connections = self.cross_connect().await?;
        info!(?summary, "Co-author network complete");
        Ok(summary)
    }

    /// Stored academic id, or a name search persisted back to the store
    async fn author_id_for(&self, pi: &Pi) -> Result<Option<String>> {
        if let Some(id) = pi.semantic_id.as_deref() {
            return Ok(Some(id.to_string()));
        }

        let hints = IdentityHints {
            institute: (!pi.institute.is_empty()).then(|| pi.institute.clone()),
            expected_h_index: pi.h_index,
        };
        let Some(candidate) = self.gateway.resolve_author(&pi.name, &hints).await else {
            return Ok(None);
        };
        if candidate.author_id.is_empty() {
            return Ok(None);
        }
        if !self.store.set_semantic_id(pi.id, &candidate.author_id).await? {
            // The resolved profile already belongs to another node
            return Ok(None);
        }
        Ok(Some(candidate.author_id))
    }

    async fn process_coauthor(
        &self,
        source: &Pi,
        coauthor_id: &str,
        evidence: &CoauthorEvidence,
        origins: &BTreeSet<String>,
        hop: u32,
    ) -> Result<Option<Accepted>> {
        let name = evidence.name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        if !evidence.texts.iter().any(|text| self.relevance.is_relevant(text)) {
            debug!(name, hop, "Skipping co-author, not field-relevant");
            metrics::record_candidate_filtered(PATH, FilterReason::Irrelevant);
            return Ok(None);
        }

        let profile = self.gateway.get_author_profile(coauthor_id).await;
        if !self.is_pi_level(name, profile.as_ref()) {
            metrics::record_candidate_filtered(PATH, FilterReason::BelowPiLevel);
            return Ok(None);
        }

        let record = self.coauthor_record(name, coauthor_id, evidence, origins, profile.as_ref());
        let (id, is_new) = self.store.merge_pi(&record).await?;
        if id == source.id {
            return Ok(None);
        }

        let shared = i32::try_from(evidence.joint_papers).unwrap_or(i32::MAX);
        self.store.upsert_coauthorship(source.id, id, shared).await?;
        metrics::record_pi_discovered(PATH, is_new);
        if is_new {
            info!(
                pi_id = id,
                hop,
                name,
                institute = %record.institute_key(),
                h_index = ?record.h_index,
                tier = ?record.tier,
                via = %source.name,
                "New PI"
            );
        }

        Ok(Some(Accepted { id, is_new }))
    }

    /// Metric gate. With every threshold at zero the gate is off and a
    /// missing profile is tolerated.
    fn is_pi_level(&self, name: &str, profile: Option<&AuthorProfile>) -> bool {
        let gated = self.config.min_h_index > 0 || self.config.min_papers > 0 || self.config.min_recent_papers > 0;
        let Some(profile) = profile else {
            if gated {
                debug!(name, "Skipping co-author, no profile");
            }
            return !gated;
        };

        let h_index = profile.author.h_index.unwrap_or(0);
        let papers = profile
            .author
            .paper_count
            .unwrap_or_else(|| i32::try_from(profile.papers.len()).unwrap_or(i32::MAX));
        let recent = profile
            .recent_papers(crate::since_year(self.config.recent_years))
            .count();

        let passes = h_index >= self.config.min_h_index
            && papers >= self.config.min_papers
            && recent >= self.config.min_recent_papers;
        if !passes {
            debug!(name, h_index, papers, recent, "Filtered out below PI level");
        }
        passes
    }

    fn coauthor_record(
        &self,
        name: &str,
        coauthor_id: &str,
        evidence: &CoauthorEvidence,
        origins: &BTreeSet<String>,
        profile: Option<&AuthorProfile>,
    ) -> PiRecord {
        let affiliations: Vec<&str> = match profile {
            Some(p) if !p.author.affiliations.is_empty() => {
                p.author.affiliations.iter().map(String::as_str).collect()
            }
            _ => evidence.affiliations.iter().map(String::as_str).collect(),
        };
        let institute = affiliations
            .iter()
            .map(|a| a.trim())
            .find(|a| !a.is_empty())
            .unwrap_or_default();

        let mut record = PiRecord::new(name)
            .institute(institute)
            .recommended()
            .semantic_id(coauthor_id)
            .connected_to(origins.iter().filter(|seed| seed.as_str() != name).cloned());
        record.tier = self.rankings.best_tier(affiliations.iter().copied());
        record.last_scraped = Some(Utc::now());

        let texts: Vec<String> = match profile {
            Some(p) if !p.papers.is_empty() => p.papers.iter().map(|paper| paper.text()).collect(),
            _ => evidence.texts.clone(),
        };
        record.research_vector = self.vectorizer.vectorize(texts.iter().map(String::as_str));

        if let Some(author) = profile.map(|p| &p.author) {
            record.h_index = author.h_index;
            record.citations = author.citation_count;
            record.paper_count = author.paper_count;
            record.homepage = author.homepage.clone();
        }
        record
    }

    /// Union adjacent seeds into every candidate's seed set and count the
    /// candidates linked to more than one seed.
    async fn cross_connect(&self) -> Result<usize> {
        let graph = DiscoveryGraph::load(self.store).await?;
        let mut cross = 0;

        for pi in graph.candidates() {
            let adjacent = graph.adjacent_seeds(pi.id);
            if adjacent.is_empty() {
                continue;
            }
            self.store.add_connected_seeds(pi.id, &adjacent).await?;

            let mut all = graph.connected_seeds(pi.id);
            all.extend(adjacent);
            if all.len() > 1 {
                cross += 1;
                info!(pi_id = pi.id, name = %pi.name, seeds = ?all, "Cross-connection");
            }
        }
        Ok(cross)
    }
}

/// Co-authors of `author_id` on papers since `since_year`, keyed by their id
fn collect_coauthors(profile: &AuthorProfile, author_id: &str, since_year: i32) -> BTreeMap<String, CoauthorEvidence> {
    let mut coauthors: BTreeMap<String, CoauthorEvidence> = BTreeMap::new();
    for paper in profile.recent_papers(since_year) {
        let text = paper.text();
        for author in &paper.authors {
            let Some(id) = author.author_id.as_deref().filter(|id| !id.is_empty() && *id != author_id) else {
                continue;
            };
            let entry = coauthors.entry(id.to_string()).or_default();
            if entry.name.is_empty() {
                entry.name = author.name.clone();
            }
            for affiliation in &author.affiliations {
                if !entry.affiliations.contains(affiliation) {
                    entry.affiliations.push(affiliation.clone());
                }
            }
            entry.texts.push(text.clone());
            entry.joint_papers += 1;
        }
    }
    coauthors
}
