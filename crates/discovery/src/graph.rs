//! In-memory discovery graph
//!
//! Snapshot of the graph store used by the scorer and the cross-connection
//! pass: PI nodes plus co-authorship and citation adjacency.

use piscout_common::db::models::Pi;
use piscout_common::db::parse_seed_set;
use piscout_common::errors::Result;
use piscout_common::GraphStore;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Undirected co-authorship adjacency entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoauthorLink {
    pub other: i64,
    pub shared_papers: i32,
}

#[derive(Debug, Default)]
pub struct DiscoveryGraph {
    /// All PIs by id
    nodes: BTreeMap<i64, Pi>,

    /// pi_id -> co-authors
    coauthors: HashMap<i64, Vec<CoauthorLink>>,

    /// pi_id -> citation count summed over both directions
    citation_totals: HashMap<i64, i64>,
}

impl DiscoveryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load nodes and edges from the store
    pub async fn load(store: &GraphStore) -> Result<Self> {
        let mut graph = Self::new();

        for pi in store.get_all_pis().await? {
            graph.add_node(pi);
        }
        for edge in store.coauthorships().await? {
            graph.add_coauthorship(edge.pi_id_1, edge.pi_id_2, edge.shared_papers);
        }
        for edge in store.citations().await? {
            graph.add_citation(edge.citing_pi_id, edge.cited_pi_id, edge.citation_count);
        }

        Ok(graph)
    }

    pub fn add_node(&mut self, pi: Pi) {
        self.nodes.insert(pi.id, pi);
    }

    pub fn add_coauthorship(&mut self, a: i64, b: i64, shared_papers: i32) {
        if a == b {
            return;
        }
        self.coauthors
            .entry(a)
            .or_default()
            .push(CoauthorLink { other: b, shared_papers });
        self.coauthors
            .entry(b)
            .or_default()
            .push(CoauthorLink { other: a, shared_papers });
    }

    pub fn add_citation(&mut self, citing: i64, cited: i64, count: i32) {
        *self.citation_totals.entry(citing).or_default() += i64::from(count);
        if citing != cited {
            *self.citation_totals.entry(cited).or_default() += i64::from(count);
        }
    }

    pub fn node(&self, id: i64) -> Option<&Pi> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn seeds(&self) -> impl Iterator<Item = &Pi> {
        self.nodes.values().filter(|pi| pi.is_seed)
    }

    /// Non-seed PIs in id order
    pub fn candidates(&self) -> impl Iterator<Item = &Pi> {
        self.nodes.values().filter(|pi| !pi.is_seed)
    }

    pub fn coauthors(&self, id: i64) -> &[CoauthorLink] {
        self.coauthors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sum of shared papers over all co-authorship edges of `id`
    pub fn shared_papers(&self, id: i64) -> i64 {
        self.coauthors(id)
            .iter()
            .map(|link| i64::from(link.shared_papers))
            .sum()
    }

    /// Sum of citation counts over edges where `id` cites or is cited
    pub fn citation_total(&self, id: i64) -> i64 {
        self.citation_totals.get(&id).copied().unwrap_or(0)
    }

    /// Seed names recorded on the node
    pub fn connected_seeds(&self, id: i64) -> BTreeSet<String> {
        self.node(id)
            .map(|pi| parse_seed_set(pi.connected_seeds.as_deref()))
            .unwrap_or_default()
    }

    /// Seeds directly adjacent to `id` through co-authorship
    pub fn adjacent_seeds(&self, id: i64) -> BTreeSet<String> {
        self.coauthors(id)
            .iter()
            .filter_map(|link| self.node(link.other))
            .filter(|pi| pi.is_seed)
            .map(|pi| pi.name.clone())
            .collect()
    }

    /// Highest h-index across every PI (seeds included)
    pub fn max_h_index(&self) -> i32 {
        self.nodes
            .values()
            .filter_map(|pi| pi.h_index)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pi(id: i64, name: &str, is_seed: bool) -> Pi {
        let now = Utc::now();
        Pi {
            id,
            name: name.to_string(),
            institute: String::new(),
            surname: piscout_common::text::surname_key(name),
            department: None,
            country: None,
            region: None,
            tier: None,
            scholar_id: None,
            semantic_id: None,
            h_index: Some(id as i32 * 10),
            citations: None,
            paper_count: None,
            homepage: None,
            research_vector: None,
            is_seed,
            is_recommended: !is_seed,
            recommendation_score: None,
            field_score: None,
            connection_score: None,
            institution_score: None,
            h_index_score: None,
            activity_score: None,
            connected_seeds: None,
            last_scraped: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_aggregates_edges_per_node() {
        let mut graph = DiscoveryGraph::new();
        graph.add_node(pi(1, "Seed A", true));
        graph.add_node(pi(2, "Seed B", true));
        graph.add_node(pi(3, "Candidate", false));
        graph.add_coauthorship(1, 3, 2);
        graph.add_coauthorship(3, 2, 5);
        graph.add_coauthorship(3, 3, 9);
        graph.add_citation(3, 1, 4);
        graph.add_citation(2, 3, 1);

        assert_eq!(graph.shared_papers(3), 7);
        assert_eq!(graph.citation_total(3), 5);
        assert_eq!(graph.citation_total(1), 4);
        assert_eq!(
            graph.adjacent_seeds(3).into_iter().collect::<Vec<_>>(),
            vec!["Seed A".to_string(), "Seed B".to_string()]
        );
        assert_eq!(graph.max_h_index(), 30);
        assert_eq!(graph.candidates().count(), 1);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DiscoveryGraph::new();
        assert_eq!(graph.max_h_index(), 0);
        assert_eq!(graph.shared_papers(42), 0);
        assert!(graph.adjacent_seeds(42).is_empty());
    }
}
