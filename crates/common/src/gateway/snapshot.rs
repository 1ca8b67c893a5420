//! In-memory academic graph
//!
//! Serves author search, profiles, citation relations and paper search from
//! a JSON snapshot. Used for offline runs and as the scripted graph in tests.

use super::provider::{
    AcademicProvider, AuthorCandidate, AuthorProfile, Paper, ProviderResult, RelationDirection,
};
use crate::errors::Result;
use crate::text::name_similarity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `citing` cites `cited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationLink {
    pub citing: String,
    pub cited: String,
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub authors: Vec<AuthorProfile>,
    /// Papers not attached to a profiled author
    #[serde(default)]
    pub papers: Vec<Paper>,
    #[serde(default)]
    pub citations: Vec<CitationLink>,
}

#[derive(Debug, Default)]
pub struct SnapshotProvider {
    name: String,
    authors: Vec<AuthorProfile>,
    papers: HashMap<String, Paper>,
    citations: Vec<CitationLink>,
    calls: AtomicUsize,
}

impl SnapshotProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_data(name: impl Into<String>, data: SnapshotData) -> Self {
        let mut provider = Self::new(name);
        for paper in data.papers {
            provider = provider.with_paper(paper);
        }
        for author in data.authors {
            provider = provider.with_author(author);
        }
        provider.citations = data.citations;
        provider
    }

    /// Load a snapshot JSON file
    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let data: SnapshotData = serde_json::from_str(&raw)?;
        Ok(Self::from_data(name, data))
    }

    pub fn with_author(mut self, profile: AuthorProfile) -> Self {
        for paper in &profile.papers {
            self.papers
                .entry(paper.paper_id.clone())
                .or_insert_with(|| paper.clone());
        }
        self.authors.retain(|a| a.author.author_id != profile.author.author_id);
        self.authors.push(profile);
        self
    }

    pub fn with_paper(mut self, paper: Paper) -> Self {
        self.papers.insert(paper.paper_id.clone(), paper);
        self
    }

    pub fn with_citation(mut self, citing: impl Into<String>, cited: impl Into<String>) -> Self {
        self.citations.push(CitationLink {
            citing: citing.into(),
            cited: cited.into(),
        });
        self
    }

    /// Number of provider calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn count_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl AcademicProvider for SnapshotProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search_author(&self, name: &str, limit: usize) -> ProviderResult<Vec<AuthorCandidate>> {
        self.count_call();
        Ok(self
            .authors
            .iter()
            .filter(|a| name_similarity(name, &a.author.name) >= 0.5)
            .take(limit)
            .map(|a| a.author.clone())
            .collect())
    }

    async fn get_author_profile(&self, author_id: &str) -> ProviderResult<Option<AuthorProfile>> {
        self.count_call();
        Ok(self
            .authors
            .iter()
            .find(|a| a.author.author_id == author_id)
            .cloned())
    }

    async fn get_paper_relations(
        &self,
        paper_id: &str,
        direction: RelationDirection,
        limit: usize,
    ) -> ProviderResult<Vec<Paper>> {
        self.count_call();
        let related = self.citations.iter().filter_map(|link| match direction {
            RelationDirection::Citing if link.cited == paper_id => Some(&link.citing),
            RelationDirection::Cited if link.citing == paper_id => Some(&link.cited),
            _ => None,
        });
        Ok(related
            .filter_map(|id| self.papers.get(id).cloned())
            .take(limit)
            .collect())
    }

    async fn search_papers(
        &self,
        query: &str,
        since_year: Option<i32>,
        limit: usize,
    ) -> ProviderResult<Vec<Paper>> {
        self.count_call();
        let terms: Vec<String> = query
            .split('|')
            .map(|t| t.trim().trim_matches('"').to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let mut hits: Vec<&Paper> = self
            .papers
            .values()
            .filter(|p| since_year.map_or(true, |y| p.is_recent(y)))
            .filter(|p| {
                let text = p.text().to_lowercase();
                terms.iter().any(|t| text.contains(t.as_str()))
            })
            .collect();
        hits.sort_by(|a, b| a.paper_id.cmp(&b.paper_id));
        Ok(hits.into_iter().take(limit).cloned().collect())
    }
}
