//! Fixtures shared by the discovery tests

use piscout_common::config::{AppConfig, SourceConfig};
use piscout_common::gateway::{AuthorCandidate, AuthorProfile, Paper, PaperAuthor, SnapshotProvider};
use piscout_common::{AcademicGateway, GraphStore};
use std::sync::Arc;

/// Unpaced source with no retry sleep
pub fn source_config() -> SourceConfig {
    SourceConfig {
        provider: "snapshot".into(),
        min_interval_ms: 0,
        max_interval_ms: 0,
        retry_backoff_secs: 0,
        ..Default::default()
    }
}

/// Default configuration with the PI-level gate disabled
pub fn app_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.sources.semantic_scholar = source_config();
    config.discovery.min_h_index = 0;
    config.discovery.min_papers = 0;
    config.discovery.min_recent_papers = 0;
    config
}

pub fn gateway(provider: SnapshotProvider) -> (AcademicGateway, Arc<SnapshotProvider>) {
    let provider = Arc::new(provider);
    let gateway = AcademicGateway::new(provider.clone(), &source_config());
    (gateway, provider)
}

pub async fn store() -> GraphStore {
    GraphStore::in_memory().await.unwrap()
}

pub fn author(id: &str, name: &str, h_index: i32, affiliation: &str) -> AuthorCandidate {
    AuthorCandidate {
        author_id: id.into(),
        name: name.into(),
        affiliations: if affiliation.is_empty() {
            vec![]
        } else {
            vec![affiliation.into()]
        },
        h_index: Some(h_index),
        citation_count: Some(i64::from(h_index) * 100),
        paper_count: Some(h_index * 2),
        homepage: None,
    }
}

pub fn paper(id: &str, title: &str, abstract_text: &str, year: i32, authors: &[(&str, &str)]) -> Paper {
    Paper {
        paper_id: id.into(),
        title: title.into(),
        abstract_text: (!abstract_text.is_empty()).then(|| abstract_text.to_string()),
        year: Some(year),
        authors: authors
            .iter()
            .map(|(aid, name)| PaperAuthor {
                author_id: Some(aid.to_string()),
                name: name.to_string(),
                affiliations: vec![],
            })
            .collect(),
    }
}

pub fn profile(author: AuthorCandidate, papers: Vec<Paper>) -> AuthorProfile {
    AuthorProfile { author, papers }
}
