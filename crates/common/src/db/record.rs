//! Incoming PI data and helpers for the serialized seed set

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

const SEED_SEPARATOR: &str = "; ";

/// Partial PI data from any discovery path. `None` fields never overwrite
/// stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PiRecord {
    pub name: String,
    pub institute: Option<String>,
    pub department: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub tier: Option<i32>,
    pub scholar_id: Option<String>,
    pub semantic_id: Option<String>,
    pub h_index: Option<i32>,
    pub citations: Option<i64>,
    pub paper_count: Option<i32>,
    pub homepage: Option<String>,
    pub research_vector: Option<Vec<f64>>,
    /// Sticky: a seed stays a seed
    pub is_seed: Option<bool>,
    /// Ignored for seeds
    pub is_recommended: Option<bool>,
    /// Unioned into the stored set
    pub connected_seeds: BTreeSet<String>,
    pub last_scraped: Option<DateTime<Utc>>,
}

impl PiRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn institute(mut self, institute: impl Into<String>) -> Self {
        let institute = institute.into();
        self.institute = (!institute.trim().is_empty()).then_some(institute);
        self
    }

    pub fn seed(mut self) -> Self {
        self.is_seed = Some(true);
        self
    }

    pub fn recommended(mut self) -> Self {
        self.is_recommended = Some(true);
        self
    }

    pub fn semantic_id(mut self, id: impl Into<String>) -> Self {
        self.semantic_id = Some(id.into());
        self
    }

    pub fn connected_to<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connected_seeds.extend(seeds.into_iter().map(Into::into));
        self
    }

    /// Trimmed name as stored
    pub fn name_key(&self) -> &str {
        self.name.trim()
    }

    /// Trimmed institute as stored; empty when unknown
    pub fn institute_key(&self) -> &str {
        self.institute.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Parse the stored `"; "`-delimited seed list
pub fn parse_seed_set(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Serialize a seed set; `None` for an empty set
pub fn format_seed_set(seeds: &BTreeSet<String>) -> Option<String> {
    if seeds.is_empty() {
        None
    } else {
        Some(seeds.iter().cloned().collect::<Vec<_>>().join(SEED_SEPARATOR))
    }
}
