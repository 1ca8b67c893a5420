//! Academic data provider seam
//!
//! Raw transport contract plus the record types exchanged with the gateway.
//! Providers report failures as `ProviderError`; the gateway turns those into
//! absence after applying its retry and breaker policy.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The graph API sends `null` for unresolved ids and empty lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Author as returned by author search or embedded in a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorCandidate {
    #[serde(deserialize_with = "null_as_default")]
    pub author_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub affiliations: Vec<String>,
    pub h_index: Option<i32>,
    pub citation_count: Option<i64>,
    pub paper_count: Option<i32>,
    pub homepage: Option<String>,
}

impl AuthorCandidate {
    /// First listed affiliation, used as the PI's institute.
    pub fn primary_affiliation(&self) -> Option<&str> {
        self.affiliations
            .iter()
            .map(|a| a.trim())
            .find(|a| !a.is_empty())
    }
}

/// Author entry on a paper. The id is absent for unresolved authors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperAuthor {
    pub author_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub affiliations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paper {
    #[serde(deserialize_with = "null_as_default")]
    pub paper_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub year: Option<i32>,
    #[serde(deserialize_with = "null_as_default")]
    pub authors: Vec<PaperAuthor>,
}

impl Paper {
    /// Title and abstract joined for relevance checks.
    pub fn text(&self) -> String {
        match self.abstract_text.as_deref() {
            Some(abs) if !abs.is_empty() => format!("{} {}", self.title, abs),
            _ => self.title.clone(),
        }
    }

    /// Published in or after `since_year`. Undated papers are not recent.
    pub fn is_recent(&self, since_year: i32) -> bool {
        self.year.is_some_and(|y| y >= since_year)
    }

    /// Last listed author, taken as the corresponding/senior author.
    ///
    /// This is a convention of the life sciences, not a guarantee. An
    /// unnamed last author yields `None` rather than the one before it.
    pub fn last_author(&self) -> Option<&PaperAuthor> {
        self.authors.last().filter(|a| !a.name.trim().is_empty())
    }

    pub fn has_author(&self, author_id: &str) -> bool {
        self.authors
            .iter()
            .any(|a| a.author_id.as_deref() == Some(author_id))
    }
}

/// Author metrics plus publication list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorProfile {
    #[serde(flatten)]
    pub author: AuthorCandidate,
    #[serde(deserialize_with = "null_as_default")]
    pub papers: Vec<Paper>,
}

impl AuthorProfile {
    pub fn recent_papers(&self, since_year: i32) -> impl Iterator<Item = &Paper> {
        self.papers.iter().filter(move |p| p.is_recent(since_year))
    }
}

/// Direction of a paper relation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationDirection {
    /// Papers citing the given paper (forward)
    Citing,
    /// Papers the given paper cites (backward)
    Cited,
}

impl RelationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationDirection::Citing => "citing",
            RelationDirection::Cited => "cited",
        }
    }
}

/// Transport-level failure of a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("throttled by provider (HTTP {status})")]
    Throttled { status: u16 },

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("provider call timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Map a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            429 | 502 | 503 | 504 => ProviderError::Throttled { status },
            _ => ProviderError::Status { status },
        }
    }

    /// Only rate-limit/overload responses earn the single retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Throttled { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_status(status.as_u16())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Raw access to an academic graph.
///
/// Absence is `Ok(None)` / `Ok(vec![])`, never an error.
#[async_trait]
pub trait AcademicProvider: Send + Sync {
    /// Source name used in logs, metrics and breaker bookkeeping
    fn name(&self) -> &str;

    async fn search_author(&self, name: &str, limit: usize) -> ProviderResult<Vec<AuthorCandidate>>;

    async fn get_author_profile(&self, author_id: &str) -> ProviderResult<Option<AuthorProfile>>;

    async fn get_paper_relations(
        &self,
        paper_id: &str,
        direction: RelationDirection,
        limit: usize,
    ) -> ProviderResult<Vec<Paper>>;

    async fn search_papers(
        &self,
        query: &str,
        since_year: Option<i32>,
        limit: usize,
    ) -> ProviderResult<Vec<Paper>>;
}
