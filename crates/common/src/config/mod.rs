//! Configuration management for PI Scout
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! Keyword tables, synonyms and known author ids live here as data rather
//! than inline patterns, so a deployment can retarget the field without a
//! rebuild.

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Graph store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// External academic data sources
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Traversal and filtering configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Composite scorer configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite://piscout.db?mode=rwc` or `sqlite::memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SourcesConfig {
    /// Academic graph provider (Semantic Scholar or an offline snapshot)
    #[serde(default)]
    pub semantic_scholar: SourceConfig,
}

impl SourcesConfig {
    /// All configured sources with their names
    pub fn all(&self) -> Vec<(&'static str, &SourceConfig)> {
        vec![("semantic_scholar", &self.semantic_scholar)]
    }
}

/// Per-source access policy: provider kind, credentials, pacing and breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Provider implementation: `semantic_scholar` or `snapshot`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent as `x-api-key`
    pub api_key: Option<String>,

    /// Refuse to run without an API key
    #[serde(default)]
    pub require_api_key: bool,

    /// Whether the source may be called at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Minimum interval between two calls (0 disables pacing)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Upper bound of the jittered interval
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Consecutive failures before the breaker opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds the breaker stays open before a trial call
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Sleep before the single retry of a throttled call
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// JSON snapshot for the `snapshot` provider
    pub snapshot_path: Option<String>,
}

impl SourceConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms.max(self.min_interval_ms))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when the source can actually be called with its credentials
    pub fn has_credentials(&self) -> bool {
        match self.provider.as_str() {
            "snapshot" => self.snapshot_path.is_some(),
            _ => !self.require_api_key || self.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        }
    }
}

/// A seed PI as handed over by the faculty scrapers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SeedConfig {
    pub name: String,
    #[serde(default)]
    pub institute: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// Pre-resolved academic graph id for a PI name
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct KnownAuthorId {
    pub name: String,
    pub author_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Co-author BFS depth
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,

    /// Papers newer than this many years count as recent
    #[serde(default = "default_recent_years")]
    pub recent_years: i32,

    /// Minimum relevance score to accept a person or paper
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,

    /// Cap per direction when tracing citations
    #[serde(default = "default_citation_max_results")]
    pub citation_max_results: usize,

    /// Recent papers examined per seed by the citation tracer
    #[serde(default = "default_max_papers_per_seed")]
    pub max_papers_per_seed: usize,

    /// PI-level acceptance thresholds for co-authors (0 disables)
    #[serde(default = "default_min_h_index")]
    pub min_h_index: i32,

    #[serde(default = "default_min_papers")]
    pub min_papers: i32,

    #[serde(default = "default_min_recent_papers")]
    pub min_recent_papers: usize,

    /// Keyword paper search for PIs outside the seed network
    #[serde(default)]
    pub topic_discovery: bool,

    #[serde(default = "default_topic_lookback_years")]
    pub topic_lookback_years: i32,

    #[serde(default = "default_citation_max_results")]
    pub topic_max_results: usize,

    /// Fill metrics and vectors of recommended PIs found without a profile
    #[serde(default = "default_enrichment")]
    pub enrichment: bool,

    /// PIs enriched per run (0 means no cap)
    #[serde(default)]
    pub enrich_limit: usize,

    /// Field keywords
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Keyword -> synonym expansion
    #[serde(default = "default_synonyms")]
    pub synonyms: BTreeMap<String, Vec<String>>,

    /// Words that mark an affiliation segment as an institute name
    #[serde(default = "default_institute_hint_words")]
    pub institute_hint_words: Vec<String>,

    #[serde(default)]
    pub known_author_ids: Vec<KnownAuthorId>,

    #[serde(default)]
    pub seeds: Vec<SeedConfig>,

    /// Institution rankings JSON (tiers, companies, aliases)
    pub rankings_path: Option<String>,
}

impl DiscoveryConfig {
    /// Lookup a configured academic graph id by PI name (case-insensitive)
    pub fn known_author_id(&self, name: &str) -> Option<&str> {
        self.known_author_ids
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name.trim()))
            .map(|k| k.author_id.as_str())
    }
}

/// Composite score weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct ScoreWeights {
    #[serde(default = "default_w_field")]
    pub field_similarity: f64,
    #[serde(default = "default_w_connection")]
    pub connection_strength: f64,
    #[serde(default = "default_w_institution")]
    pub institution_ranking: f64,
    #[serde(default = "default_w_h_index")]
    pub h_index: f64,
    #[serde(default = "default_w_recent")]
    pub recent_activity: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.field_similarity
            + self.connection_strength
            + self.institution_ranking
            + self.h_index
            + self.recent_activity
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.field_similarity,
            self.connection_strength,
            self.institution_ranking,
            self.h_index,
            self.recent_activity,
        ]
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            field_similarity: default_w_field(),
            connection_strength: default_w_connection(),
            institution_ranking: default_w_institution(),
            h_index: default_w_h_index(),
            recent_activity: default_w_recent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Lookback for recent activity, in years
    #[serde(default = "default_activity_window_years")]
    pub activity_window_years: f64,

    /// Score floor for the recommended listing
    #[serde(default)]
    pub min_recommend_score: f64,

    /// Compute scores without writing them
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or EnvFilter directive (debug, info, piscout_discovery=debug, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to the startup log
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_database_url() -> String { "sqlite://piscout.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_provider() -> String { "semantic_scholar".to_string() }
fn default_base_url() -> String { "https://api.semanticscholar.org/graph/v1".to_string() }
fn default_enabled() -> bool { true }
fn default_min_interval_ms() -> u64 { 1_000 }
fn default_max_interval_ms() -> u64 { 1_500 }
fn default_failure_threshold() -> u32 { 5 }
fn default_cooldown_secs() -> u64 { 300 }
fn default_retry_backoff_secs() -> u64 { 30 }
fn default_source_timeout() -> u64 { 30 }
fn default_max_hops() -> u32 { 2 }
fn default_recent_years() -> i32 { 5 }
fn default_relevance_threshold() -> f64 { 0.65 }
fn default_citation_max_results() -> usize { 50 }
fn default_max_papers_per_seed() -> usize { 20 }
fn default_enrichment() -> bool { true }
fn default_min_h_index() -> i32 { 10 }
fn default_min_papers() -> i32 { 15 }
fn default_min_recent_papers() -> usize { 3 }
fn default_topic_lookback_years() -> i32 { 2 }
fn default_w_field() -> f64 { 0.30 }
fn default_w_connection() -> f64 { 0.25 }
fn default_w_institution() -> f64 { 0.20 }
fn default_w_h_index() -> f64 { 0.15 }
fn default_w_recent() -> f64 { 0.10 }
fn default_activity_window_years() -> f64 { 2.0 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "piscout-discovery".to_string() }

fn default_keywords() -> Vec<String> {
    [
        "synthetic biology",
        "crispr",
        "cas9",
        "cas12",
        "protein engineering",
        "directed evolution",
        "extremophile",
        "thermophile",
        "archaea",
        "metabolic engineering",
        "genome engineering",
        "gene editing",
        "cell-free",
        "biofoundry",
        "high-throughput screening",
        "microbiology",
        "molecular biology",
        "systems biology",
        "bioinformatics",
        "enzyme engineering",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_synonyms() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("synthetic biology", &["synthetic genomics", "genetic circuit", "bioengineering"]),
        ("crispr", &["crispr-cas", "cas9", "cas12", "cas13", "gene editing", "genome editing"]),
        ("cas9", &["spcas9", "crispr-cas9"]),
        ("cas12", &["cas12a", "cpf1", "crispr-cas12"]),
        ("protein engineering", &["rational protein design", "computational protein design"]),
        ("directed evolution", &["adaptive laboratory evolution", "phage display", "error-prone pcr"]),
        ("extremophile", &["thermophile", "halophile", "psychrophile", "acidophile", "extremozyme"]),
        ("thermophile", &["thermostable enzyme", "thermus", "hyperthermophile"]),
        ("metabolic engineering", &["pathway engineering", "flux balance", "metabolic flux"]),
        ("genome engineering", &["genome editing", "chromosomal engineering"]),
        ("gene editing", &["genome editing", "base editing", "prime editing"]),
        ("cell-free", &["cell-free protein synthesis", "cfps", "tx-tl", "in vitro transcription"]),
        ("high-throughput screening", &["combinatorial screening", "droplet microfluidics"]),
        ("enzyme engineering", &["biocatalysis", "enzyme evolution", "enzyme design"]),
    ];
    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

fn default_institute_hint_words() -> Vec<String> {
    [
        "university",
        "institute",
        "college",
        "school",
        "hospital",
        "centre",
        "center",
        "laboratory",
        "lab",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("discovery.max_hops", i64::from(default_max_hops()))?
            .set_default("database.url", default_database_url())?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SOURCES__SEMANTIC_SCHOLAR__API_KEY=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject configurations that cannot run. Every error returned here is fatal.
    pub fn validate(&self) -> Result<()> {
        let weights = self.scoring.weights;
        if weights.as_array().iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(AppError::config("scoring weights must each be within [0, 1]"));
        }
        if (weights.sum() - 1.0).abs() > 1e-6 {
            return Err(AppError::config(format!(
                "scoring weights must sum to 1.0 (got {:.4})",
                weights.sum()
            )));
        }
        if self.scoring.activity_window_years <= 0.0 {
            return Err(AppError::config("scoring.activity_window_years must be positive"));
        }

        let threshold = self.discovery.relevance_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::config(format!(
                "discovery.relevance_threshold must be within [0, 1] (got {threshold})"
            )));
        }
        if self.discovery.recent_years < 0 || self.discovery.topic_lookback_years < 0 {
            return Err(AppError::config("discovery lookback windows cannot be negative"));
        }

        let mut usable = 0;
        for (name, source) in self.sources.all() {
            if source.failure_threshold == 0 {
                return Err(AppError::config(format!(
                    "sources.{name}.failure_threshold must be at least 1"
                )));
            }
            if source.max_interval_ms < source.min_interval_ms {
                return Err(AppError::config(format!(
                    "sources.{name}.max_interval_ms is below min_interval_ms"
                )));
            }
            if !matches!(source.provider.as_str(), "semantic_scholar" | "snapshot") {
                return Err(AppError::config(format!(
                    "sources.{name}.provider '{}' is not supported",
                    source.provider
                )));
            }
            if source.enabled && source.has_credentials() {
                usable += 1;
            }
        }
        if usable == 0 {
            return Err(AppError::config(
                "no enabled academic source has the credentials it requires",
            ));
        }

        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key: None,
            require_api_key: false,
            enabled: default_enabled(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
            timeout_secs: default_source_timeout(),
            snapshot_path: None,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            recent_years: default_recent_years(),
            relevance_threshold: default_relevance_threshold(),
            citation_max_results: default_citation_max_results(),
            max_papers_per_seed: default_max_papers_per_seed(),
            min_h_index: default_min_h_index(),
            min_papers: default_min_papers(),
            min_recent_papers: default_min_recent_papers(),
            topic_discovery: false,
            topic_lookback_years: default_topic_lookback_years(),
            topic_max_results: default_citation_max_results(),
            enrichment: default_enrichment(),
            enrich_limit: 0,
            keywords: default_keywords(),
            synonyms: default_synonyms(),
            institute_hint_words: default_institute_hint_words(),
            known_author_ids: Vec::new(),
            seeds: Vec::new(),
            rankings_path: None,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            activity_window_years: default_activity_window_years(),
            min_recommend_score: 0.0,
            dry_run: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.discovery.max_hops, 2);
        assert_eq!(config.discovery.citation_max_results, 50);
        assert!((config.scoring.weights.sum() - 1.0).abs() < 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = AppConfig::default();
        config.scoring.weights.h_index = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_missing_required_key_is_fatal() {
        let mut config = AppConfig::default();
        config.sources.semantic_scholar.require_api_key = true;
        config.sources.semantic_scholar.api_key = None;
        assert!(config.validate().unwrap_err().is_fatal());

        config.sources.semantic_scholar.api_key = Some("k".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_disabled_source_is_fatal() {
        let mut config = AppConfig::default();
        config.sources.semantic_scholar.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_provider_needs_path() {
        let mut config = AppConfig::default();
        config.sources.semantic_scholar.provider = "snapshot".into();
        assert!(config.validate().is_err());
        config.sources.semantic_scholar.snapshot_path = Some("graph.json".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_known_author_lookup() {
        let mut config = DiscoveryConfig::default();
        config.known_author_ids.push(KnownAuthorId {
            name: "Feng Zhang".into(),
            author_id: "145892667".into(),
        });
        assert_eq!(config.known_author_id(" feng zhang "), Some("145892667"));
        assert_eq!(config.known_author_id("George Church"), None);
    }
}
