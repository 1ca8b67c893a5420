//! Academic Data Gateway
//!
//! Resilient access to an external academic graph:
//! - Per-source pacing with jitter (governor)
//! - Consecutive-failure circuit breaker with a single half-open trial
//! - One retry after a fixed backoff for throttling responses only
//! - Per-attempt timeouts
//!
//! Every failure surfaces to callers as absence (`None` / empty `Vec`).

mod breaker;
mod limiter;
mod provider;
mod semantic_scholar;
mod snapshot;

pub use breaker::{BreakerState, CircuitBreaker};
pub use limiter::SourceLimiter;
pub use provider::{
    AcademicProvider, AuthorCandidate, AuthorProfile, Paper, PaperAuthor, ProviderError,
    ProviderResult, RelationDirection,
};
pub use semantic_scholar::SemanticScholarClient;
pub use snapshot::{CitationLink, SnapshotData, SnapshotProvider};

use crate::config::SourceConfig;
use crate::errors::{AppError, Result};
use crate::identity::{IdentityHints, IdentityResolver, RankedCandidate};
use crate::metrics::{self, CallOutcome};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Candidates requested per author search
const AUTHOR_SEARCH_LIMIT: usize = 10;

/// Create a provider from source configuration
pub fn create_provider(config: &SourceConfig) -> Result<Arc<dyn AcademicProvider>> {
    match config.provider.as_str() {
        "semantic_scholar" => Ok(Arc::new(SemanticScholarClient::new(config)?)),
        "snapshot" => {
            let path = config
                .snapshot_path
                .as_deref()
                .ok_or_else(|| AppError::config("snapshot provider requires snapshot_path"))?;
            Ok(Arc::new(SnapshotProvider::load("snapshot", path)?))
        }
        other => Err(AppError::config(format!("unknown academic provider: {}", other))),
    }
}

/// Breaker permission for one gateway call. Dropping it unsettled frees a
/// half-open trial slot so a cancelled call cannot wedge the breaker.
struct Permit<'a> {
    breaker: &'a Mutex<CircuitBreaker>,
    settled: bool,
}

impl Permit<'_> {
    fn success(mut self) {
        self.settled = true;
        lock(self.breaker).record_success();
    }

    /// Returns true if this failure opened the breaker
    fn failure(mut self) -> bool {
        self.settled = true;
        lock(self.breaker).record_failure()
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            lock(self.breaker).release_trial();
        }
    }
}

fn lock(breaker: &Mutex<CircuitBreaker>) -> MutexGuard<'_, CircuitBreaker> {
    breaker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Gateway over one academic source
pub struct AcademicGateway {
    provider: Arc<dyn AcademicProvider>,
    source: String,
    limiter: Option<SourceLimiter>,
    breaker: Mutex<CircuitBreaker>,
    resolver: IdentityResolver,
    retry_backoff: Duration,
    timeout: Duration,
}

impl AcademicGateway {
    pub fn new(provider: Arc<dyn AcademicProvider>, config: &SourceConfig) -> Self {
        let source = provider.name().to_string();
        Self {
            provider,
            source,
            limiter: SourceLimiter::new(config.min_interval(), config.max_interval()),
            breaker: Mutex::new(CircuitBreaker::new(config.failure_threshold, config.cooldown())),
            resolver: IdentityResolver::default(),
            retry_backoff: config.retry_backoff(),
            timeout: config.timeout(),
        }
    }

    /// Build the provider from config and wrap it
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(create_provider(config)?, config))
    }

    pub fn with_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn breaker_state(&self) -> BreakerState {
        lock(&self.breaker).state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        lock(&self.breaker).consecutive_failures()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Author search, ranked best-first by the identity resolver.
    pub async fn search_author(&self, name: &str, hints: &IdentityHints) -> Vec<RankedCandidate> {
        let candidates = self
            .call("author_search", || self.provider.search_author(name, AUTHOR_SEARCH_LIMIT))
            .await
            .unwrap_or_default();
        self.resolver.rank(name, hints, candidates)
    }

    /// Single best match for a name, if any candidate is acceptable.
    pub async fn resolve_author(&self, name: &str, hints: &IdentityHints) -> Option<AuthorCandidate> {
        self.search_author(name, hints)
            .await
            .into_iter()
            .next()
            .map(|r| r.candidate)
    }

    pub async fn get_author_profile(&self, author_id: &str) -> Option<AuthorProfile> {
        self.call("author_profile", || self.provider.get_author_profile(author_id))
            .await
            .flatten()
    }

    pub async fn get_paper_relations(
        &self,
        paper_id: &str,
        direction: RelationDirection,
        limit: usize,
    ) -> Vec<Paper> {
        let operation = match direction {
            RelationDirection::Citing => "paper_citations",
            RelationDirection::Cited => "paper_references",
        };
        self.call(operation, || {
            self.provider.get_paper_relations(paper_id, direction, limit)
        })
        .await
        .unwrap_or_default()
    }

    pub async fn search_papers(&self, query: &str, since_year: Option<i32>, limit: usize) -> Vec<Paper> {
        self.call("paper_search", || self.provider.search_papers(query, since_year, limit))
            .await
            .unwrap_or_default()
    }

    // ========================================================================
    // Call policy
    // ========================================================================

    fn acquire(&self) -> Option<Permit<'_>> {
        if lock(&self.breaker).try_acquire() {
            Some(Permit {
                breaker: &self.breaker,
                settled: false,
            })
        } else {
            None
        }
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, request: F) -> Option<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let Some(permit) = self.acquire() else {
            debug!(source = %self.source, operation, "Circuit open, skipping call");
            metrics::record_gateway_call(&self.source, operation, CallOutcome::Skipped, Duration::ZERO);
            return None;
        };

        let started = Instant::now();
        let mut retried = false;
        loop {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            let outcome = match tokio::time::timeout(self.timeout, request()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };

            match outcome {
                Ok(value) => {
                    permit.success();
                    metrics::record_gateway_call(&self.source, operation, CallOutcome::Ok, started.elapsed());
                    return Some(value);
                }
                Err(err) if err.is_retryable() && !retried => {
                    warn!(
                        source = %self.source,
                        operation,
                        error = %err,
                        backoff_secs = self.retry_backoff.as_secs(),
                        "Throttled, retrying once after backoff"
                    );
                    retried = true;
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(err) => {
                    let outcome = match err {
                        ProviderError::Throttled { .. } => CallOutcome::Throttled,
                        ProviderError::Timeout => CallOutcome::Timeout,
                        _ => CallOutcome::Error,
                    };
                    warn!(source = %self.source, operation, error = %err, "Academic source call failed");
                    if permit.failure() {
                        metrics::record_breaker_trip(&self.source);
                    }
                    metrics::record_gateway_call(&self.source, operation, outcome, started.elapsed());
                    return None;
                }
            }
        }
    }
}
