//! PI Scout Discovery Engine
//!
//! Grows a graph of principal investigators outward from curated seeds:
//! - Seed profiling against the academic graph
//! - Co-author breadth-first exploration (`frontier`)
//! - Forward/backward citation tracing (`citation`)
//! - Keyword paper search (`topic`)
//! - Profile backfill for path-discovered PIs (`enricher`)
//! - Composite recommendation scoring (`scoring`)

pub mod citation;
pub mod enricher;
pub mod frontier;
pub mod graph;
pub mod pipeline;
pub mod profiler;
pub mod rankings;
pub mod scoring;
pub mod topic;

#[cfg(test)]
pub(crate) mod testing;

pub use citation::{CitationSummary, CitationTracer};
pub use enricher::{EnrichSummary, PiEnricher};
pub use frontier::{FrontierExplorer, FrontierSummary};
pub use graph::DiscoveryGraph;
pub use pipeline::{DiscoveryPipeline, RunSummary};
pub use profiler::{ProfileSummary, SeedProfiler};
pub use rankings::InstitutionRankings;
pub use scoring::{CompositeScorer, ScoreBreakdown, ScoredCandidate};
pub use topic::{TopicDiscovery, TopicSummary};

use chrono::{Datelike, Utc};

/// Current calendar year, the reference point for every "recent" window.
pub(crate) fn current_year() -> i32 {
    Utc::now().year()
}

/// First year inside a lookback of `years` (inclusive).
pub(crate) fn since_year(years: i32) -> i32 {
    current_year() - years
}
