//! Metrics and observability utilities
//!
//! Thin helpers over the `metrics` facade with standardized naming.
//! No exporter is installed here; the binary decides whether to install one.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use std::time::Duration;

/// Metrics prefix for all PI Scout metrics
pub const METRICS_PREFIX: &str = "piscout";

/// `outcome` label of a gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Ok,
    Error,
    Throttled,
    Timeout,
    /// Rejected by an open breaker without reaching the source
    Skipped,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Ok => "ok",
            CallOutcome::Error => "error",
            CallOutcome::Throttled => "throttled",
            CallOutcome::Timeout => "timeout",
            CallOutcome::Skipped => "skipped",
        }
    }
}

/// `reason` label of a rejected candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// Titles and abstracts below the relevance threshold
    Irrelevant,
    /// Missing profile or metrics under the PI-level thresholds
    BelowPiLevel,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::Irrelevant => "irrelevant",
            FilterReason::BelowPiLevel => "below_pi_level",
        }
    }
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Gateway metrics
    describe_counter!(
        format!("{}_gateway_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Academic source calls by operation and outcome"
    );

    describe_histogram!(
        format!("{}_gateway_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Academic source call latency in seconds"
    );

    describe_counter!(
        format!("{}_breaker_trips_total", METRICS_PREFIX),
        Unit::Count,
        "Times a source circuit breaker opened"
    );

    // Discovery metrics
    describe_counter!(
        format!("{}_pis_discovered_total", METRICS_PREFIX),
        Unit::Count,
        "PIs accepted by a discovery path"
    );

    describe_counter!(
        format!("{}_candidates_filtered_total", METRICS_PREFIX),
        Unit::Count,
        "Candidates rejected by relevance or PI-level filters"
    );

    // Scoring metrics
    describe_histogram!(
        format!("{}_scoring_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Composite scoring pass duration in seconds"
    );

    describe_gauge!(
        format!("{}_scored_candidates", METRICS_PREFIX),
        Unit::Count,
        "Candidates scored in the last pass"
    );
}

/// Record one gateway call. A 404 counts as `ok` with an absent value.
pub fn record_gateway_call(source: &str, operation: &'static str, outcome: CallOutcome, duration: Duration) {
    counter!(
        format!("{}_gateway_calls_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        format!("{}_gateway_call_duration_seconds", METRICS_PREFIX),
        "source" => source.to_string(),
        "operation" => operation
    )
    .record(duration.as_secs_f64());
}

/// Record a breaker transition to open
pub fn record_breaker_trip(source: &str) {
    counter!(
        format!("{}_breaker_trips_total", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record a PI accepted by a discovery path (`coauthor`, `citation`, `topic`)
pub fn record_pi_discovered(path: &'static str, is_new: bool) {
    counter!(
        format!("{}_pis_discovered_total", METRICS_PREFIX),
        "path" => path,
        "new" => if is_new { "true" } else { "false" }
    )
    .increment(1);
}

/// Record a rejected candidate
pub fn record_candidate_filtered(path: &'static str, reason: FilterReason) {
    counter!(
        format!("{}_candidates_filtered_total", METRICS_PREFIX),
        "path" => path,
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record a scoring pass
pub fn record_scoring(candidates: usize, duration: Duration) {
    histogram!(format!("{}_scoring_duration_seconds", METRICS_PREFIX)).record(duration.as_secs_f64());
    gauge!(format!("{}_scored_candidates", METRICS_PREFIX)).set(candidates as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        record_gateway_call("semantic_scholar", "author_search", CallOutcome::Ok, Duration::from_millis(12));
        record_breaker_trip("semantic_scholar");
        record_pi_discovered("coauthor", true);
        record_candidate_filtered("citation", FilterReason::Irrelevant);
        record_scoring(3, Duration::from_millis(5));
    }

    #[test]
    fn test_label_values() {
        let outcomes: Vec<&str> = [
            CallOutcome::Ok,
            CallOutcome::Error,
            CallOutcome::Throttled,
            CallOutcome::Timeout,
            CallOutcome::Skipped,
        ]
        .iter()
        .map(CallOutcome::as_str)
        .collect();
        assert_eq!(outcomes, ["ok", "error", "throttled", "timeout", "skipped"]);
        assert_eq!(FilterReason::Irrelevant.as_str(), "irrelevant");
        assert_eq!(FilterReason::BelowPiLevel.as_str(), "below_pi_level");
    }
}
