//! Observability infrastructure for the stats probe
//!
//! Provides:
//! - Prometheus metrics (fetch latency, cycle outcomes, warnings emitted)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Default histogram buckets for fetch latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ProbeMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ProbeMetricsInner {
    fetch_latency_seconds: Histogram,
    cycles_total: IntCounter,
    cycle_failures: IntCounterVec,
    warnings_emitted: IntCounterVec,
    unavailable_reports: IntCounter,
    skipped_checks: IntCounter,
    consecutive_failures: IntGauge,
}

impl ProbeMetricsInner {
    fn new() -> Self {
        Self {
            fetch_latency_seconds: register_histogram!(
                "stats_probe_fetch_latency_seconds",
                "Time spent fetching and parsing the stats payload",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fetch_latency_seconds"),

            cycles_total: register_int_counter!(
                "stats_probe_cycles_total",
                "Total number of fetch cycles attempted"
            )
            .expect("Failed to register cycles_total"),

            cycle_failures: register_int_counter_vec!(
                "stats_probe_cycle_failures_total",
                "Total number of failed fetch cycles by reason",
                &["reason"]
            )
            .expect("Failed to register cycle_failures"),

            warnings_emitted: register_int_counter_vec!(
                "stats_probe_warnings_total",
                "Total number of threshold warnings emitted by check",
                &["check"]
            )
            .expect("Failed to register warnings_emitted"),

            unavailable_reports: register_int_counter!(
                "stats_probe_unavailable_reports_total",
                "Total number of stats unavailable reports"
            )
            .expect("Failed to register unavailable_reports"),

            skipped_checks: register_int_counter!(
                "stats_probe_skipped_checks_total",
                "Total number of threshold checks skipped due to a zero total"
            )
            .expect("Failed to register skipped_checks"),

            consecutive_failures: register_int_gauge!(
                "stats_probe_consecutive_failures",
                "Current number of consecutive failed cycles"
            )
            .expect("Failed to register consecutive_failures"),
        }
    }
}

/// Probe metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ProbeMetrics {
    _private: (),
}

impl Default for ProbeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ProbeMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ProbeMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a fetch latency observation
    pub fn observe_fetch_latency(&self, duration_secs: f64) {
        self.inner().fetch_latency_seconds.observe(duration_secs);
    }

    pub fn inc_cycles(&self) {
        self.inner().cycles_total.inc();
    }

    /// Increment failed cycles for the given reason
    pub fn inc_cycle_failures(&self, reason: &str) {
        self.inner()
            .cycle_failures
            .with_label_values(&[reason])
            .inc();
    }

    /// Increment warnings emitted for the given check
    pub fn inc_warnings(&self, check: &str) {
        self.inner()
            .warnings_emitted
            .with_label_values(&[check])
            .inc();
    }

    pub fn inc_unavailable_reports(&self) {
        self.inner().unavailable_reports.inc();
    }

    pub fn inc_skipped_checks(&self) {
        self.inner().skipped_checks.inc();
    }

    /// Update the consecutive failures gauge
    pub fn set_consecutive_failures(&self, count: u32) {
        self.inner().consecutive_failures.set(i64::from(count));
    }
}

/// Structured logger for probe events
///
/// Provides consistent JSON-formatted logging for cycle outcomes and
/// other significant events.
#[derive(Clone)]
pub struct StructuredLogger {
    stats_url: String,
}

impl StructuredLogger {
    pub fn new(stats_url: impl Into<String>) -> Self {
        Self {
            stats_url: stats_url.into(),
        }
    }

    /// Log probe startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "probe_started",
            stats_url = %self.stats_url,
            probe_version = %version,
            "Stats probe started"
        );
    }

    /// Log probe shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "probe_shutdown",
            stats_url = %self.stats_url,
            reason = %reason,
            "Stats probe shutting down"
        );
    }

    /// Log a failed cycle
    pub fn log_cycle_failure(&self, reason: &str, error: &str, consecutive_failures: u32) {
        debug!(
            event = "cycle_failed",
            stats_url = %self.stats_url,
            reason = %reason,
            error = %error,
            consecutive_failures = consecutive_failures,
            "Fetch cycle failed"
        );
    }

    /// Log a threshold warning
    pub fn log_threshold_exceeded(&self, check: &str, message: &str) {
        info!(
            event = "threshold_exceeded",
            stats_url = %self.stats_url,
            check = %check,
            message = %message,
            "Threshold exceeded"
        );
    }

    /// Log a check skipped because its total was zero
    pub fn log_check_skipped(&self, check: &str) {
        warn!(
            event = "check_skipped",
            stats_url = %self.stats_url,
            check = %check,
            "Threshold check skipped, total is zero"
        );
    }

    /// Log the consolidated unavailable notice
    pub fn log_stats_unavailable(&self, attempts: u32) {
        warn!(
            event = "stats_unavailable",
            stats_url = %self.stats_url,
            attempts = attempts,
            "Stats unavailable after consecutive failures"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_metrics_creation() {
        let metrics = ProbeMetrics::new();

        metrics.observe_fetch_latency(0.01);
        metrics.inc_cycles();
        metrics.inc_cycle_failures("transport");
        metrics.inc_warnings("load");
        metrics.inc_unavailable_reports();
        metrics.inc_skipped_checks();
        metrics.set_consecutive_failures(2);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("http://localhost/_stats");
        assert_eq!(logger.stats_url, "http://localhost/_stats");
    }
}
