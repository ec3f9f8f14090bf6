//! Stats poll loop
//!
//! Runs one fetch cycle at a time, forever. Successful cycles are analyzed
//! and their warnings reported; failed cycles are counted and, once
//! `max_attempts` failures happen in a row, a single "stats unavailable"
//! line is reported and the count starts over. The same fixed delay follows
//! every cycle regardless of its outcome.

use super::{
    CycleError, FailureCounter, FailureState, FetchCycle, Sleeper, StatsFetcher, TokioSleeper,
};
use crate::analyzer::{analyze, AnalysisError, ThresholdConfig};
use crate::health::{components, ComponentStatus, HealthRegistry};
use crate::models::MetricsRecord;
use crate::observability::{ProbeMetrics, StructuredLogger};
use crate::report::{ConsoleSink, ReportSink, STATS_UNAVAILABLE};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;
use url::Url;

/// Consecutive failures before the unavailable notice
pub const MAX_ATTEMPTS: u32 = 3;

/// Wait between cycles
pub const POLL_DELAY: Duration = Duration::from_secs(1);

/// Configuration for the poll loop
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Consecutive failed cycles that trigger the unavailable notice (default: 3)
    pub max_attempts: u32,
    /// Fixed delay after every cycle (default: 1 second)
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: POLL_DELAY,
        }
    }
}

/// What a single iteration of the loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The snapshot was fetched and analyzed
    Success { warnings: usize, skipped: usize },
    /// The cycle failed; `reported` is set when this failure hit the limit
    Failure {
        consecutive_failures: u32,
        reported: bool,
    },
}

/// Poll loop that owns the failure count
pub struct PollLoop {
    cycle: FetchCycle,
    thresholds: ThresholdConfig,
    config: PollConfig,
    failures: FailureCounter,
    reporter: Arc<dyn ReportSink>,
    sleeper: Arc<dyn Sleeper>,
    health: HealthRegistry,
    metrics: ProbeMetrics,
    logger: StructuredLogger,
}

impl PollLoop {
    /// Run until the task is dropped
    pub async fn run(mut self) {
        info!(
            stats_url = %self.cycle.url(),
            delay_ms = self.config.delay.as_millis() as u64,
            max_attempts = self.config.max_attempts,
            "Starting stats poll loop"
        );

        loop {
            self.poll_once().await;
        }
    }

    /// Run one cycle, handle its outcome, then wait the fixed delay
    pub async fn poll_once(&mut self) -> PollOutcome {
        let start = Instant::now();
        let result = self.cycle.run_cycle().await;
        self.metrics.observe_fetch_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_cycles();

        let outcome = match result {
            Ok(record) => self.handle_success(&record).await,
            Err(e) => self.handle_failure(&e).await,
        };

        self.metrics.set_consecutive_failures(self.failures.count());
        self.sleeper.sleep(self.config.delay).await;

        outcome
    }

    /// Failed cycles since the last success or the last unavailable notice
    pub fn consecutive_failures(&self) -> u32 {
        self.failures.count()
    }

    async fn handle_success(&mut self, record: &MetricsRecord) -> PollOutcome {
        self.failures.record_success();
        self.health.set_healthy(components::POLLER).await;

        let analysis = analyze(record, &self.thresholds);

        for skipped in &analysis.skipped {
            let AnalysisError::DivideByZero { check } = skipped;
            self.logger.log_check_skipped(&check.to_string());
            self.metrics.inc_skipped_checks();
        }

        for warning in &analysis.warnings {
            let message = warning.to_string();
            self.reporter.report(&message);
            self.logger.log_threshold_exceeded(warning.kind(), &message);
            self.metrics.inc_warnings(warning.kind());
        }

        PollOutcome::Success {
            warnings: analysis.warnings.len(),
            skipped: analysis.skipped.len(),
        }
    }

    async fn handle_failure(&mut self, error: &CycleError) -> PollOutcome {
        self.metrics.inc_cycle_failures(error.reason());

        match self.failures.record_failure() {
            FailureState::Below { consecutive } => {
                self.logger
                    .log_cycle_failure(error.reason(), &error.to_string(), consecutive);

                // Stay unhealthy until a cycle succeeds
                let status = self.health.component_status(components::POLLER).await;
                if status != Some(ComponentStatus::Unhealthy) {
                    self.health
                        .set_degraded(
                            components::POLLER,
                            format!("{} consecutive failed cycles", consecutive),
                        )
                        .await;
                }

                PollOutcome::Failure {
                    consecutive_failures: consecutive,
                    reported: false,
                }
            }
            FailureState::LimitReached { attempts } => {
                self.logger
                    .log_cycle_failure(error.reason(), &error.to_string(), attempts);
                self.reporter.report(STATS_UNAVAILABLE);
                self.logger.log_stats_unavailable(attempts);
                self.metrics.inc_unavailable_reports();
                self.health
                    .set_unhealthy(components::POLLER, STATS_UNAVAILABLE)
                    .await;

                PollOutcome::Failure {
                    consecutive_failures: attempts,
                    reported: true,
                }
            }
        }
    }
}

/// Builder for creating the poll loop
pub struct PollLoopBuilder {
    fetcher: Option<Arc<dyn StatsFetcher>>,
    url: Option<String>,
    reporter: Arc<dyn ReportSink>,
    sleeper: Arc<dyn Sleeper>,
    health: HealthRegistry,
    thresholds: ThresholdConfig,
    config: PollConfig,
}

impl PollLoopBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            fetcher: None,
            url: None,
            reporter: Arc::new(ConsoleSink),
            sleeper: Arc::new(TokioSleeper),
            health: HealthRegistry::new(),
            thresholds: ThresholdConfig::default(),
            config: PollConfig::default(),
        }
    }

    /// Set the stats transport
    pub fn fetcher(mut self, fetcher: Arc<dyn StatsFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the stats endpoint URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the report sink
    pub fn reporter(mut self, reporter: Arc<dyn ReportSink>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set the sleeper used between cycles
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Share a health registry with the loop
    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = health;
        self
    }

    /// Set the threshold limits
    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the failure limit and inter-cycle delay
    pub fn config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the poll loop
    pub fn build(self) -> Result<PollLoop> {
        let fetcher = self
            .fetcher
            .ok_or_else(|| anyhow::anyhow!("Fetcher is required"))?;
        let raw_url = self
            .url
            .ok_or_else(|| anyhow::anyhow!("Stats URL is required"))?;
        let url = Url::parse(&raw_url).with_context(|| format!("Invalid stats URL: {}", raw_url))?;

        if self.config.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }

        Ok(PollLoop {
            logger: StructuredLogger::new(url.as_str()),
            cycle: FetchCycle::new(fetcher, url),
            thresholds: self.thresholds,
            failures: FailureCounter::new(self.config.max_attempts),
            config: self.config,
            reporter: self.reporter,
            sleeper: self.sleeper,
            health: self.health,
            metrics: ProbeMetrics::new(),
        })
    }
}

impl Default for PollLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::{async_trait, FetchError, StatsResponse};
    use crate::report::MemorySink;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses, then keeps refusing connections
    struct ScriptedFetcher {
        responses: Mutex<VecDeque<Result<StatsResponse, FetchError>>>,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<Result<StatsResponse, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl StatsFetcher for ScriptedFetcher {
        async fn fetch(&self, _url: &Url) -> Result<StatsResponse, FetchError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Connect("connection refused".to_string())))
        }
    }

    /// Records requested delays without waiting
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
            tokio::task::yield_now().await;
        }
    }

    fn refused() -> Result<StatsResponse, FetchError> {
        Err(FetchError::Connect("connection refused".to_string()))
    }

    fn ok(body: &str) -> Result<StatsResponse, FetchError> {
        Ok(StatsResponse::ok(body))
    }

    struct Harness {
        poll_loop: PollLoop,
        sink: Arc<MemorySink>,
        sleeper: Arc<RecordingSleeper>,
        health: HealthRegistry,
    }

    fn harness(responses: Vec<Result<StatsResponse, FetchError>>) -> Harness {
        let sink = Arc::new(MemorySink::new());
        let sleeper = Arc::new(RecordingSleeper::default());
        let health = HealthRegistry::new();

        let poll_loop = PollLoopBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new(responses)))
            .url("http://stats.test/_stats")
            .reporter(sink.clone())
            .sleeper(sleeper.clone())
            .health(health.clone())
            .build()
            .unwrap();

        Harness {
            poll_loop,
            sink,
            sleeper,
            health,
        }
    }

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_clean_snapshot_reports_nothing() {
        let mut h = harness(vec![ok("10,1000,100,500,100,1000,100")]);

        let outcome = h.poll_loop.poll_once().await;

        assert_eq!(
            outcome,
            PollOutcome::Success {
                warnings: 0,
                skipped: 0
            }
        );
        assert!(h.sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_warnings_reported_in_check_order() {
        let mut h = harness(vec![ok("40,1000,900,500,480,1000,950")]);

        h.poll_loop.poll_once().await;

        assert_eq!(
            h.sink.lines(),
            vec![
                "Load Average is too high: 40",
                "Memory usage too high: 90%",
                "Free disk space is too low: 0 Mb left",
                "Network bandwidth usage high: 0 Mbit/s available",
            ]
        );
    }

    #[tokio::test]
    async fn test_three_transport_errors_report_once() {
        let mut h = harness(vec![refused(), refused(), refused()]);

        let first = h.poll_loop.poll_once().await;
        assert_eq!(
            first,
            PollOutcome::Failure {
                consecutive_failures: 1,
                reported: false
            }
        );
        assert_eq!(h.poll_loop.consecutive_failures(), 1);

        h.poll_loop.poll_once().await;
        assert_eq!(h.poll_loop.consecutive_failures(), 2);
        assert!(h.sink.lines().is_empty());

        let third = h.poll_loop.poll_once().await;
        assert_eq!(
            third,
            PollOutcome::Failure {
                consecutive_failures: 3,
                reported: true
            }
        );
        assert_eq!(h.sink.lines(), vec![STATS_UNAVAILABLE]);
        assert_eq!(h.poll_loop.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let clean = "10,1000,100,500,100,1000,100";
        let mut h = harness(vec![
            refused(),
            refused(),
            ok(clean),
            refused(),
            refused(),
            ok(clean),
        ]);

        for _ in 0..2 {
            h.poll_loop.poll_once().await;
        }
        assert_eq!(h.poll_loop.consecutive_failures(), 2);

        h.poll_loop.poll_once().await;
        assert_eq!(h.poll_loop.consecutive_failures(), 0);

        for _ in 0..3 {
            h.poll_loop.poll_once().await;
        }
        assert!(h.sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_six_failures_report_twice() {
        let mut h = harness(Vec::new());

        for _ in 0..6 {
            h.poll_loop.poll_once().await;
        }

        assert_eq!(h.sink.lines(), vec![STATS_UNAVAILABLE, STATS_UNAVAILABLE]);
        assert_eq!(h.poll_loop.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_status_and_parse_errors_count_as_failures() {
        let mut h = harness(vec![
            Ok(StatsResponse::with_status(500)),
            ok("1,2,3,4,5,6"),
            ok("1,2,x,4,5,6,7"),
        ]);

        for _ in 0..3 {
            h.poll_loop.poll_once().await;
        }

        assert_eq!(h.sink.lines(), vec![STATS_UNAVAILABLE]);
    }

    #[tokio::test]
    async fn test_zero_totals_are_not_failures() {
        let mut h = harness(vec![refused(), ok("31,0,0,0,0,0,0")]);

        h.poll_loop.poll_once().await;
        let outcome = h.poll_loop.poll_once().await;

        assert_eq!(
            outcome,
            PollOutcome::Success {
                warnings: 1,
                skipped: 3
            }
        );
        assert_eq!(h.poll_loop.consecutive_failures(), 0);
        assert_eq!(h.sink.lines(), vec!["Load Average is too high: 31"]);
    }

    #[tokio::test]
    async fn test_delay_follows_every_cycle() {
        let mut h = harness(vec![ok("10,1000,100,500,100,1000,100"), refused()]);

        h.poll_loop.poll_once().await;
        h.poll_loop.poll_once().await;

        assert_eq!(
            *h.sleeper.delays.lock().unwrap(),
            vec![POLL_DELAY, POLL_DELAY]
        );
    }

    #[tokio::test]
    async fn test_health_follows_cycle_outcomes() {
        let mut h = harness(vec![
            ok("10,1000,100,500,100,1000,100"),
            refused(),
            refused(),
            refused(),
            refused(),
            ok("10,1000,100,500,100,1000,100"),
        ]);

        h.poll_loop.poll_once().await;
        assert_eq!(
            h.health.component_status(components::POLLER).await,
            Some(ComponentStatus::Healthy)
        );

        h.poll_loop.poll_once().await;
        assert_eq!(
            h.health.component_status(components::POLLER).await,
            Some(ComponentStatus::Degraded)
        );

        h.poll_loop.poll_once().await;
        h.poll_loop.poll_once().await;
        assert_eq!(
            h.health.component_status(components::POLLER).await,
            Some(ComponentStatus::Unhealthy)
        );

        // A failure after the notice does not downgrade to degraded
        h.poll_loop.poll_once().await;
        assert_eq!(
            h.health.component_status(components::POLLER).await,
            Some(ComponentStatus::Unhealthy)
        );

        h.poll_loop.poll_once().await;
        assert_eq!(
            h.health.component_status(components::POLLER).await,
            Some(ComponentStatus::Healthy)
        );
    }

    #[tokio::test]
    async fn test_custom_max_attempts() {
        let sink = Arc::new(MemorySink::new());
        let mut poll_loop = PollLoopBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new(Vec::new())))
            .url("http://stats.test/_stats")
            .reporter(sink.clone())
            .sleeper(Arc::new(RecordingSleeper::default()))
            .config(PollConfig {
                max_attempts: 1,
                delay: Duration::ZERO,
            })
            .build()
            .unwrap();

        poll_loop.poll_once().await;
        assert_eq!(sink.lines(), vec![STATS_UNAVAILABLE]);
    }

    #[tokio::test]
    async fn test_run_keeps_polling() {
        let sink = Arc::new(MemorySink::new());
        let sleeper = Arc::new(RecordingSleeper::default());

        let poll_loop = PollLoopBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new(Vec::new())))
            .url("http://stats.test/_stats")
            .reporter(sink.clone())
            .sleeper(sleeper.clone())
            .build()
            .unwrap();

        let handle = tokio::spawn(poll_loop.run());

        while sleeper.delays.lock().unwrap().len() < 9 {
            tokio::task::yield_now().await;
        }
        handle.abort();

        assert!(sink.lines().len() >= 3);
        assert!(sink.lines().iter().all(|line| line == STATS_UNAVAILABLE));
    }

    #[test]
    fn test_builder_missing_fetcher() {
        let result = PollLoopBuilder::new().url("http://stats.test/_stats").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_missing_url() {
        let result = PollLoopBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new(Vec::new())))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_invalid_url() {
        let result = PollLoopBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new(Vec::new())))
            .url("not a url")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let result = PollLoopBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new(Vec::new())))
            .url("http://stats.test/_stats")
            .config(PollConfig {
                max_attempts: 0,
                delay: POLL_DELAY,
            })
            .build();
        assert!(result.is_err());
    }
}
