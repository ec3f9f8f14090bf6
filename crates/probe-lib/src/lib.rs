//! Probe library for server statistics monitoring
//!
//! This crate provides the core functionality for:
//! - Fetching the stats payload over HTTP
//! - Parsing the comma-separated snapshot
//! - Threshold analysis and warning reports
//! - The fixed-interval poll loop with consecutive failure tracking
//! - Health checks and observability

pub mod analyzer;
pub mod health;
pub mod models;
pub mod observability;
pub mod parser;
pub mod poller;
pub mod report;

pub use analyzer::{analyze, Analysis, AnalysisError, Check, ThresholdConfig};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ProbeMetrics, StructuredLogger};
pub use parser::{parse, parse_bytes, ParseError};
pub use report::{ConsoleSink, MemorySink, ReportSink, STATS_UNAVAILABLE};
