//! Threshold analysis of stats snapshots
//!
//! Checks run in a fixed order: load, memory, disk, bandwidth. Percentages
//! use truncating integer division so the reported values are exactly
//! reproducible; a value sitting exactly on the limit does not warn.
//! A zero denominator skips the affected check instead of failing the cycle.

mod thresholds;

pub use thresholds::{
    ThresholdConfig, BANDWIDTH_LIMIT_PERCENT, BITS_PER_MBIT, BYTES_PER_MB, DISK_LIMIT_PERCENT,
    LOAD_LIMIT, MEMORY_LIMIT_PERCENT,
};

use crate::models::{MetricsRecord, Warning};
use std::fmt;
use thiserror::Error;

/// Individual threshold checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Load,
    Memory,
    Disk,
    Bandwidth,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Load => write!(f, "load"),
            Check::Memory => write!(f, "memory"),
            Check::Disk => write!(f, "disk"),
            Check::Bandwidth => write!(f, "bandwidth"),
        }
    }
}

/// Reasons a check could not be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("{check} check skipped: total is zero")]
    DivideByZero { check: Check },
}

/// Result of analyzing one snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Violated thresholds in check order
    pub warnings: Vec<Warning>,
    /// Checks that could not be evaluated
    pub skipped: Vec<AnalysisError>,
}

impl Analysis {
    /// Rendered warning lines in check order
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Evaluate every threshold against a snapshot
pub fn analyze(record: &MetricsRecord, config: &ThresholdConfig) -> Analysis {
    let mut analysis = Analysis::default();

    if record.load_average > config.load_limit {
        analysis.warnings.push(Warning::LoadTooHigh {
            load_average: record.load_average,
        });
    }

    match usage_percent(Check::Memory, record.memory_used, record.memory_total) {
        Ok(percent) if percent > i128::from(config.memory_limit_percent) => {
            analysis.warnings.push(Warning::MemoryUsageHigh {
                usage_percent: percent,
            });
        }
        Ok(_) => {}
        Err(e) => analysis.skipped.push(e),
    }

    match usage_percent(Check::Disk, record.disk_used, record.disk_total) {
        Ok(percent) if percent > i128::from(config.disk_limit_percent) => {
            let free = i128::from(record.disk_total) - i128::from(record.disk_used);
            analysis.warnings.push(Warning::DiskSpaceLow {
                free_mb: free / BYTES_PER_MB,
            });
        }
        Ok(_) => {}
        Err(e) => analysis.skipped.push(e),
    }

    match usage_percent(Check::Bandwidth, record.bandwidth_used, record.bandwidth_total) {
        Ok(percent) if percent > i128::from(config.bandwidth_limit_percent) => {
            let free = i128::from(record.bandwidth_total) - i128::from(record.bandwidth_used);
            analysis.warnings.push(Warning::BandwidthUsageHigh {
                available_mbit: free / BITS_PER_MBIT,
            });
        }
        Ok(_) => {}
        Err(e) => analysis.skipped.push(e),
    }

    analysis
}

/// `used * 100 / total`, truncating toward zero.
///
/// Widened to i128 so `used * 100` cannot overflow.
fn usage_percent(check: Check, used: i64, total: i64) -> Result<i128, AnalysisError> {
    if total == 0 {
        return Err(AnalysisError::DivideByZero { check });
    }

    Ok(i128::from(used) * 100 / i128::from(total))
}
