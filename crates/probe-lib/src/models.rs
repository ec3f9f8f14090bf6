//! Core data models for the stats probe

use serde::Serialize;
use std::fmt;

/// Number of fields in a stats payload
pub const FIELD_COUNT: usize = 7;

/// One snapshot of server statistics as returned by the stats endpoint.
///
/// Field order matches the payload order. Bandwidth values are in bits
/// per second, disk values in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsRecord {
    pub load_average: i64,
    pub memory_total: i64,
    pub memory_used: i64,
    pub disk_total: i64,
    pub disk_used: i64,
    pub bandwidth_total: i64,
    pub bandwidth_used: i64,
}

impl MetricsRecord {
    /// Fields in payload order
    pub fn as_array(&self) -> [i64; FIELD_COUNT] {
        [
            self.load_average,
            self.memory_total,
            self.memory_used,
            self.disk_total,
            self.disk_used,
            self.bandwidth_total,
            self.bandwidth_used,
        ]
    }
}

impl From<[i64; FIELD_COUNT]> for MetricsRecord {
    fn from(fields: [i64; FIELD_COUNT]) -> Self {
        let [
            load_average,
            memory_total,
            memory_used,
            disk_total,
            disk_used,
            bandwidth_total,
            bandwidth_used,
        ] = fields;

        Self {
            load_average,
            memory_total,
            memory_used,
            disk_total,
            disk_used,
            bandwidth_total,
            bandwidth_used,
        }
    }
}

/// A violated threshold.
///
/// `Display` renders the exact line written to the report sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    LoadTooHigh { load_average: i64 },
    MemoryUsageHigh { usage_percent: i128 },
    DiskSpaceLow { free_mb: i128 },
    BandwidthUsageHigh { available_mbit: i128 },
}

impl Warning {
    /// Short identifier used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::LoadTooHigh { .. } => "load",
            Warning::MemoryUsageHigh { .. } => "memory",
            Warning::DiskSpaceLow { .. } => "disk",
            Warning::BandwidthUsageHigh { .. } => "bandwidth",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LoadTooHigh { load_average } => {
                write!(f, "Load Average is too high: {}", load_average)
            }
            Warning::MemoryUsageHigh { usage_percent } => {
                write!(f, "Memory usage too high: {}%", usage_percent)
            }
            Warning::DiskSpaceLow { free_mb } => {
                write!(f, "Free disk space is too low: {} Mb left", free_mb)
            }
            Warning::BandwidthUsageHigh { available_mbit } => {
                write!(
                    f,
                    "Network bandwidth usage high: {} Mbit/s available",
                    available_mbit
                )
            }
        }
    }
}
