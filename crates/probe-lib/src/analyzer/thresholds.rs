//! Fixed threshold limits

/// Load average above which a warning is emitted
pub const LOAD_LIMIT: i64 = 30;

/// Memory usage percentage above which a warning is emitted
pub const MEMORY_LIMIT_PERCENT: i64 = 80;

/// Disk usage percentage above which a warning is emitted
pub const DISK_LIMIT_PERCENT: i64 = 90;

/// Bandwidth usage percentage above which a warning is emitted
pub const BANDWIDTH_LIMIT_PERCENT: i64 = 90;

/// Bytes per reported megabyte of free disk
pub const BYTES_PER_MB: i128 = 1024 * 1024;

/// Bits per second per reported Mbit/s of free bandwidth
pub const BITS_PER_MBIT: i128 = 1_000_000;

/// Threshold limits applied by the analyzer
///
/// Built once at startup from the constants above and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub load_limit: i64,
    pub memory_limit_percent: i64,
    pub disk_limit_percent: i64,
    pub bandwidth_limit_percent: i64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            load_limit: LOAD_LIMIT,
            memory_limit_percent: MEMORY_LIMIT_PERCENT,
            disk_limit_percent: DISK_LIMIT_PERCENT,
            bandwidth_limit_percent: BANDWIDTH_LIMIT_PERCENT,
        }
    }
}
