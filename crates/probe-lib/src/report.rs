//! Report sinks for user-facing output
//!
//! Everything the probe tells the operator goes through a [`ReportSink`]:
//! one line per violated threshold and the consolidated
//! "stats unavailable" notice. Diagnostics go to tracing instead.

use std::io::Write;
use std::sync::Mutex;

/// Line emitted after too many consecutive failed cycles
pub const STATS_UNAVAILABLE: &str = "Unable to fetch server statistic";

/// Destination for report lines
pub trait ReportSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Writes each report as one line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn report(&self, message: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", message) {
            tracing::warn!(error = %e, "Failed to write report line");
        }
    }
}

/// Keeps reports in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything reported so far
    pub fn take(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn report(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}
