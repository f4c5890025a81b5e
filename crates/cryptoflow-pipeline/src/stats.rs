//! Job statistics.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters accumulated by one job run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStats {
    /// Items attempted
    pub total: usize,
    /// Items processed successfully
    pub success: usize,
    /// Items that errored
    pub errors: usize,
    /// Items skipped (duplicate or insufficient data)
    pub skipped: usize,
    /// Rows written to the warehouse
    pub records_written: usize,
    /// Wall-clock time
    #[serde(skip)]
    pub elapsed: Duration,
}

impl JobStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Success rate in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// Rows written, as stored on the run row.
    pub fn records(&self) -> i64 {
        self.records_written as i64
    }

    /// Log a structured one-line summary.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            records_written = self.records_written,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "job finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_handles_empty_run() {
        assert_eq!(JobStats::new().success_rate(), 0.0);
    }

    #[test]
    fn success_rate_is_a_percentage() {
        let stats = JobStats {
            total: 4,
            success: 3,
            ..Default::default()
        };
        assert!((stats.success_rate() - 75.0).abs() < 1e-9);
    }
}
