//! Pipeline run audit tracking.
//!
//! Every job execution is bracketed by a `pipeline_run` row: opened in
//! `running` state before the job starts, finalized exactly once with
//! the outcome. A crash between the two leaves a `running` row behind,
//! which the health endpoint surfaces as a stalled run.

use crate::Result;
use chrono::Utc;
use cryptoflow_core::RunStatus;
use cryptoflow_data::warehouse::runs;
use sqlx::PgPool;

/// Maximum stored error message length.
const ERROR_MESSAGE_MAX: usize = 500;

/// Handle on one open pipeline run.
pub struct RunTracker {
    pool: PgPool,
    run_id: i64,
    job_id: String,
}

impl RunTracker {
    /// Open a run row in `running` state.
    pub async fn start(pool: &PgPool, job_id: &str) -> Result<Self> {
        let run_id = runs::start(pool, job_id, Utc::now()).await?;
        tracing::info!(job_id = job_id, run_id = run_id, "pipeline run started");

        Ok(Self {
            pool: pool.clone(),
            run_id,
            job_id: job_id.to_string(),
        })
    }

    /// Finalize the run as successful.
    pub async fn complete(self, records_processed: i64) -> Result<()> {
        runs::finish(
            &self.pool,
            self.run_id,
            RunStatus::Success,
            Utc::now(),
            records_processed,
            None,
        )
        .await?;

        tracing::info!(
            job_id = %self.job_id,
            run_id = self.run_id,
            records_processed = records_processed,
            "pipeline run succeeded"
        );
        Ok(())
    }

    /// Finalize the run as failed, keeping a truncated error message.
    pub async fn fail(self, error: &str) -> Result<()> {
        let message = truncate(error, ERROR_MESSAGE_MAX);
        runs::finish(
            &self.pool,
            self.run_id,
            RunStatus::Failed,
            Utc::now(),
            0,
            Some(message),
        )
        .await?;

        tracing::error!(
            job_id = %self.job_id,
            run_id = self.run_id,
            error = message,
            "pipeline run failed"
        );
        Ok(())
    }
}

/// Truncate to at most `max` bytes on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_pass_through() {
        assert_eq!(truncate("boom", 500), "boom");
    }

    #[test]
    fn long_messages_are_cut_on_a_char_boundary() {
        let s = "é".repeat(300);
        let cut = truncate(&s, 499);
        assert!(cut.len() <= 499);
        assert!(s.starts_with(cut));
    }
}
