//! Pipeline run audit repository.

use crate::error::Result;
use chrono::{DateTime, Utc};
use cryptoflow_core::{PipelineRun, RunStatus};
use sqlx::PgPool;

/// Open a run in `running` state. Returns the run id to finalize with.
pub async fn start(pool: &PgPool, job_id: &str, started_at: DateTime<Utc>) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO pipeline_run (job_id, status, started_at, records_processed)
        VALUES ($1, $2, $3, 0)
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(RunStatus::Running.as_str())
    .bind(started_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Finalize a run exactly once. The row is never touched again.
pub async fn finish(
    pool: &PgPool,
    id: i64,
    status: RunStatus,
    ended_at: DateTime<Utc>,
    records_processed: i64,
    error_message: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE pipeline_run
        SET status = $2, ended_at = $3, records_processed = $4, error_message = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(ended_at)
    .bind(records_processed)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}

/// One page of run history, newest first, optionally filtered by job.
pub async fn page(
    pool: &PgPool,
    job_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PipelineRun>, i64)> {
    let runs = sqlx::query_as(
        r#"
        SELECT id, job_id, status, started_at, ended_at, records_processed, error_message
        FROM pipeline_run
        WHERE ($1::text IS NULL OR job_id = $1)
        ORDER BY started_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(job_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pipeline_run WHERE ($1::text IS NULL OR job_id = $1)",
    )
    .bind(job_id)
    .fetch_one(pool)
    .await?;

    Ok((runs, total))
}

/// Every job that has ever recorded a run.
pub async fn job_ids(pool: &PgPool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT job_id FROM pipeline_run ORDER BY job_id")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Most recent run for one job.
pub async fn latest_for_job(pool: &PgPool, job_id: &str) -> Result<Option<PipelineRun>> {
    let run = sqlx::query_as(
        r#"
        SELECT id, job_id, status, started_at, ended_at, records_processed, error_message
        FROM pipeline_run
        WHERE job_id = $1
        ORDER BY started_at DESC
        LIMIT 1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    Ok(run)
}
