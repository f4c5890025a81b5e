//! Pipeline observability endpoints: run history and health rollup.

use crate::error::{db_error, ApiResult};
use crate::routes::{PageQuery, Paginated};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use cryptoflow_core::{PipelineRun, RunStatus};
use cryptoflow_data::warehouse::{runs, snapshots};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Data older than this marks the pipeline unhealthy.
const STALE_MINUTES: i64 = 60;

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub job_id: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PipelineHealthResponse {
    /// "healthy" | "degraded" | "unhealthy"
    pub status: String,
    /// Minutes since the newest snapshot, if any data exists
    pub data_age_minutes: Option<i64>,
    /// Latest run per job
    pub jobs: Vec<JobHealth>,
}

#[derive(Debug, Serialize)]
pub struct JobHealth {
    pub job_id: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub records_processed: i64,
    pub error_message: Option<String>,
}

impl From<PipelineRun> for JobHealth {
    fn from(run: PipelineRun) -> Self {
        Self {
            job_id: run.job_id,
            status: run.status,
            started_at: run.started_at,
            ended_at: run.ended_at,
            records_processed: run.records_processed,
            error_message: run.error_message,
        }
    }
}

/// Roll latest-run outcomes and data age into one status string.
pub fn rollup_status(jobs: &[JobHealth], data_age_minutes: Option<i64>) -> &'static str {
    let any_failed = jobs.iter().any(|j| {
        j.status.parse::<RunStatus>().unwrap_or(RunStatus::Failed) == RunStatus::Failed
    });

    let stale = match data_age_minutes {
        Some(age) => age >= STALE_MINUTES,
        None => true,
    };

    if stale {
        "unhealthy"
    } else if any_failed {
        "degraded"
    } else {
        "healthy"
    }
}

/// `GET /api/pipeline/runs?job_id=&page=` — newest first.
pub async fn run_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> ApiResult<Json<Paginated<PipelineRun>>> {
    let (limit, offset, page, size) = PageQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve();

    let (rows, total) = runs::page(&state.db, query.job_id.as_deref(), limit, offset)
        .await
        .map_err(db_error)?;

    Ok(Json(Paginated::new(rows, total, page, size)))
}

/// `GET /api/pipeline/health` — latest run per job plus data age.
pub async fn pipeline_health(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PipelineHealthResponse>> {
    let job_ids = runs::job_ids(&state.db).await.map_err(db_error)?;

    let mut jobs = Vec::with_capacity(job_ids.len());
    for job_id in &job_ids {
        if let Some(run) = runs::latest_for_job(&state.db, job_id)
            .await
            .map_err(db_error)?
        {
            jobs.push(JobHealth::from(run));
        }
    }

    let newest = snapshots::newest_ts(&state.db).await.map_err(db_error)?;
    let data_age_minutes = newest.map(|ts| (Utc::now() - ts).num_minutes());

    let status = rollup_status(&jobs, data_age_minutes).to_string();

    Ok(Json(PipelineHealthResponse {
        status,
        data_age_minutes,
        jobs,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/runs", get(run_history))
        .route("/health", get(pipeline_health))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: &str) -> JobHealth {
        JobHealth {
            job_id: "ingest_market_data".to_string(),
            status: status.to_string(),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            records_processed: 50,
            error_message: None,
        }
    }

    #[test]
    fn fresh_and_successful_is_healthy() {
        assert_eq!(rollup_status(&[job("success")], Some(5)), "healthy");
    }

    #[test]
    fn failed_run_degrades() {
        assert_eq!(
            rollup_status(&[job("success"), job("failed")], Some(5)),
            "degraded"
        );
    }

    #[test]
    fn stale_data_is_unhealthy_regardless_of_runs() {
        assert_eq!(rollup_status(&[job("success")], Some(90)), "unhealthy");
        assert_eq!(rollup_status(&[job("success")], None), "unhealthy");
    }
}
