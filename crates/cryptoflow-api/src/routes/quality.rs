//! Data quality endpoints: raw check history and per-table scores.

use crate::error::{db_error, ApiResult};
use crate::routes::{PageQuery, Paginated};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use cryptoflow_core::{quality_score, QualityCheckResult};
use cryptoflow_data::warehouse::quality;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct QualitySummaryRow {
    pub table_name: String,
    pub total_checks: i64,
    pub passed: i64,
    pub warnings: i64,
    pub failed: i64,
    /// Passed over total, as a percentage with one decimal
    pub quality_score: f64,
}

/// `GET /api/quality/checks?page=` — raw results, newest first.
pub async fn check_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<QualityCheckResult>>> {
    let (limit, offset, page, size) = query.resolve();

    let (rows, total) = quality::page(&state.db, limit, offset)
        .await
        .map_err(db_error)?;

    Ok(Json(Paginated::new(rows, total, page, size)))
}

/// `GET /api/quality/summary` — per-table tallies and scores.
pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<QualitySummaryRow>>> {
    let tables = quality::summary(&state.db).await.map_err(db_error)?;

    let rows = tables
        .into_iter()
        .map(|t| QualitySummaryRow {
            quality_score: quality_score(t.passed, t.total_checks),
            table_name: t.table_name,
            total_checks: t.total_checks,
            passed: t.passed,
            warnings: t.warnings,
            failed: t.failed,
        })
        .collect();

    Ok(Json(rows))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/checks", get(check_history))
        .route("/summary", get(summary))
}
