//! Quality check audit repository.

use crate::error::Result;
use cryptoflow_core::{CheckStatus, QualityCheckResult};
use sqlx::PgPool;

/// Append one check result.
pub async fn insert(
    pool: &PgPool,
    check_name: &str,
    table_name: &str,
    status: CheckStatus,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO quality_check (check_name, table_name, status, details, executed_at)
        VALUES ($1, $2, $3, $4, NOW())
        "#,
    )
    .bind(check_name)
    .bind(table_name)
    .bind(status.as_str())
    .bind(details)
    .execute(pool)
    .await?;

    Ok(())
}

/// One page of raw results, newest first.
pub async fn page(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<QualityCheckResult>, i64)> {
    let checks = sqlx::query_as(
        r#"
        SELECT id, check_name, table_name, status, details, executed_at
        FROM quality_check
        ORDER BY executed_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quality_check")
        .fetch_one(pool)
        .await?;

    Ok((checks, total))
}

/// Per-table status tallies, the raw material for quality scores.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct QualityTableSummary {
    pub table_name: String,
    pub total_checks: i64,
    pub passed: i64,
    pub warnings: i64,
    pub failed: i64,
}

/// Tally check outcomes per table across all recorded history.
pub async fn summary(pool: &PgPool) -> Result<Vec<QualityTableSummary>> {
    let rows = sqlx::query_as(
        r#"
        SELECT
            table_name,
            COUNT(*) AS total_checks,
            COUNT(*) FILTER (WHERE status = 'passed') AS passed,
            COUNT(*) FILTER (WHERE status = 'warning') AS warnings,
            COUNT(*) FILTER (WHERE status = 'failed') AS failed
        FROM quality_check
        GROUP BY table_name
        ORDER BY table_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
