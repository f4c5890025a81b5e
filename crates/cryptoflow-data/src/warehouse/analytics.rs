//! Precomputed analytics repository.

use crate::error::Result;
use cryptoflow_core::{CorrelationEntry, VolatilityEntry};
use sqlx::PgPool;

/// Upsert one ordered correlation pair. Callers must pass
/// `asset_a_id <= asset_b_id`; the matrix is mirrored on read.
pub async fn upsert_correlation(pool: &PgPool, entry: &CorrelationEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analytics_correlation
            (asset_a_id, asset_b_id, window_days, correlation, computed_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (asset_a_id, asset_b_id, window_days) DO UPDATE SET
            correlation = EXCLUDED.correlation,
            computed_at = EXCLUDED.computed_at
        "#,
    )
    .bind(entry.asset_a_id)
    .bind(entry.asset_b_id)
    .bind(entry.window_days)
    .bind(entry.correlation)
    .bind(entry.computed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All stored pairs for one lookback window.
pub async fn correlations(pool: &PgPool, window_days: i32) -> Result<Vec<CorrelationEntry>> {
    let entries = sqlx::query_as(
        r#"
        SELECT asset_a_id, asset_b_id, window_days, correlation, computed_at
        FROM analytics_correlation
        WHERE window_days = $1
        ORDER BY asset_a_id, asset_b_id
        "#,
    )
    .bind(window_days)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Upsert one asset's risk metrics for a window.
pub async fn upsert_volatility(pool: &PgPool, entry: &VolatilityEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analytics_volatility
            (asset_id, window_days, volatility, max_drawdown, sharpe_ratio, computed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (asset_id, window_days) DO UPDATE SET
            volatility = EXCLUDED.volatility,
            max_drawdown = EXCLUDED.max_drawdown,
            sharpe_ratio = EXCLUDED.sharpe_ratio,
            computed_at = EXCLUDED.computed_at
        "#,
    )
    .bind(entry.asset_id)
    .bind(entry.window_days)
    .bind(entry.volatility)
    .bind(entry.max_drawdown)
    .bind(entry.sharpe_ratio)
    .bind(entry.computed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Risk metrics for one window, most volatile first, unknowns last.
pub async fn volatilities(pool: &PgPool, window_days: i32) -> Result<Vec<VolatilityEntry>> {
    let entries = sqlx::query_as(
        r#"
        SELECT asset_id, window_days, volatility, max_drawdown, sharpe_ratio, computed_at
        FROM analytics_volatility
        WHERE window_days = $1
        ORDER BY volatility DESC NULLS LAST
        "#,
    )
    .bind(window_days)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
