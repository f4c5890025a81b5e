//! Daily bar fact repository and calendar dimension maintenance.

use crate::error::Result;
use chrono::NaiveDate;
use cryptoflow_core::DailyBar;
use sqlx::PgPool;

/// Upsert one bar keyed on `(asset_id, date)`. Recomputing a day
/// replaces the previous bar wholesale.
pub async fn upsert(pool: &PgPool, bar: &DailyBar) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO fact_daily_bar (asset_id, date, open, high, low, close, volume)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (asset_id, date) DO UPDATE SET
            open = EXCLUDED.open,
            high = EXCLUDED.high,
            low = EXCLUDED.low,
            close = EXCLUDED.close,
            volume = EXCLUDED.volume
        "#,
    )
    .bind(bar.asset_id)
    .bind(bar.date)
    .bind(bar.open)
    .bind(bar.high)
    .bind(bar.low)
    .bind(bar.close)
    .bind(bar.volume)
    .execute(pool)
    .await?;

    Ok(())
}

/// Bars for one asset since a date, oldest first.
pub async fn for_asset(pool: &PgPool, asset_id: i32, since: NaiveDate) -> Result<Vec<DailyBar>> {
    let bars = sqlx::query_as(
        r#"
        SELECT asset_id, date, open, high, low, close, volume
        FROM fact_daily_bar
        WHERE asset_id = $1 AND date >= $2
        ORDER BY date
        "#,
    )
    .bind(asset_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(bars)
}

/// All bars on or after a date — input for the consistency check.
pub async fn since(pool: &PgPool, since: NaiveDate) -> Result<Vec<DailyBar>> {
    let bars = sqlx::query_as(
        r#"
        SELECT asset_id, date, open, high, low, close, volume
        FROM fact_daily_bar
        WHERE date >= $1
        ORDER BY asset_id, date
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(bars)
}

/// Append calendar dimension rows for every date in the inclusive
/// range. Existing rows are left untouched.
pub async fn ensure_calendar_days(pool: &PgPool, from: NaiveDate, to: NaiveDate) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO dim_date
            (date, year, quarter, month, week, day_of_week, day_of_month, is_weekend)
        SELECT
            d::date,
            EXTRACT(YEAR FROM d)::smallint,
            EXTRACT(QUARTER FROM d)::smallint,
            EXTRACT(MONTH FROM d)::smallint,
            EXTRACT(WEEK FROM d)::smallint,
            EXTRACT(DOW FROM d)::smallint,
            EXTRACT(DAY FROM d)::smallint,
            EXTRACT(DOW FROM d) IN (0, 6)
        FROM generate_series($1::date, $2::date, '1 day'::interval) d
        ON CONFLICT (date) DO NOTHING
        "#,
    )
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
