//! Market snapshot fact repository and the latest-price projection.

use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use cryptoflow_core::{LatestPrice, MarketSnapshot};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Append one snapshot. Returns false when the `(asset_id, ts)` row
/// already exists — a duplicate poll, not an error.
pub async fn insert(pool: &PgPool, snapshot: &MarketSnapshot) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO fact_market_snapshot
            (asset_id, ts, price, market_cap, volume_24h, change_24h_pct, circulating_supply)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (asset_id, ts) DO NOTHING
        "#,
    )
    .bind(snapshot.asset_id)
    .bind(snapshot.ts)
    .bind(snapshot.price)
    .bind(snapshot.market_cap)
    .bind(snapshot.volume_24h)
    .bind(snapshot.change_24h_pct)
    .bind(snapshot.circulating_supply)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Rebuild the latest-price materialized view from scratch.
pub async fn refresh_latest_prices(pool: &PgPool) -> Result<()> {
    sqlx::query("REFRESH MATERIALIZED VIEW CONCURRENTLY mv_latest_prices")
        .execute(pool)
        .await?;

    Ok(())
}

/// Current latest-price rows, best rank first.
pub async fn latest_prices(pool: &PgPool) -> Result<Vec<LatestPrice>> {
    let rows = sqlx::query_as(
        r#"
        SELECT asset_id, source_id, symbol, name, image_url, market_cap_rank,
               ts, price, market_cap, volume_24h, change_24h_pct
        FROM mv_latest_prices
        ORDER BY market_cap_rank NULLS LAST
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One page of latest-price rows plus the total row count.
pub async fn latest_prices_page(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<LatestPrice>, i64)> {
    let rows = sqlx::query_as(
        r#"
        SELECT asset_id, source_id, symbol, name, image_url, market_cap_rank,
               ts, price, market_cap, volume_24h, change_24h_pct
        FROM mv_latest_prices
        ORDER BY market_cap_rank NULLS LAST
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mv_latest_prices")
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Snapshot history for one asset, oldest first.
pub async fn history(
    pool: &PgPool,
    asset_id: i32,
    since: DateTime<Utc>,
) -> Result<Vec<MarketSnapshot>> {
    let rows = sqlx::query_as(
        r#"
        SELECT asset_id, ts, price, market_cap, volume_24h, change_24h_pct, circulating_supply
        FROM fact_market_snapshot
        WHERE asset_id = $1 AND ts >= $2
        ORDER BY ts
        "#,
    )
    .bind(asset_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Priced snapshots in a half-open time range, ordered by asset then
/// time — the aggregation job folds these into daily bars.
pub async fn priced_in_range(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<MarketSnapshot>> {
    let rows = sqlx::query_as(
        r#"
        SELECT asset_id, ts, price, market_cap, volume_24h, change_24h_pct, circulating_supply
        FROM fact_market_snapshot
        WHERE ts >= $1 AND ts < $2 AND price IS NOT NULL
        ORDER BY asset_id, ts
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Last price per calendar day for one asset since the cutoff.
pub async fn daily_closes(
    pool: &PgPool,
    asset_id: i32,
    since: DateTime<Utc>,
) -> Result<Vec<(NaiveDate, Decimal)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT DISTINCT ON (ts::date) ts::date AS day, price
        FROM fact_market_snapshot
        WHERE asset_id = $1 AND ts >= $2 AND price IS NOT NULL
        ORDER BY ts::date, ts DESC
        "#,
    )
    .bind(asset_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Timestamp of the newest snapshot, if any.
pub async fn newest_ts(pool: &PgPool) -> Result<Option<DateTime<Utc>>> {
    let (ts,): (Option<DateTime<Utc>>,) =
        sqlx::query_as("SELECT MAX(ts) FROM fact_market_snapshot")
            .fetch_one(pool)
            .await?;

    Ok(ts)
}

/// Number of distinct assets with a snapshot since the cutoff.
pub async fn distinct_assets_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(DISTINCT asset_id) FROM fact_market_snapshot WHERE ts > $1")
            .bind(since)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Null-priced and total snapshot counts since the cutoff.
pub async fn null_price_counts(pool: &PgPool, since: DateTime<Utc>) -> Result<(i64, i64)> {
    let counts: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FILTER (WHERE price IS NULL), COUNT(*)
        FROM fact_market_snapshot
        WHERE ts > $1
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Snapshots since the cutoff whose asset dimension row is missing.
pub async fn orphan_count(pool: &PgPool, since: DateTime<Utc>) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM fact_market_snapshot fs
        LEFT JOIN dim_asset da ON da.id = fs.asset_id
        WHERE da.id IS NULL AND fs.ts > $1
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Priced snapshots since the cutoff as `(asset_id, ts, price)`,
/// ordered by asset then time — input for the anomaly scan.
pub async fn price_points_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<(i32, DateTime<Utc>, Decimal)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT asset_id, ts, price
        FROM fact_market_snapshot
        WHERE ts > $1 AND price IS NOT NULL
        ORDER BY asset_id, ts
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
