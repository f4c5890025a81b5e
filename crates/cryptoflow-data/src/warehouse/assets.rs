//! Asset dimension repository.

use crate::error::Result;
use cryptoflow_core::Asset;
use sqlx::PgPool;

/// Write model for the asset dimension upsert.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub source_id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub market_cap_rank: Option<i32>,
}

/// Insert the asset or refresh its mutable fields, keyed on the stable
/// upstream identifier. Returns the surrogate key.
pub async fn upsert(pool: &PgPool, asset: &NewAsset) -> Result<i32> {
    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO dim_asset (source_id, symbol, name, image_url, market_cap_rank, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (source_id) DO UPDATE SET
            symbol = EXCLUDED.symbol,
            name = EXCLUDED.name,
            image_url = EXCLUDED.image_url,
            market_cap_rank = EXCLUDED.market_cap_rank,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(&asset.source_id)
    .bind(&asset.symbol)
    .bind(&asset.name)
    .bind(&asset.image_url)
    .bind(asset.market_cap_rank)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Look up one asset by surrogate key.
pub async fn by_id(pool: &PgPool, id: i32) -> Result<Option<Asset>> {
    let asset = sqlx::query_as(
        r#"
        SELECT id, source_id, symbol, name, image_url, market_cap_rank, updated_at
        FROM dim_asset
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(asset)
}

/// All ranked assets, best rank first.
pub async fn ranked(pool: &PgPool) -> Result<Vec<Asset>> {
    let assets = sqlx::query_as(
        r#"
        SELECT id, source_id, symbol, name, image_url, market_cap_rank, updated_at
        FROM dim_asset
        WHERE market_cap_rank IS NOT NULL
        ORDER BY market_cap_rank
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(assets)
}

/// Number of ranked assets, i.e. the ingestion target population.
pub async fn ranked_count(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM dim_asset WHERE market_cap_rank IS NOT NULL")
            .fetch_one(pool)
            .await?;

    Ok(count)
}
