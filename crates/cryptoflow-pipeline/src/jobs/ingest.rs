//! Market data ingestion job.
//!
//! Polls the market source for the top-ranked assets and appends one
//! snapshot fact per asset, upserting the asset dimension on the way.
//! A duplicate `(asset, ts)` poll is skipped, not an error.

use crate::{JobStats, PipelineConfig, Result};
use chrono::{DateTime, Timelike, Utc};
use cryptoflow_core::MarketSnapshot;
use cryptoflow_data::warehouse::{assets, snapshots, NewAsset};
use cryptoflow_data::{CoinGeckoClient, MarketTicker};
use sqlx::PgPool;
use std::time::Instant;

/// Run one ingestion cycle.
pub async fn run(pool: &PgPool, config: &PipelineConfig) -> Result<JobStats> {
    let start = Instant::now();
    let mut stats = JobStats::new();

    tracing::info!(
        target_assets = config.ingest.target_assets,
        "market ingestion started"
    );

    let client = CoinGeckoClient::new(config.source.clone())?;
    let tickers = client.fetch_top(config.ingest.target_assets).await?;

    // One poll timestamp for the whole cycle keeps the snapshot set
    // per cycle addressable as a unit. Truncated to whole seconds so
    // the (asset, ts) key stays stable across re-runs.
    let now = Utc::now();
    let ts = now.with_nanosecond(0).unwrap_or(now);

    for ticker in &tickers {
        stats.total += 1;

        match ingest_ticker(pool, ticker, ts).await {
            Ok(true) => {
                stats.success += 1;
                stats.records_written += 1;
            }
            Ok(false) => {
                stats.skipped += 1;
                tracing::debug!(source_id = %ticker.id, "duplicate snapshot skipped");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(source_id = %ticker.id, error = %e, "snapshot insert failed");
            }
        }
    }

    if stats.records_written > 0 {
        if let Err(e) = snapshots::refresh_latest_prices(pool).await {
            tracing::warn!(error = %e, "latest-price view refresh failed");
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// Upsert the asset dimension row and append the snapshot fact.
/// Returns false when the snapshot already existed.
async fn ingest_ticker(pool: &PgPool, ticker: &MarketTicker, ts: DateTime<Utc>) -> Result<bool> {
    let asset_id = assets::upsert(
        pool,
        &NewAsset {
            source_id: ticker.id.clone(),
            symbol: ticker.symbol.to_uppercase(),
            name: ticker.name.clone(),
            image_url: ticker.image.clone(),
            market_cap_rank: ticker.market_cap_rank,
        },
    )
    .await?;

    let inserted = snapshots::insert(
        pool,
        &MarketSnapshot {
            asset_id,
            ts,
            price: ticker.current_price,
            market_cap: ticker.market_cap,
            volume_24h: ticker.total_volume,
            change_24h_pct: ticker.price_change_percentage_24h,
            circulating_supply: ticker.circulating_supply,
        },
    )
    .await?;

    Ok(inserted)
}
