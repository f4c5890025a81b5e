//! Daily OHLCV aggregation job.
//!
//! Re-folds the recent snapshot window into daily bars. Upserts keyed
//! on `(asset, date)` make the whole job idempotent, so today's
//! partial bar is simply overwritten by the next run.

use crate::{JobStats, PipelineConfig, Result};
use chrono::{Duration, Utc};
use cryptoflow_analytics::{fold_daily_bars, SnapshotPoint};
use cryptoflow_data::warehouse::{bars, snapshots};
use sqlx::PgPool;
use std::time::Instant;

/// Run one aggregation pass over the configured window.
pub async fn run(pool: &PgPool, config: &PipelineConfig) -> Result<JobStats> {
    let start = Instant::now();
    let mut stats = JobStats::new();

    let now = Utc::now();
    let from = now - Duration::days(config.aggregate.window_days);

    tracing::info!(
        window_days = config.aggregate.window_days,
        "daily bar aggregation started"
    );

    // Calendar dimension must cover every bar date before the upserts.
    bars::ensure_calendar_days(pool, from.date_naive(), now.date_naive()).await?;

    let rows = snapshots::priced_in_range(pool, from, now).await?;
    let points: Vec<SnapshotPoint> = rows
        .iter()
        .filter_map(|s| {
            s.price.map(|price| SnapshotPoint {
                asset_id: s.asset_id,
                ts: s.ts,
                price,
                volume: s.volume_24h,
            })
        })
        .collect();

    let daily_bars = fold_daily_bars(&points);
    tracing::info!(
        snapshots = points.len(),
        bars = daily_bars.len(),
        "snapshots folded"
    );

    for bar in &daily_bars {
        stats.total += 1;

        match bars::upsert(pool, bar).await {
            Ok(()) => {
                stats.success += 1;
                stats.records_written += 1;
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(
                    asset_id = bar.asset_id,
                    date = %bar.date,
                    error = %e,
                    "bar upsert failed"
                );
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
