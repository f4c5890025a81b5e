//! Correlation and risk analytics job.
//!
//! For each configured lookback window, computes per-asset risk
//! metrics over daily closes and the pairwise correlation matrix for
//! the top-ranked subset. Only the ordered half of each pair is
//! stored; the read side mirrors the matrix.

use crate::{JobStats, PipelineConfig, Result};
use chrono::{Duration, NaiveDate, Utc};
use cryptoflow_analytics::{align_series, compute_risk, correlation_from_prices};
use cryptoflow_core::{CorrelationEntry, VolatilityEntry};
use cryptoflow_data::warehouse::{analytics, assets, snapshots};
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;
use std::time::Instant;

/// Run one analytics pass over every configured window.
pub async fn run(pool: &PgPool, config: &PipelineConfig) -> Result<JobStats> {
    let start = Instant::now();
    let mut stats = JobStats::new();

    let now = Utc::now();
    let ranked = assets::ranked(pool).await?;

    tracing::info!(
        assets = ranked.len(),
        windows = ?config.analytics.windows,
        "analytics computation started"
    );

    for &window in &config.analytics.windows {
        let since = now - Duration::days(window as i64);

        // Load each asset's close series once per window; both the
        // risk metrics and the correlation matrix read from it.
        let mut series: Vec<(i32, Vec<(NaiveDate, f64)>)> = Vec::with_capacity(ranked.len());
        for asset in &ranked {
            let closes = snapshots::daily_closes(pool, asset.id, since).await?;
            let closes: Vec<(NaiveDate, f64)> = closes
                .into_iter()
                .filter_map(|(date, price)| price.to_f64().map(|p| (date, p)))
                .collect();
            series.push((asset.id, closes));
        }

        for (asset_id, closes) in &series {
            stats.total += 1;

            let prices: Vec<f64> = closes.iter().map(|(_, p)| *p).collect();
            let Some(metrics) = compute_risk(&prices, config.analytics.periods_per_year) else {
                stats.skipped += 1;
                tracing::debug!(asset_id = asset_id, window = window, "history too short");
                continue;
            };

            let entry = VolatilityEntry {
                asset_id: *asset_id,
                window_days: window,
                volatility: Some(metrics.volatility),
                max_drawdown: Some(metrics.max_drawdown),
                sharpe_ratio: metrics.sharpe_ratio,
                computed_at: now,
            };

            match analytics::upsert_volatility(pool, &entry).await {
                Ok(()) => {
                    stats.success += 1;
                    stats.records_written += 1;
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::error!(asset_id = asset_id, error = %e, "volatility upsert failed");
                }
            }
        }

        // Correlation over the top-ranked subset only; the matrix is
        // quadratic in the asset count.
        let top = config.analytics.correlation_assets as usize;
        let subset = &series[..series.len().min(top)];

        for i in 0..subset.len() {
            for j in (i + 1)..subset.len() {
                stats.total += 1;

                let (id_i, closes_i) = &subset[i];
                let (id_j, closes_j) = &subset[j];

                let (aligned_i, aligned_j) = align_series(closes_i, closes_j);
                let correlation =
                    correlation_from_prices(&aligned_i, &aligned_j, config.analytics.min_overlap);

                // Canonical pair order is by asset id, not rank.
                let (asset_a_id, asset_b_id) = if id_i <= id_j {
                    (*id_i, *id_j)
                } else {
                    (*id_j, *id_i)
                };

                let entry = CorrelationEntry {
                    asset_a_id,
                    asset_b_id,
                    window_days: window,
                    correlation,
                    computed_at: now,
                };

                match analytics::upsert_correlation(pool, &entry).await {
                    Ok(()) => {
                        stats.success += 1;
                        stats.records_written += 1;
                    }
                    Err(e) => {
                        stats.errors += 1;
                        tracing::error!(
                            asset_a_id = asset_a_id,
                            asset_b_id = asset_b_id,
                            error = %e,
                            "correlation upsert failed"
                        );
                    }
                }
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
