//! Data quality check job.
//!
//! Six checks per run, each appended to the `quality_check` audit
//! table with a JSON detail payload. Threshold evaluation is kept in
//! pure functions over already-fetched rows.

use crate::config::QualityConfig;
use crate::{JobStats, PipelineConfig, Result};
use chrono::{Duration, Utc};
use cryptoflow_core::{CheckStatus, DailyBar};
use cryptoflow_data::warehouse::{assets, bars, quality, snapshots};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use sqlx::PgPool;
use std::time::Instant;

/// The fixed check battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCheck {
    Freshness,
    Completeness,
    NullPrices,
    PriceAnomaly,
    ReferentialIntegrity,
    OhlcvConsistency,
}

impl QualityCheck {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Freshness => "freshness",
            Self::Completeness => "completeness",
            Self::NullPrices => "null_prices",
            Self::PriceAnomaly => "price_anomaly",
            Self::ReferentialIntegrity => "referential_integrity",
            Self::OhlcvConsistency => "ohlcv_consistency",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::OhlcvConsistency => "fact_daily_bar",
            _ => "fact_market_snapshot",
        }
    }
}

/// One evaluated check: status plus the detail payload.
type Outcome = (CheckStatus, serde_json::Value);

/// Run the full check battery once. A check whose query errors is
/// recorded as failed with the error in details; it never stops the
/// remaining checks.
pub async fn run(pool: &PgPool, config: &PipelineConfig) -> Result<JobStats> {
    let start = Instant::now();
    let mut stats = JobStats::new();
    let cfg = &config.quality;

    let now = Utc::now();
    let since = now - Duration::hours(cfg.lookback_hours);

    tracing::info!(lookback_hours = cfg.lookback_hours, "quality checks started");

    let outcome = freshness(pool, now, cfg).await;
    record(pool, &mut stats, QualityCheck::Freshness, outcome).await;

    let outcome = completeness(pool, now, cfg).await;
    record(pool, &mut stats, QualityCheck::Completeness, outcome).await;

    let outcome = null_prices(pool, since, cfg).await;
    record(pool, &mut stats, QualityCheck::NullPrices, outcome).await;

    let outcome = price_anomaly(pool, since, cfg).await;
    record(pool, &mut stats, QualityCheck::PriceAnomaly, outcome).await;

    let outcome = referential_integrity(pool, since).await;
    record(pool, &mut stats, QualityCheck::ReferentialIntegrity, outcome).await;

    let outcome = ohlcv_consistency(pool, now, cfg).await;
    record(pool, &mut stats, QualityCheck::OhlcvConsistency, outcome).await;

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// Freshness: age of the newest snapshot.
async fn freshness(
    pool: &PgPool,
    now: chrono::DateTime<Utc>,
    cfg: &QualityConfig,
) -> Result<Outcome> {
    let newest = snapshots::newest_ts(pool).await?;
    let age_minutes = newest.map(|ts| (now - ts).num_minutes());
    Ok((
        evaluate_freshness(age_minutes, cfg),
        json!({ "newest_ts": newest, "age_minutes": age_minutes }),
    ))
}

/// Completeness: asset coverage over the last hour.
async fn completeness(
    pool: &PgPool,
    now: chrono::DateTime<Utc>,
    cfg: &QualityConfig,
) -> Result<Outcome> {
    let expected = assets::ranked_count(pool).await?;
    let observed = snapshots::distinct_assets_since(pool, now - Duration::hours(1)).await?;
    let (status, coverage_pct) = evaluate_completeness(observed, expected, cfg);
    Ok((
        status,
        json!({ "observed": observed, "expected": expected, "coverage_pct": coverage_pct }),
    ))
}

/// Null prices in the lookback window.
async fn null_prices(
    pool: &PgPool,
    since: chrono::DateTime<Utc>,
    cfg: &QualityConfig,
) -> Result<Outcome> {
    let (nulls, total) = snapshots::null_price_counts(pool, since).await?;
    Ok((
        evaluate_null_prices(nulls, cfg),
        json!({ "null_rows": nulls, "total_rows": total }),
    ))
}

/// Consecutive-snapshot price jumps beyond the threshold.
async fn price_anomaly(
    pool: &PgPool,
    since: chrono::DateTime<Utc>,
    cfg: &QualityConfig,
) -> Result<Outcome> {
    let points = snapshots::price_points_since(pool, since).await?;
    let points: Vec<(i32, f64)> = points
        .into_iter()
        .filter_map(|(asset_id, _, price)| price.to_f64().map(|p| (asset_id, p)))
        .collect();
    let anomalies = count_anomalies(&points, cfg.anomaly_threshold_pct);
    Ok((
        evaluate_anomalies(anomalies as i64, cfg),
        json!({ "anomalies": anomalies, "threshold_pct": cfg.anomaly_threshold_pct }),
    ))
}

/// Snapshots pointing at a missing asset dimension row.
async fn referential_integrity(pool: &PgPool, since: chrono::DateTime<Utc>) -> Result<Outcome> {
    let orphans = snapshots::orphan_count(pool, since).await?;
    Ok((evaluate_orphans(orphans), json!({ "orphan_rows": orphans })))
}

/// Bars violating high >= low or close outside the range.
async fn ohlcv_consistency(
    pool: &PgPool,
    now: chrono::DateTime<Utc>,
    cfg: &QualityConfig,
) -> Result<Outcome> {
    let recent_bars =
        bars::since(pool, (now - Duration::days(cfg.ohlcv_lookback_days)).date_naive()).await?;
    let inconsistent = count_inconsistent_bars(&recent_bars);
    Ok((
        evaluate_ohlcv(inconsistent as i64, cfg),
        json!({ "inconsistent_bars": inconsistent, "bars_checked": recent_bars.len() }),
    ))
}

/// Append one check result; an insert failure is counted, not fatal.
async fn record(pool: &PgPool, stats: &mut JobStats, check: QualityCheck, outcome: Result<Outcome>) {
    stats.total += 1;

    let (status, details) = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(check = check.name(), error = %e, "check query failed");
            (CheckStatus::Failed, json!({ "error": e.to_string() }))
        }
    };

    if status != CheckStatus::Passed {
        tracing::warn!(
            check = check.name(),
            status = %status,
            details = %details,
            "quality check degraded"
        );
    }

    match quality::insert(pool, check.name(), check.table(), status, Some(&details)).await {
        Ok(()) => {
            stats.success += 1;
            stats.records_written += 1;
        }
        Err(e) => {
            stats.errors += 1;
            tracing::error!(check = check.name(), error = %e, "check insert failed");
        }
    }
}

fn evaluate_freshness(age_minutes: Option<i64>, cfg: &QualityConfig) -> CheckStatus {
    match age_minutes {
        Some(age) if age < cfg.freshness_warn_minutes => CheckStatus::Passed,
        Some(age) if age < cfg.freshness_fail_minutes => CheckStatus::Warning,
        _ => CheckStatus::Failed,
    }
}

fn evaluate_completeness(observed: i64, expected: i64, cfg: &QualityConfig) -> (CheckStatus, f64) {
    if expected <= 0 {
        return (CheckStatus::Failed, 0.0);
    }

    let pct = (observed as f64 / expected as f64) * 100.0;
    let status = if pct >= cfg.completeness_pass_pct {
        CheckStatus::Passed
    } else if pct >= cfg.completeness_warn_pct {
        CheckStatus::Warning
    } else {
        CheckStatus::Failed
    };

    (status, pct)
}

fn evaluate_null_prices(null_count: i64, cfg: &QualityConfig) -> CheckStatus {
    if null_count == 0 {
        CheckStatus::Passed
    } else if null_count <= cfg.null_warn_max {
        CheckStatus::Warning
    } else {
        CheckStatus::Failed
    }
}

/// Count consecutive same-asset price moves whose absolute percent
/// change exceeds the threshold. Input must be ordered by asset then
/// time, as the warehouse query returns it.
pub fn count_anomalies(points: &[(i32, f64)], threshold_pct: f64) -> usize {
    points
        .windows(2)
        .filter(|w| {
            let (prev_asset, prev) = w[0];
            let (cur_asset, cur) = w[1];
            prev_asset == cur_asset
                && prev > 0.0
                && ((cur - prev) / prev).abs() * 100.0 > threshold_pct
        })
        .count()
}

fn evaluate_anomalies(count: i64, cfg: &QualityConfig) -> CheckStatus {
    if count == 0 {
        CheckStatus::Passed
    } else if count <= cfg.anomaly_warn_max {
        CheckStatus::Warning
    } else {
        CheckStatus::Failed
    }
}

fn evaluate_orphans(count: i64) -> CheckStatus {
    if count == 0 {
        CheckStatus::Passed
    } else {
        CheckStatus::Failed
    }
}

/// Count bars violating the OHLC range invariant.
pub fn count_inconsistent_bars(bars: &[DailyBar]) -> usize {
    bars.iter().filter(|b| !b.is_consistent()).count()
}

fn evaluate_ohlcv(count: i64, cfg: &QualityConfig) -> CheckStatus {
    if count == 0 {
        CheckStatus::Passed
    } else if count <= cfg.ohlcv_warn_max {
        CheckStatus::Warning
    } else {
        CheckStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn defaults() -> QualityConfig {
        QualityConfig {
            lookback_hours: 24,
            freshness_warn_minutes: 30,
            freshness_fail_minutes: 60,
            completeness_pass_pct: 90.0,
            completeness_warn_pct: 70.0,
            null_warn_max: 5,
            anomaly_threshold_pct: 50.0,
            anomaly_warn_max: 3,
            ohlcv_warn_max: 5,
            ohlcv_lookback_days: 7,
        }
    }

    #[test]
    fn freshness_degrades_with_age() {
        let cfg = defaults();
        assert_eq!(evaluate_freshness(Some(10), &cfg), CheckStatus::Passed);
        assert_eq!(evaluate_freshness(Some(45), &cfg), CheckStatus::Warning);
        assert_eq!(evaluate_freshness(Some(90), &cfg), CheckStatus::Failed);
        assert_eq!(evaluate_freshness(None, &cfg), CheckStatus::Failed);
    }

    #[test]
    fn completeness_tracks_coverage() {
        let cfg = defaults();
        assert_eq!(evaluate_completeness(48, 50, &cfg).0, CheckStatus::Passed);
        assert_eq!(evaluate_completeness(40, 50, &cfg).0, CheckStatus::Warning);
        assert_eq!(evaluate_completeness(30, 50, &cfg).0, CheckStatus::Failed);
        assert_eq!(evaluate_completeness(0, 0, &cfg).0, CheckStatus::Failed);
    }

    #[test]
    fn small_spike_is_not_an_anomaly_but_large_one_is() {
        let points = vec![(1, 100.0), (1, 100.10), (1, 160.0)];
        // 100 -> 100.10 is 0.1%; 100.10 -> 160 is ~59.8%
        assert_eq!(count_anomalies(&points, 50.0), 1);
    }

    #[test]
    fn anomaly_scan_respects_asset_boundaries() {
        // Price gap between different assets is not a move
        let points = vec![(1, 100.0), (2, 300.0)];
        assert_eq!(count_anomalies(&points, 50.0), 0);
    }

    #[test]
    fn zero_price_cannot_produce_an_anomaly() {
        let points = vec![(1, 0.0), (1, 100.0)];
        assert_eq!(count_anomalies(&points, 50.0), 0);
    }

    #[test]
    fn inverted_bar_is_flagged() {
        let bar = DailyBar {
            asset_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open: dec!(95),
            high: dec!(90),
            low: dec!(100),
            close: dec!(95),
            volume: dec!(0),
        };
        assert_eq!(count_inconsistent_bars(&[bar]), 1);
    }

    #[test]
    fn null_and_ohlcv_thresholds() {
        let cfg = defaults();
        assert_eq!(evaluate_null_prices(0, &cfg), CheckStatus::Passed);
        assert_eq!(evaluate_null_prices(3, &cfg), CheckStatus::Warning);
        assert_eq!(evaluate_null_prices(6, &cfg), CheckStatus::Failed);
        assert_eq!(evaluate_ohlcv(5, &cfg), CheckStatus::Warning);
        assert_eq!(evaluate_ohlcv(6, &cfg), CheckStatus::Failed);
    }

    #[test]
    fn orphans_fail_outright() {
        assert_eq!(evaluate_orphans(0), CheckStatus::Passed);
        assert_eq!(evaluate_orphans(1), CheckStatus::Failed);
    }
}
