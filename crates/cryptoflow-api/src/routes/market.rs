//! Market data endpoints: latest prices, snapshot history, OHLCV bars.

use crate::error::{db_error, not_found, out_of_range, ApiResult};
use crate::routes::{PageQuery, Paginated};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use cryptoflow_core::{DailyBar, LatestPrice, MarketSnapshot};
use cryptoflow_data::warehouse::{assets, bars, snapshots};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_HISTORY_HOURS: i64 = 720;
const MAX_OHLCV_DAYS: i64 = 365;
const TOP_MOVERS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Hours of history, default 24
    pub hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OhlcvQuery {
    /// Days of bars, default 90
    pub days: Option<i64>,
}

/// Market-wide aggregates over the latest snapshot per asset.
#[derive(Debug, Serialize)]
pub struct MarketOverview {
    pub asset_count: usize,
    pub total_market_cap: Decimal,
    pub total_volume_24h: Decimal,
    /// BTC market cap as a share of the total, percent
    pub btc_dominance_pct: Option<Decimal>,
    pub top_gainers: Vec<LatestPrice>,
    pub top_losers: Vec<LatestPrice>,
    /// Newest snapshot timestamp across all assets
    pub updated_at: Option<DateTime<Utc>>,
}

/// `GET /api/market/overview` — totals, BTC dominance and top movers.
pub async fn overview(State(state): State<Arc<AppState>>) -> ApiResult<Json<MarketOverview>> {
    let rows = snapshots::latest_prices(&state.db).await.map_err(db_error)?;
    Ok(Json(build_overview(rows)))
}

/// Fold the latest-price rows into market-wide aggregates.
pub fn build_overview(rows: Vec<LatestPrice>) -> MarketOverview {
    let total_market_cap: Decimal = rows.iter().filter_map(|r| r.market_cap).sum();
    let total_volume_24h: Decimal = rows.iter().filter_map(|r| r.volume_24h).sum();
    let updated_at = rows.iter().map(|r| r.ts).max();

    let btc_dominance_pct = rows
        .iter()
        .find(|r| r.symbol == "BTC")
        .and_then(|btc| btc.market_cap)
        .and_then(|mcap| mcap.checked_div(total_market_cap))
        .map(|share| (share * Decimal::from(100)).round_dp(2));

    let mut movers: Vec<&LatestPrice> =
        rows.iter().filter(|r| r.change_24h_pct.is_some()).collect();
    movers.sort_by(|a, b| b.change_24h_pct.cmp(&a.change_24h_pct));

    let top_gainers: Vec<LatestPrice> =
        movers.iter().take(TOP_MOVERS).map(|&r| r.clone()).collect();
    let top_losers: Vec<LatestPrice> = movers
        .iter()
        .rev()
        .take(TOP_MOVERS)
        .map(|&r| r.clone())
        .collect();

    MarketOverview {
        asset_count: rows.len(),
        total_market_cap,
        total_volume_24h,
        btc_dominance_pct,
        top_gainers,
        top_losers,
        updated_at,
    }
}

/// `GET /api/market/assets` — paginated latest prices.
pub async fn assets_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<LatestPrice>>> {
    let (limit, offset, page, size) = query.resolve();

    let (rows, total) = snapshots::latest_prices_page(&state.db, limit, offset)
        .await
        .map_err(db_error)?;

    Ok(Json(Paginated::new(rows, total, page, size)))
}

/// `GET /api/market/assets/{id}/history` — raw snapshots, oldest first.
pub async fn asset_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<MarketSnapshot>>> {
    let hours = query.hours.unwrap_or(24);
    if !(1..=MAX_HISTORY_HOURS).contains(&hours) {
        return Err(out_of_range("hours", 1, MAX_HISTORY_HOURS));
    }

    ensure_asset(&state, id).await?;

    let since = Utc::now() - Duration::hours(hours);
    let rows = snapshots::history(&state.db, id, since)
        .await
        .map_err(db_error)?;

    Ok(Json(rows))
}

/// `GET /api/market/assets/{id}/ohlcv` — daily bars, oldest first.
pub async fn asset_ohlcv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<OhlcvQuery>,
) -> ApiResult<Json<Vec<DailyBar>>> {
    let days = query.days.unwrap_or(90);
    if !(1..=MAX_OHLCV_DAYS).contains(&days) {
        return Err(out_of_range("days", 1, MAX_OHLCV_DAYS));
    }

    ensure_asset(&state, id).await?;

    let since = (Utc::now() - Duration::days(days)).date_naive();
    let rows = bars::for_asset(&state.db, id, since)
        .await
        .map_err(db_error)?;

    Ok(Json(rows))
}

async fn ensure_asset(state: &AppState, id: i32) -> ApiResult<()> {
    match assets::by_id(&state.db, id).await.map_err(db_error)? {
        Some(_) => Ok(()),
        None => Err(not_found(format!("Asset {} not found", id))),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(overview))
        .route("/assets", get(assets_page))
        .route("/assets/{id}/history", get(asset_history))
        .route("/assets/{id}/ohlcv", get(asset_ohlcv))
}
