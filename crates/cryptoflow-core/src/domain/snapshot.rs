//! Market snapshot fact rows and the latest-price projection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One market snapshot per asset per poll cycle (fact row).
///
/// Append-only and immutable once written; uniqueness is enforced on
/// `(asset_id, ts)` so re-running a poll cycle inserts nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct MarketSnapshot {
    pub asset_id: i32,
    /// Poll time of the ingestion cycle, truncated to whole seconds
    pub ts: DateTime<Utc>,
    pub price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    /// Rolling 24h traded volume as reported by the source
    pub volume_24h: Option<Decimal>,
    pub change_24h_pct: Option<Decimal>,
    pub circulating_supply: Option<Decimal>,
}

/// A row of the latest-price materialized view: the newest snapshot per
/// asset joined with its dimension metadata.
///
/// Rebuilt wholesale at the end of each ingestion run; readers tolerate
/// staleness of up to one poll interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct LatestPrice {
    pub asset_id: i32,
    pub source_id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub market_cap_rank: Option<i32>,
    pub ts: DateTime<Utc>,
    pub price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub change_24h_pct: Option<Decimal>,
}
