//! Dimension row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked asset (dimension row).
///
/// Identity is the upstream `source_id`; everything else is slowly
/// changing and overwritten on each ingestion cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Asset {
    /// Warehouse surrogate key
    pub id: i32,
    /// Stable upstream identifier (e.g. "bitcoin")
    pub source_id: String,
    /// Ticker symbol (e.g. "btc")
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Logo URL, if the source provides one
    pub image_url: Option<String>,
    /// Rank by market cap; None for delisted or unranked assets
    pub market_cap_rank: Option<i32>,
    /// Last time the mutable fields were refreshed
    pub updated_at: DateTime<Utc>,
}
