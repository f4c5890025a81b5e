//! Precomputed analytics rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pairwise correlation entry for one lookback window.
///
/// Only the ordered pair with `asset_a_id <= asset_b_id` is stored; the
/// relationship is symmetric and mirrored on read. `correlation` is NULL
/// when the overlapping history is too short — never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct CorrelationEntry {
    pub asset_a_id: i32,
    pub asset_b_id: i32,
    pub window_days: i32,
    pub correlation: Option<f64>,
    pub computed_at: DateTime<Utc>,
}

/// Per-asset risk metrics for one lookback window.
///
/// Invariants: `volatility >= 0`, `max_drawdown <= 0`. Any field is NULL
/// when there is not enough history to compute it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct VolatilityEntry {
    pub asset_id: i32,
    pub window_days: i32,
    /// Annualized standard deviation of daily log-returns
    pub volatility: Option<f64>,
    /// Most negative (trough - running peak) / peak, as a fraction
    pub max_drawdown: Option<f64>,
    /// Annualized mean return over annualized volatility
    pub sharpe_ratio: Option<f64>,
    pub computed_at: DateTime<Utc>,
}
