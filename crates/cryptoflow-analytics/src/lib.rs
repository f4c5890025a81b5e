//! # CryptoFlow Analytics
//!
//! Pure numeric routines backing the analytics and aggregation jobs:
//! - log-return series and date alignment
//! - Pearson correlation with a minimum-overlap guard
//! - annualized volatility, max drawdown, Sharpe ratio
//! - folding raw snapshots into daily OHLCV bars
//!
//! Everything here is synchronous and side-effect free; the jobs own
//! all I/O.

pub mod correlation;
pub mod ohlcv;
pub mod returns;
pub mod risk;

pub use correlation::{correlation_from_prices, pearson};
pub use ohlcv::{fold_daily_bars, SnapshotPoint};
pub use returns::{align_series, log_returns};
pub use risk::{compute_risk, RiskMetrics};
