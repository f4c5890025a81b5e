//! Per-asset risk metrics from a daily close series.

use crate::returns::log_returns;

/// Crypto markets trade every day of the year.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Minimum close observations before any metric is computed.
pub const MIN_OBSERVATIONS: usize = 5;

/// Extreme Sharpe values are clamped before storage; near-zero
/// volatility otherwise produces numbers that break downstream sorting.
pub const SHARPE_CLAMP: f64 = 99.0;

/// Risk metrics over one lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskMetrics {
    /// Annualized standard deviation of daily log-returns, always >= 0
    pub volatility: f64,
    /// Most negative (trough - running peak) / peak, always <= 0
    pub max_drawdown: f64,
    /// Annualized mean return over annualized volatility; None when
    /// volatility is zero
    pub sharpe_ratio: Option<f64>,
}

/// Compute risk metrics from a chronological close series.
///
/// Returns `None` when the series is shorter than [`MIN_OBSERVATIONS`]
/// or produces no usable returns — absent history is distinct from a
/// zero metric throughout the warehouse.
pub fn compute_risk(prices: &[f64], periods_per_year: f64) -> Option<RiskMetrics> {
    if prices.len() < MIN_OBSERVATIONS {
        return None;
    }

    let returns = log_returns(prices);
    if returns.is_empty() {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let volatility = variance.sqrt() * periods_per_year.sqrt();

    let max_drawdown = max_drawdown(prices);

    let sharpe_ratio = if volatility > 0.0 {
        let annualized_return = mean * periods_per_year;
        Some((annualized_return / volatility).clamp(-SHARPE_CLAMP, SHARPE_CLAMP))
    } else {
        None
    };

    Some(RiskMetrics {
        volatility,
        max_drawdown,
        sharpe_ratio,
    })
}

/// Largest decline from a running peak, as a non-positive fraction.
/// A monotonically rising series has a drawdown of exactly 0.0.
fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;

    for &price in prices {
        if price > peak {
            peak = price;
        }
        if peak > 0.0 {
            let dd = (price - peak) / peak;
            if dd < worst {
                worst = dd;
            }
        }
    }

    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volatility_is_non_negative() {
        let prices = vec![100.0, 104.0, 98.0, 103.0, 99.0, 105.0];
        let metrics = compute_risk(&prices, PERIODS_PER_YEAR).unwrap();
        assert!(metrics.volatility >= 0.0);
    }

    #[test]
    fn drawdown_is_non_positive() {
        let prices = vec![100.0, 120.0, 80.0, 110.0, 90.0];
        let metrics = compute_risk(&prices, PERIODS_PER_YEAR).unwrap();
        assert!(metrics.max_drawdown <= 0.0);
        // Worst decline: 120 -> 80
        assert!((metrics.max_drawdown - (80.0 - 120.0) / 120.0).abs() < 1e-12);
    }

    #[test]
    fn rising_series_has_zero_drawdown() {
        let prices = vec![100.0, 101.0, 102.0, 103.0, 104.0];
        let metrics = compute_risk(&prices, PERIODS_PER_YEAR).unwrap();
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn sharpe_is_none_when_volatility_is_zero() {
        let prices = vec![100.0; 10];
        let metrics = compute_risk(&prices, PERIODS_PER_YEAR).unwrap();
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert!(metrics.sharpe_ratio.is_none());
    }

    #[test]
    fn sharpe_is_clamped() {
        // Tiny but nonzero volatility with a strong trend
        let prices: Vec<f64> = (0..30).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let metrics = compute_risk(&prices, PERIODS_PER_YEAR).unwrap();
        let sharpe = metrics.sharpe_ratio.unwrap();
        assert!(sharpe <= SHARPE_CLAMP && sharpe >= -SHARPE_CLAMP);
    }

    #[test]
    fn short_history_yields_none() {
        assert!(compute_risk(&[100.0, 101.0], PERIODS_PER_YEAR).is_none());
        assert!(compute_risk(&[], PERIODS_PER_YEAR).is_none());
    }
}
