//! Pearson correlation of return series.

use crate::returns::log_returns;

/// Pearson correlation coefficient between two equally long series.
///
/// Returns `None` — never a coerced zero — when fewer than
/// `min_overlap` observations are available or when either series has
/// no variance.
pub fn pearson(x: &[f64], y: &[f64], min_overlap: usize) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < min_overlap.max(2) {
        return None;
    }
    let x = &x[..n];
    let y = &y[..n];

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let corr = cov / (var_x.sqrt() * var_y.sqrt());
    // Guard against floating point drift past the mathematical bounds
    Some(corr.clamp(-1.0, 1.0))
}

/// Correlation of daily log-returns between two pre-aligned close
/// series (same dates, same order).
pub fn correlation_from_prices(a: &[f64], b: &[f64], min_overlap: usize) -> Option<f64> {
    let ra = log_returns(a);
    let rb = log_returns(b);
    pearson(&ra, &rb, min_overlap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfectly_correlated_series() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let corr = pearson(&x, &y, 5).unwrap();
        assert!((corr - 1.0).abs() < 1e-9);
    }

    #[test]
    fn perfectly_anticorrelated_series() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let corr = pearson(&x, &y, 5).unwrap();
        assert!((corr + 1.0).abs() < 1e-9);
    }

    #[test]
    fn result_stays_in_bounds() {
        let x = vec![0.01, -0.02, 0.015, 0.005, -0.01, 0.02];
        let y = vec![0.008, -0.015, 0.012, 0.003, -0.007, 0.018];
        let corr = pearson(&x, &y, 5).unwrap();
        assert!((-1.0..=1.0).contains(&corr));
    }

    #[test]
    fn sparse_overlap_is_none_not_zero() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![2.0, 4.0, 6.0];
        assert!(pearson(&x, &y, 5).is_none());
    }

    #[test]
    fn constant_series_has_no_correlation() {
        let x = vec![1.0; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(pearson(&x, &y, 5).is_none());
    }

    #[test]
    fn symmetric_in_arguments() {
        let x = vec![0.01, -0.02, 0.015, 0.005, -0.01, 0.02, 0.007];
        let y = vec![0.008, -0.015, 0.012, 0.003, -0.007, 0.018, -0.002];
        assert_eq!(pearson(&x, &y, 5), pearson(&y, &x, 5));
    }

    #[test]
    fn identical_price_series_correlate_to_one() {
        let prices = vec![100.0, 101.0, 99.5, 102.0, 103.5, 101.8];
        let corr = correlation_from_prices(&prices, &prices, 5).unwrap();
        assert!((corr - 1.0).abs() < 1e-9);
    }
}
