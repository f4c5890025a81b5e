//! Return series construction.

use chrono::NaiveDate;

/// Daily log-returns: `ln(p_t / p_{t-1})`.
///
/// Non-positive prices cannot produce a log-return and are skipped
/// together with their successor interval. Output length is at most
/// `prices.len() - 1`.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Restrict two dated close series to their common dates, preserving
/// chronological order. Inputs must be sorted by date.
pub fn align_series(a: &[(NaiveDate, f64)], b: &[(NaiveDate, f64)]) -> (Vec<f64>, Vec<f64>) {
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out_a.push(a[i].1);
                out_b.push(b[j].1);
                i += 1;
                j += 1;
            }
        }
    }

    (out_a, out_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn log_returns_are_additive() {
        let returns = log_returns(&[100.0, 110.0, 121.0]);
        assert_eq!(returns.len(), 2);
        // ln(110/100) + ln(121/110) == ln(121/100)
        let total: f64 = returns.iter().sum();
        assert!((total - (121.0f64 / 100.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn log_returns_skip_non_positive_prices() {
        assert!(log_returns(&[100.0, 0.0, 100.0]).is_empty());
        assert!(log_returns(&[100.0]).is_empty());
    }

    #[test]
    fn align_keeps_only_common_dates() {
        let a = vec![(date(1), 1.0), (date(2), 2.0), (date(4), 4.0)];
        let b = vec![(date(2), 20.0), (date(3), 30.0), (date(4), 40.0)];

        let (xa, xb) = align_series(&a, &b);
        assert_eq!(xa, vec![2.0, 4.0]);
        assert_eq!(xb, vec![20.0, 40.0]);
    }

    #[test]
    fn align_with_no_overlap_is_empty() {
        let a = vec![(date(1), 1.0)];
        let b = vec![(date(2), 2.0)];

        let (xa, xb) = align_series(&a, &b);
        assert!(xa.is_empty());
        assert!(xb.is_empty());
    }
}
