//! Daily OHLCV bar fact rows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for one asset (fact row).
///
/// Upserted by the aggregation job; recomputing a day overwrites the
/// prior bar, so the job is safe to re-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct DailyBar {
    pub asset_id: i32,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Sum of snapshot volumes observed during the day
    pub volume: Decimal,
}

impl DailyBar {
    /// High must dominate low, and close must lie inside the range.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.low && self.close >= self.low && self.close <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn bar(high: i64, low: i64, close: i64) -> DailyBar {
        DailyBar {
            asset_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open: Decimal::from(low),
            high: Decimal::from(high),
            low: Decimal::from(low),
            close: Decimal::from(close),
            volume: Decimal::ZERO,
        }
    }

    #[test]
    fn consistent_bar_passes() {
        assert!(bar(100, 90, 95).is_consistent());
    }

    #[test]
    fn high_below_low_fails() {
        assert!(!bar(90, 100, 95).is_consistent());
    }

    #[test]
    fn close_outside_range_fails() {
        assert!(!bar(100, 90, 110).is_consistent());
    }
}
