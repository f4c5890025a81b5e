//! Fold raw market snapshots into daily OHLCV bars.

use chrono::{DateTime, Utc};
use cryptoflow_core::domain::DailyBar;
use rust_decimal::Decimal;

/// One priced snapshot observation, as loaded for aggregation.
/// Rows with a NULL price never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPoint {
    pub asset_id: i32,
    pub ts: DateTime<Utc>,
    pub price: Decimal,
    /// Rolling 24h volume reported alongside the snapshot, if any
    pub volume: Option<Decimal>,
}

/// Fold snapshots into one bar per (asset, UTC day).
///
/// Input must be sorted by `(asset_id, ts)` ascending — the warehouse
/// query guarantees this. Within a day: open is the earliest price,
/// close the latest, high/low the extremes, volume the sum of reported
/// volumes. Days with no snapshots simply produce no bar.
pub fn fold_daily_bars(points: &[SnapshotPoint]) -> Vec<DailyBar> {
    let mut bars: Vec<DailyBar> = Vec::new();

    for point in points {
        let date = point.ts.date_naive();
        let volume = point.volume.unwrap_or(Decimal::ZERO);

        match bars.last_mut() {
            Some(bar) if bar.asset_id == point.asset_id && bar.date == date => {
                if point.price > bar.high {
                    bar.high = point.price;
                }
                if point.price < bar.low {
                    bar.low = point.price;
                }
                bar.close = point.price;
                bar.volume += volume;
            }
            _ => {
                bars.push(DailyBar {
                    asset_id: point.asset_id,
                    date,
                    open: point.price,
                    high: point.price,
                    low: point.price,
                    close: point.price,
                    volume,
                });
            }
        }
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use rust_decimal_macros::dec;

    fn point(asset_id: i32, day: u32, hour: u32, price: Decimal, volume: i64) -> SnapshotPoint {
        SnapshotPoint {
            asset_id,
            ts: Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap(),
            price,
            volume: Some(Decimal::from(volume)),
        }
    }

    #[test]
    fn single_day_bar_has_correct_ohlcv() {
        let points = vec![
            point(1, 1, 0, dec!(100), 10),
            point(1, 1, 8, dec!(140), 20),
            point(1, 1, 16, dec!(90), 30),
            point(1, 1, 23, dec!(120), 40),
        ];

        let bars = fold_daily_bars(&points);
        assert_eq!(bars.len(), 1);

        let bar = &bars[0];
        assert_eq!(bar.open, dec!(100));
        assert_eq!(bar.high, dec!(140));
        assert_eq!(bar.low, dec!(90));
        assert_eq!(bar.close, dec!(120));
        assert_eq!(bar.volume, dec!(100));
        assert!(bar.is_consistent());
    }

    #[test]
    fn splits_on_day_and_asset_boundaries() {
        let points = vec![
            point(1, 1, 10, dec!(100), 1),
            point(1, 2, 10, dec!(105), 1),
            point(2, 1, 10, dec!(50), 1),
        ];

        let bars = fold_daily_bars(&points);
        assert_eq!(bars.len(), 3);
        assert_eq!((bars[0].asset_id, bars[0].date.day0()), (1, 0));
        assert_eq!((bars[1].asset_id, bars[1].date.day0()), (1, 1));
        assert_eq!(bars[2].asset_id, 2);
    }

    #[test]
    fn single_snapshot_day_collapses_to_one_price() {
        let bars = fold_daily_bars(&[point(1, 1, 12, dec!(42), 7)]);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, bars[0].close);
        assert_eq!(bars[0].high, bars[0].low);
        assert_eq!(bars[0].volume, dec!(7));
    }

    #[test]
    fn missing_volume_counts_as_zero() {
        let mut a = point(1, 1, 0, dec!(100), 5);
        let mut b = point(1, 1, 1, dec!(101), 0);
        a.volume = Some(dec!(5));
        b.volume = None;

        let bars = fold_daily_bars(&[a, b]);
        assert_eq!(bars[0].volume, dec!(5));
    }

    #[test]
    fn empty_input_yields_no_bars() {
        assert!(fold_daily_bars(&[]).is_empty());
    }
}
