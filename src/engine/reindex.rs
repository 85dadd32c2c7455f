//! Event-window reindexing: a fixed calendar grid around an anchor date,
//! forward-filled and rebased so the anchor day reads 100.
//!
//! The grid is calendar-day granular, weekends and holidays included. An
//! anchor can itself fall on a non-trading day (a geopolitical event on a
//! Sunday), and two events land on comparable day offsets regardless of
//! which weekday each one hit — neither works on a trading-day grid.

use super::EngineError;
use crate::asset_key::AssetKey;
use crate::policy::ReindexPolicy;
use crate::time_series::Series;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One asset's forward-filled, rebased window around one event date.
///
/// All arrays are parallel to `offsets`, which runs from `-before` to
/// `+after` inclusive (offset 0 is the anchor day). `raw_values` holds the
/// forward-filled observations before rebasing; `reindexed_values` holds the
/// same values after the policy transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexedEventSeries {
    /// Caller-supplied event identifier
    pub event_id: String,
    /// Asset the window was cut from
    pub asset: AssetKey,
    /// The event date (offset 0)
    pub anchor_date: NaiveDate,
    /// Day offsets from the anchor, `-before..=+after`
    pub offsets: Vec<i64>,
    /// Forward-filled values, pre-transform
    pub raw_values: Vec<f64>,
    /// Rebased values (anchor day = 100)
    pub reindexed_values: Vec<f64>,
}

impl ReindexedEventSeries {
    /// Number of calendar days in the window (`before + after + 1`).
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True only for a degenerate zero-day window; never the case for
    /// values produced by `reindex_around`.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Cuts a `[anchor - before, anchor + after]` calendar window from a raw
/// series, forward-fills every day, and rebases it to 100 at the anchor.
///
/// The anchor value is the series value on the anchor date when present,
/// otherwise the nearest value strictly before it — never a future one.
/// Days with no observation fill from the most recent prior date; days
/// before the first observation fall back to the first available value in
/// the series, and the anchor resolves through the same rule, so offset 0
/// always rebases to exactly 100.
///
/// # Errors
/// - `EngineError::NoData` when the series is empty or every observation
///   lies after the window end (nothing to observe or fill from).
/// - `EngineError::DivisionByZero` when the policy is multiplicative and
///   the anchor value is exactly zero.
pub fn reindex_around(
    series: &Series,
    asset: &AssetKey,
    event_id: &str,
    anchor: NaiveDate,
    before: u32,
    after: u32,
    policy: ReindexPolicy,
) -> Result<ReindexedEventSeries, EngineError> {
    let window_end = anchor + Duration::days(after as i64);

    let first = match series.first() {
        Some(point) if point.date <= window_end => point,
        _ => {
            return Err(EngineError::NoData {
                asset: asset.to_string(),
            })
        }
    };
    let fallback = first.value;

    let anchor_value = series
        .at_or_before(anchor)
        .map(|p| p.value)
        .unwrap_or(fallback);
    if policy == ReindexPolicy::Multiplicative && anchor_value == 0.0 {
        return Err(EngineError::DivisionByZero {
            asset: Some(asset.to_string()),
            index: before as usize,
        });
    }

    let len = before as usize + after as usize + 1;
    let mut offsets = Vec::with_capacity(len);
    let mut raw_values = Vec::with_capacity(len);
    let mut reindexed_values = Vec::with_capacity(len);

    for offset in -(before as i64)..=after as i64 {
        let day = anchor + Duration::days(offset);
        let raw = series
            .at_or_before(day)
            .map(|p| p.value)
            .unwrap_or(fallback);

        offsets.push(offset);
        raw_values.push(raw);
        reindexed_values.push(policy.apply(raw, anchor_value));
    }

    Ok(ReindexedEventSeries {
        event_id: event_id.to_string(),
        asset: asset.clone(),
        anchor_date: anchor,
        offsets,
        raw_values,
        reindexed_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_series::TimePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn key(ticker: &str) -> AssetKey {
        AssetKey::new(ticker).unwrap()
    }

    fn daily_series(start: NaiveDate, values: &[f64]) -> Series {
        Series::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| TimePoint::new(start + Duration::days(i as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_window_length_and_offsets() {
        let series = daily_series(d(2024, 1, 1), &[100.0; 120]);
        let out = reindex_around(
            &series,
            &key("AAPL"),
            "evt",
            d(2024, 2, 15),
            30,
            60,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();

        assert_eq!(out.len(), 91);
        assert_eq!(out.offsets.first(), Some(&-30));
        assert_eq!(out.offsets.last(), Some(&60));
        assert_eq!(out.raw_values.len(), 91);
        assert_eq!(out.reindexed_values.len(), 91);
    }

    #[test]
    fn test_anchor_identity_both_policies() {
        let series = daily_series(d(2024, 1, 1), &[37.5, 38.0, 41.0, 40.0, 39.5, 42.0]);
        for policy in [ReindexPolicy::Multiplicative, ReindexPolicy::Additive] {
            let out = reindex_around(&series, &key("X"), "evt", d(2024, 1, 4), 2, 2, policy)
                .unwrap();
            let zero_pos = out.offsets.iter().position(|&o| o == 0).unwrap();
            assert_eq!(
                out.reindexed_values[zero_pos], 100.0,
                "anchor must rebase to 100 under {:?}",
                policy
            );
        }
    }

    #[test]
    fn test_reindex_worked_example() {
        // Value 50 on the anchor, 55 five days later
        let mut values = vec![50.0; 6];
        values[5] = 55.0;
        let series = daily_series(d(2024, 6, 10), &values);
        let anchor = d(2024, 6, 10);

        let mult = reindex_around(
            &series,
            &key("X"),
            "evt",
            anchor,
            0,
            5,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();
        assert_eq!(*mult.reindexed_values.last().unwrap(), 110.0);

        let add = reindex_around(
            &series,
            &key("X"),
            "evt",
            anchor,
            0,
            5,
            ReindexPolicy::Additive,
        )
        .unwrap();
        assert_eq!(*add.reindexed_values.last().unwrap(), 105.0);
    }

    #[test]
    fn test_forward_fill_weekend_gap() {
        // Friday and Monday observed; Saturday/Sunday fill from Friday
        let series = Series::new(vec![
            TimePoint::new(d(2024, 1, 5), 200.0),  // Fri
            TimePoint::new(d(2024, 1, 8), 210.0),  // Mon
        ])
        .unwrap();

        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 5),
            0,
            3,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();

        assert_eq!(out.raw_values, vec![200.0, 200.0, 200.0, 210.0]);
        assert_eq!(out.reindexed_values, vec![100.0, 100.0, 100.0, 105.0]);
    }

    #[test]
    fn test_forward_fill_noop_on_gapless_range() {
        let values: Vec<f64> = (0..11).map(|i| 100.0 + i as f64).collect();
        let series = daily_series(d(2024, 3, 1), &values);

        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 3, 6),
            5,
            5,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();

        // No gaps: raw values are exactly the series restricted to the range
        assert_eq!(out.raw_values, values);
    }

    #[test]
    fn test_anchor_on_non_trading_day_uses_prior_value() {
        // Anchor Sunday the 7th; last observation Friday the 5th at 80
        let series = Series::new(vec![
            TimePoint::new(d(2024, 1, 5), 80.0),
            TimePoint::new(d(2024, 1, 8), 88.0),
        ])
        .unwrap();

        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 7),
            1,
            1,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();

        // Anchor value is Friday's 80, never Monday's 88
        assert_eq!(out.raw_values, vec![80.0, 80.0, 88.0]);
        assert_eq!(out.reindexed_values, vec![100.0, 100.0, 110.0]);
    }

    #[test]
    fn test_leading_offsets_fall_back_to_first_available() {
        // Series starts mid-window; earlier offsets use the first value
        let series = daily_series(d(2024, 1, 10), &[60.0, 61.0, 62.0, 63.0, 64.0]);

        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 12),
            5,
            2,
            ReindexPolicy::Additive,
        )
        .unwrap();

        // Offsets -5..-3 predate the series entirely
        assert_eq!(out.raw_values[0], 60.0);
        assert_eq!(out.raw_values[1], 60.0);
        assert_eq!(out.raw_values[2], 60.0);
        assert_eq!(out.raw_values[3], 60.0); // first real observation
        // Anchor (offset 0) observed at 62
        let zero_pos = out.offsets.iter().position(|&o| o == 0).unwrap();
        assert_eq!(out.reindexed_values[zero_pos], 100.0);
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let err = reindex_around(
            &Series::empty(),
            &key("GHOST"),
            "evt",
            d(2024, 1, 1),
            5,
            5,
            ReindexPolicy::Multiplicative,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::NoData {
                asset: "GHOST".to_string()
            }
        );
    }

    #[test]
    fn test_series_entirely_after_window_is_no_data() {
        let series = daily_series(d(2024, 6, 1), &[10.0, 11.0]);
        let err = reindex_around(
            &series,
            &key("LATE"),
            "evt",
            d(2024, 1, 1),
            10,
            10,
            ReindexPolicy::Multiplicative,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NoData { .. }));
    }

    #[test]
    fn test_series_starting_inside_window_is_not_no_data() {
        // First observation lands within the window: usable via fallback
        let series = daily_series(d(2024, 1, 5), &[10.0, 11.0, 12.0]);
        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 1),
            2,
            5,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn test_zero_anchor_multiplicative_is_division_by_zero() {
        let series = daily_series(d(2024, 1, 1), &[0.0, 1.0, 2.0]);
        let err = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 1),
            0,
            2,
            ReindexPolicy::Multiplicative,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DivisionByZero { .. }));

        // Additive handles a zero anchor fine
        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 1),
            0,
            2,
            ReindexPolicy::Additive,
        )
        .unwrap();
        assert_eq!(out.reindexed_values, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_raw_values_untransformed() {
        let series = daily_series(d(2024, 1, 1), &[20.0, 22.0, 21.0]);
        let out = reindex_around(
            &series,
            &key("X"),
            "evt",
            d(2024, 1, 1),
            0,
            2,
            ReindexPolicy::Multiplicative,
        )
        .unwrap();
        assert_eq!(out.raw_values, vec![20.0, 22.0, 21.0]);
        assert_eq!(out.reindexed_values, vec![100.0, 110.0, 105.0]);
    }
}
