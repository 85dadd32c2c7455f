//! Sliding-window correlation and beta.
//!
//! Each output point is computed over the `window` observations strictly
//! before its label date, so a statistic is reported as of the last
//! observation it uses and never sees the future.

use super::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A windowed statistic series: one value per window position, labeled with
/// the date at the window's later endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingSeries {
    /// Label dates, parallel to `values`
    pub dates: Vec<NaiveDate>,
    /// Statistic values
    pub values: Vec<f64>,
}

impl RollingSeries {
    /// Number of windows in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no window fit in the input.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rolling Pearson correlation between two equal-length return series.
///
/// For each `k` in `window..len`, correlates `a[k-window..k]` with
/// `b[k-window..k]` and labels the result with `dates[k]`. Output length is
/// `len - window`; a window that does not fit (`window >= len`) yields an
/// empty series rather than an error, so callers can render "insufficient
/// data" without failing the whole request. Flat windows produce `0.0`.
pub fn rolling_correlation(
    dates: &[NaiveDate],
    a: &[f64],
    b: &[f64],
    window: usize,
) -> RollingSeries {
    rolling_stat(dates, a, b, window, stats::pearson)
}

/// Rolling OLS beta of `a` against the reference series `b`.
///
/// Same windowing and labeling as `rolling_correlation`; windows where the
/// reference variance is zero produce `0.0`.
pub fn rolling_beta(dates: &[NaiveDate], a: &[f64], b: &[f64], window: usize) -> RollingSeries {
    rolling_stat(dates, a, b, window, stats::beta)
}

fn rolling_stat(
    dates: &[NaiveDate],
    a: &[f64],
    b: &[f64],
    window: usize,
    stat: fn(&[f64], &[f64]) -> f64,
) -> RollingSeries {
    assert_eq!(a.len(), b.len(), "rolling inputs must be equal length");
    assert_eq!(dates.len(), a.len(), "dates must be parallel to values");

    if window == 0 || window >= a.len() {
        return RollingSeries {
            dates: Vec::new(),
            values: Vec::new(),
        };
    }

    let mut out_dates = Vec::with_capacity(a.len() - window);
    let mut out_values = Vec::with_capacity(a.len() - window);
    for k in window..a.len() {
        out_dates.push(dates[k]);
        out_values.push(stat(&a[k - window..k], &b[k - window..k]));
    }

    RollingSeries {
        dates: out_dates,
        values: out_values,
    }
}
