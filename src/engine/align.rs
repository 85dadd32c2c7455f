//! Series alignment: the strict date intersection behind every
//! cross-asset statistic.
//!
//! A date makes it into the panel only when every series has an observation
//! on it. The tempting alternative — left-join plus forward-fill — would
//! fabricate data points inside the correlation sample, so alignment here is
//! intersection-only and gaps simply shrink the sample.

use super::EngineError;
use crate::asset_key::AssetKey;
use crate::time_series::Series;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Equal-length parallel value arrays over one shared date axis.
///
/// `values[i][j]` is the value of asset `assets[i]` on `dates[j]`. Every
/// cell is a real observation; no synthetic fill. Asset order is the
/// caller's input order and is never re-sorted, because consumers map
/// matrix cells back to positions by index.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPanel {
    /// Asset keys in caller-supplied order
    pub assets: Vec<AssetKey>,
    /// Shared date axis, strictly increasing
    pub dates: Vec<NaiveDate>,
    /// One value row per asset, parallel to `dates`
    pub values: Vec<Vec<f64>>,
}

impl AlignedPanel {
    /// Number of common dates in the panel.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True if the panel holds no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns the value row for an asset, if present.
    pub fn values_for(&self, asset: &AssetKey) -> Option<&[f64]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.values[i].as_slice())
    }
}

/// Intersects N named series onto the dates where all of them have a value.
///
/// # Arguments
/// * `series` - Named input series; two or more for any cross-asset use
///
/// # Errors
/// Returns `EngineError::InsufficientData` with per-series point counts when
/// the intersection is empty, so the caller can report which assets lacked
/// overlap.
pub fn align(series: &[(AssetKey, Series)]) -> Result<AlignedPanel, EngineError> {
    let mut all_dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for (_, s) in series {
        all_dates.extend(s.points().iter().map(|p| p.date));
    }

    // BTreeSet iteration is already date-ordered
    let dates: Vec<NaiveDate> = all_dates
        .into_iter()
        .filter(|&date| series.iter().all(|(_, s)| s.value_on(date).is_some()))
        .collect();

    if dates.is_empty() {
        return Err(EngineError::InsufficientData {
            counts: series
                .iter()
                .map(|(key, s)| (key.to_string(), s.len()))
                .collect(),
        });
    }

    let assets: Vec<AssetKey> = series.iter().map(|(key, _)| key.clone()).collect();
    let values: Vec<Vec<f64>> = series
        .iter()
        .map(|(_, s)| {
            dates
                .iter()
                .map(|&date| {
                    s.value_on(date)
                        .expect("date retained by intersection filter")
                })
                .collect()
        })
        .collect();

    Ok(AlignedPanel {
        assets,
        dates,
        values,
    })
}
