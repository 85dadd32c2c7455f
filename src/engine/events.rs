//! Cross-event aggregation over a shared day-offset grid.
//!
//! Reindexing already pinned every event to the same `-before..=+after`
//! grid; only on that grid does averaging across events with different
//! anchor dates mean anything. This module stacks the rebased series and
//! reduces each offset column to a mean and a median.

use super::reindex::ReindexedEventSeries;
use super::EngineError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Baseline emitted for an offset where no event contributed a finite
/// value. 100 is the rebased "unchanged" level, so consumers always get a
/// full-length numeric array.
const BASELINE: f64 = 100.0;

/// Per-offset aggregate of many events' rebased windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiEventTable {
    /// Day offsets, `-before..=+after`, shared by every row
    pub offsets: Vec<i64>,
    /// The individual event windows the aggregate was built from
    pub per_event: Vec<ReindexedEventSeries>,
    /// Arithmetic mean of finite rebased values at each offset
    pub mean: Vec<f64>,
    /// Median of finite rebased values at each offset
    pub median: Vec<f64>,
}

/// Aggregates same-asset event windows into per-offset mean and median.
///
/// All inputs must share one offset grid (same `before`/`after`). At each
/// offset, non-finite values are discarded before aggregating; if nothing
/// finite remains the baseline `100.0` is emitted for both statistics — a
/// defined placeholder, not an error. The median averages the two middle
/// values on an even count.
///
/// # Errors
/// Returns `EngineError::InsufficientData` when `events` is empty (every
/// event failed upstream); a fabricated all-baseline table would be
/// indistinguishable from real data.
///
/// # Panics
/// Panics if the events disagree on the offset grid, which violates the
/// caller contract that all windows were produced with identical
/// `before`/`after`.
pub fn aggregate_events(events: Vec<ReindexedEventSeries>) -> Result<MultiEventTable, EngineError> {
    let first = events.first().ok_or(EngineError::InsufficientData {
        counts: Vec::new(),
    })?;
    let offsets = first.offsets.clone();
    for event in &events {
        assert_eq!(
            event.offsets, offsets,
            "event windows must share one offset grid"
        );
    }

    let mut mean = Vec::with_capacity(offsets.len());
    let mut median = Vec::with_capacity(offsets.len());

    for k in 0..offsets.len() {
        let mut column: Vec<f64> = events
            .iter()
            .map(|e| e.reindexed_values[k])
            .filter(|v| v.is_finite())
            .collect();

        if column.is_empty() {
            mean.push(BASELINE);
            median.push(BASELINE);
            continue;
        }

        mean.push(column.iter().sum::<f64>() / column.len() as f64);

        column.sort_by_key(|&v| OrderedFloat(v));
        let mid = column.len() / 2;
        if column.len() % 2 == 1 {
            median.push(column[mid]);
        } else {
            median.push((column[mid - 1] + column[mid]) / 2.0);
        }
    }

    Ok(MultiEventTable {
        offsets,
        per_event: events,
        mean,
        median,
    })
}
