use crate::asset_key::AssetKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single time-series observation: one close value on one calendar day.
///
/// Dates are calendar-day granular; the engine compares them by day equality
/// only, so there is deliberately no time-of-day component here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Observed value (close price, yield level, index level)
    pub value: f64,
}

impl TimePoint {
    /// Creates a new TimePoint.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        TimePoint { date, value }
    }
}

/// An ordered daily series: strictly increasing dates, finite values.
///
/// The constructor enforces both invariants, so every `Series` handed to the
/// engine is already deduplicated and free of NaN/Inf. The engine never
/// mutates a series; all transformations produce new arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<TimePoint>,
}

impl Series {
    /// Creates a series from points that must already be strictly ordered.
    ///
    /// # Errors
    /// Returns an error if any value is non-finite or any date is not
    /// strictly greater than its predecessor (duplicates included).
    pub fn new(points: Vec<TimePoint>) -> Result<Self, SeriesError> {
        for (i, point) in points.iter().enumerate() {
            if !point.value.is_finite() {
                return Err(SeriesError::NonFiniteValue {
                    index: i,
                    date: point.date,
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(SeriesError::OutOfOrder {
                    index: i,
                    date: point.date,
                });
            }
        }
        Ok(Series { points })
    }

    /// Builds a series from unordered raw rows: sorts by date, keeps the last
    /// value per date, and drops non-finite values.
    ///
    /// This is the ingestion-side constructor (CSV files, download payloads);
    /// it applies the upstream "invalid rows already dropped" contract so the
    /// engine only ever sees clean data.
    pub fn from_raw(mut rows: Vec<TimePoint>) -> Self {
        rows.retain(|p| p.value.is_finite());
        rows.sort_by_key(|p| p.date);
        let mut points: Vec<TimePoint> = Vec::with_capacity(rows.len());
        for row in rows {
            match points.last_mut() {
                Some(last) if last.date == row.date => last.value = row.value,
                _ => points.push(row),
            }
        }
        Series { points }
    }

    /// Creates an empty series.
    pub fn empty() -> Self {
        Series { points: Vec::new() }
    }

    /// Returns the underlying points, oldest first.
    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the value observed exactly on `date`, if any.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Returns the most recent observation at or before `date`, if any.
    ///
    /// This is the forward-fill lookup: the last known value as of `date`,
    /// never a future one.
    pub fn at_or_before(&self, date: NaiveDate) -> Option<&TimePoint> {
        match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(i) => Some(&self.points[i]),
            Err(0) => None,
            Err(i) => Some(&self.points[i - 1]),
        }
    }

    /// Returns the earliest observation, if any.
    pub fn first(&self) -> Option<&TimePoint> {
        self.points.first()
    }

    /// Returns the latest observation, if any.
    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }

    /// Restricts the series to dates within `range` (inclusive both ends).
    pub fn slice_range(&self, range: &DateRange) -> Series {
        let points = self
            .points
            .iter()
            .filter(|p| p.date >= range.start && p.date <= range.end)
            .copied()
            .collect();
        Series { points }
    }
}

/// Errors raised when constructing a `Series` from pre-ordered points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    /// A value was NaN or infinite
    NonFiniteValue { index: usize, date: NaiveDate },
    /// A date was not strictly greater than its predecessor
    OutOfOrder { index: usize, date: NaiveDate },
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesError::NonFiniteValue { index, date } => {
                write!(f, "Non-finite value at index {} ({})", index, date)
            }
            SeriesError::OutOfOrder { index, date } => {
                write!(f, "Out-of-order date at index {} ({})", index, date)
            }
        }
    }
}

impl std::error::Error for SeriesError {}

/// Date range for querying time-series data, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }
}

/// Trait for data source abstraction.
///
/// The engine consumes already-materialized `Series`; this trait is the seam
/// between it and wherever the data actually lives. Implementations can be:
/// - In-memory HashMap (for testing)
/// - SQLite database
/// - A remote quote API fronted by a local cache
///
/// Implementations own freshness, caching, and retry policy, and must
/// surface explicit absence (an error or an empty series) rather than
/// partial or garbled data.
pub trait DataProvider {
    /// Retrieves the series for an asset over a date range.
    ///
    /// # Arguments
    /// * `asset` - The asset key to query data for
    /// * `range` - The date range to query (inclusive on both ends)
    ///
    /// # Errors
    /// Returns an error if the asset is unknown, the range is invalid, or
    /// the underlying store fails.
    fn get_series(&self, asset: &AssetKey, range: &DateRange) -> Result<Series, DataProviderError>;
}

/// Errors that can occur when querying a data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataProviderError {
    /// Asset key not found in the data source
    AssetNotFound,
    /// Invalid date range (e.g., start > end)
    InvalidDateRange,
    /// Generic error message
    Other(String),
}

impl fmt::Display for DataProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataProviderError::AssetNotFound => write!(f, "Asset not found"),
            DataProviderError::InvalidDateRange => write!(f, "Invalid date range"),
            DataProviderError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DataProviderError {}

/// In-memory data provider implementation for testing.
///
/// Stores series in a HashMap keyed by AssetKey, which allows exercising the
/// full analytics pipeline without a database connection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataProvider {
    data: HashMap<AssetKey, Series>,
}

impl InMemoryDataProvider {
    /// Creates a new empty in-memory data provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series for an asset, replacing any existing one.
    pub fn add_series(&mut self, asset: AssetKey, series: Series) {
        self.data.insert(asset, series);
    }

    /// Clears all data from the provider.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl DataProvider for InMemoryDataProvider {
    fn get_series(&self, asset: &AssetKey, range: &DateRange) -> Result<Series, DataProviderError> {
        if range.start > range.end {
            return Err(DataProviderError::InvalidDateRange);
        }

        let series = self
            .data
            .get(asset)
            .ok_or(DataProviderError::AssetNotFound)?;

        Ok(series.slice_range(range))
    }
}
