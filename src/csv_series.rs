//! CSV ingestion for daily close series.
//!
//! The storage format is the download payload format: a header row with
//! `Date` and `Close` columns (the full `Date,Open,High,Low,Close,Adj
//! Close,Volume` layout in practice, but only the two columns matter here).
//! Malformed rows and non-finite values are skipped with a warning rather
//! than failing the file; the engine's input contract is that invalid rows
//! are dropped upstream, and this is that upstream.

use crate::time_series::{Series, TimePoint};
use chrono::NaiveDate;
use std::fmt;
use std::io::Read;

/// Errors raised while reading a series CSV.
#[derive(Debug)]
pub enum CsvSeriesError {
    /// The header row is missing a required column
    MissingColumn(&'static str),
    /// Underlying reader or CSV structure failure
    Read(String),
}

impl fmt::Display for CsvSeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvSeriesError::MissingColumn(name) => {
                write!(f, "CSV is missing required column '{}'", name)
            }
            CsvSeriesError::Read(msg) => write!(f, "CSV read error: {}", msg),
        }
    }
}

impl std::error::Error for CsvSeriesError {}

/// Reads a `Date,...,Close,...` CSV into a `Series`.
///
/// Rows whose date or close fail to parse, and rows with non-finite or
/// empty close values, are skipped with a `log::warn!`. Dates parse as
/// `YYYY-MM-DD`. Duplicate dates resolve to the last row seen.
///
/// # Errors
/// Returns an error if the header lacks a `Date` or `Close` column, or the
/// reader fails structurally.
pub fn read_series<R: Read>(reader: R) -> Result<Series, CsvSeriesError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| CsvSeriesError::Read(e.to_string()))?;
    let date_col = headers
        .iter()
        .position(|h| h.trim() == "Date")
        .ok_or(CsvSeriesError::MissingColumn("Date"))?;
    let close_col = headers
        .iter()
        .position(|h| h.trim() == "Close")
        .ok_or(CsvSeriesError::MissingColumn("Close"))?;

    let mut rows = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| CsvSeriesError::Read(e.to_string()))?;

        let date_field = record.get(date_col).unwrap_or("").trim();
        let close_field = record.get(close_col).unwrap_or("").trim();

        let date = match NaiveDate::parse_from_str(date_field, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                log::warn!("Skipping row {}: unparseable date '{}'", line + 2, date_field);
                continue;
            }
        };
        let value = match close_field.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                log::warn!("Skipping row {}: invalid close '{}'", line + 2, close_field);
                continue;
            }
        };

        rows.push(TimePoint::new(date, value));
    }

    Ok(Series::from_raw(rows))
}

/// Convenience wrapper over `read_series` for in-memory payloads.
pub fn parse_series(text: &str) -> Result<Series, CsvSeriesError> {
    read_series(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_full_download_layout() {
        let text = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                    2024-01-15,149.0,151.0,148.5,150.0,150.0,1000000\n\
                    2024-01-16,150.2,152.0,150.0,151.5,151.5,900000\n";

        let series = parse_series(text).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, d(2024, 1, 15));
        assert_eq!(series.points()[0].value, 150.0);
        assert_eq!(series.points()[1].value, 151.5);
    }

    #[test]
    fn test_parse_minimal_layout() {
        let text = "Date,Close\n2024-01-15,42.5\n";
        let series = parse_series(text).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].value, 42.5);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let text = "Date,Close\n\
                    2024-01-15,150.0\n\
                    not-a-date,151.0\n\
                    2024-01-17,null\n\
                    2024-01-18,\n\
                    2024-01-19,152.0\n";

        let series = parse_series(text).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, d(2024, 1, 15));
        assert_eq!(series.points()[1].date, d(2024, 1, 19));
    }

    #[test]
    fn test_unsorted_rows_sorted() {
        let text = "Date,Close\n\
                    2024-01-17,152.0\n\
                    2024-01-15,150.0\n";

        let series = parse_series(text).unwrap();
        assert_eq!(series.points()[0].date, d(2024, 1, 15));
        assert_eq!(series.points()[1].date, d(2024, 1, 17));
    }

    #[test]
    fn test_missing_close_column() {
        let text = "Date,Open\n2024-01-15,150.0\n";
        let err = parse_series(text).unwrap_err();
        assert!(matches!(err, CsvSeriesError::MissingColumn("Close")));
    }

    #[test]
    fn test_missing_date_column() {
        let text = "Day,Close\n2024-01-15,150.0\n";
        let err = parse_series(text).unwrap_err();
        assert!(matches!(err, CsvSeriesError::MissingColumn("Date")));
    }

    #[test]
    fn test_empty_body_is_empty_series() {
        let text = "Date,Close\n";
        let series = parse_series(text).unwrap();
        assert!(series.is_empty());
    }
}
