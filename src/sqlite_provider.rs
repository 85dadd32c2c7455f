use crate::asset_key::AssetKey;
use crate::time_series::{DataProvider, DataProviderError, DateRange, Series, TimePoint};
use chrono::NaiveDate;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;

/// SQLite-based data provider implementation.
///
/// Stores one close value per `(ticker, date)` and serves as the local
/// cache the downloader writes into. Schema is created automatically on
/// first use.
#[derive(Debug)]
pub struct SqliteDataProvider {
    conn: Connection,
}

impl SqliteDataProvider {
    /// Creates a new SQLite data provider with a file-based database.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file. Created if missing.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        let provider = SqliteDataProvider { conn };
        provider.ensure_schema()?;
        Ok(provider)
    }

    /// Creates a new SQLite data provider with an in-memory database.
    ///
    /// Useful for testing.
    pub fn new_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let provider = SqliteDataProvider { conn };
        provider.ensure_schema()?;
        Ok(provider)
    }

    /// Ensures the database schema exists, creating tables if needed.
    fn ensure_schema(&self) -> SqliteResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS close_series (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                PRIMARY KEY (ticker, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_close_series_ticker ON close_series(ticker)",
            [],
        )?;

        Ok(())
    }

    /// Upserts a full series for an asset.
    ///
    /// Existing rows for the same `(ticker, date)` are replaced, so
    /// re-downloading an overlapping range refreshes values in place.
    pub fn store_series(&mut self, asset: &AssetKey, series: &Series) -> SqliteResult<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO close_series (ticker, date, close) VALUES (?1, ?2, ?3)",
            )?;
            for point in series.points() {
                written += stmt.execute(rusqlite::params![
                    asset.as_str(),
                    point.date.format("%Y-%m-%d").to_string(),
                    point.value,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Lists the distinct tickers present in the store, with point counts.
    pub fn list_assets(&self) -> SqliteResult<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticker, COUNT(*) FROM close_series GROUP BY ticker ORDER BY ticker",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        rows.collect()
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl DataProvider for SqliteDataProvider {
    fn get_series(&self, asset: &AssetKey, range: &DateRange) -> Result<Series, DataProviderError> {
        if range.start > range.end {
            return Err(DataProviderError::InvalidDateRange);
        }

        let start = range.start.format("%Y-%m-%d").to_string();
        let end = range.end.format("%Y-%m-%d").to_string();

        let mut stmt = self
            .conn
            .prepare(
                "SELECT date, close FROM close_series
                 WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date",
            )
            .map_err(|e| DataProviderError::Other(format!("SQL error: {}", e)))?;

        let rows = stmt
            .query_map([asset.as_str(), &start, &end], |row| {
                let date_str: String = row.get(0)?;
                let close: f64 = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        format!("Invalid date: {}", e),
                        rusqlite::types::Type::Text,
                    )
                })?;
                Ok(TimePoint::new(date, close))
            })
            .map_err(|e| DataProviderError::Other(format!("SQL error: {}", e)))?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(|e| DataProviderError::Other(format!("Row error: {}", e)))?);
        }

        // Distinguish "no rows in range" from "unknown ticker"
        if points.is_empty() {
            let mut check = self
                .conn
                .prepare("SELECT 1 FROM close_series WHERE ticker = ?1 LIMIT 1")
                .map_err(|e| DataProviderError::Other(format!("SQL error: {}", e)))?;
            let known = check
                .exists([asset.as_str()])
                .map_err(|e| DataProviderError::Other(format!("SQL error: {}", e)))?;
            if !known {
                return Err(DataProviderError::AssetNotFound);
            }
        }

        // Rows come back date-ordered and deduplicated by the primary key
        Series::new(points).map_err(|e| DataProviderError::Other(format!("Corrupt store: {}", e)))
    }
}
