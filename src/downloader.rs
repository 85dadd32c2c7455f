use crate::asset_key::AssetKey;
use crate::csv_series;
use crate::time_series::{DateRange, Series};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for the quote downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Maximum number of attempts per fetch (default: 3)
    pub max_retries: u32,
    /// Delay between retry attempts in seconds (default: 5)
    pub retry_delay_seconds: u64,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Cooldown after a fetch exhausts its retries, in seconds (default: 300)
    pub cooldown_seconds: i64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        DownloaderConfig {
            max_retries: 3,
            retry_delay_seconds: 5,
            timeout_seconds: 30,
            cooldown_seconds: 300,
        }
    }
}

/// Per-ticker fetch bookkeeping: attempts made and active cooldowns.
///
/// This is deliberately an owned state object rather than module-level
/// statics. Whoever holds the downloader holds the record, so two
/// independent downloaders never share or race on attempt counts.
#[derive(Debug, Default)]
pub struct FetchTracker {
    records: HashMap<String, FetchRecord>,
}

/// One ticker's fetch history.
#[derive(Debug, Clone, Default)]
pub struct FetchRecord {
    /// Total failed fetches (each one a full retry cycle)
    pub failures: u32,
    /// Set while the ticker is cooling down after a failed cycle
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl FetchTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cooldown expiry if `ticker` is cooling down at `now`.
    pub fn cooling_down(&self, ticker: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.records
            .get(ticker)
            .and_then(|r| r.cooldown_until)
            .filter(|&until| until > now)
    }

    /// Records a failed fetch cycle and starts a cooldown.
    pub fn record_failure(&mut self, ticker: &str, now: DateTime<Utc>, cooldown_seconds: i64) {
        let record = self.records.entry(ticker.to_string()).or_default();
        record.failures += 1;
        record.cooldown_until = Some(now + ChronoDuration::seconds(cooldown_seconds));
    }

    /// Records a successful fetch, clearing any cooldown.
    pub fn record_success(&mut self, ticker: &str) {
        let record = self.records.entry(ticker.to_string()).or_default();
        record.cooldown_until = None;
    }

    /// Returns the record for a ticker, if any fetch has been attempted.
    pub fn record(&self, ticker: &str) -> Option<&FetchRecord> {
        self.records.get(ticker)
    }
}

/// Daily-history quote downloader.
///
/// Fetches close series as CSV from the quote API's historical download
/// endpoint and parses them with the shared CSV ingestion path. A ticker
/// whose fetch cycle fails enters a cooldown and is refused until it
/// expires, so a dead symbol cannot hammer the API on every page load.
#[derive(Debug)]
pub struct QuoteDownloader {
    client: Client,
    config: DownloaderConfig,
    tracker: Mutex<FetchTracker>,
}

impl QuoteDownloader {
    /// Creates a downloader with default configuration.
    ///
    /// # Errors
    /// Returns an error if HTTP client creation fails.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_config(DownloaderConfig::default())
    }

    /// Creates a downloader with custom configuration.
    ///
    /// # Errors
    /// Returns an error if HTTP client creation fails.
    pub fn with_config(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DownloadError::ClientCreation(e.to_string()))?;

        Ok(QuoteDownloader {
            client,
            config,
            tracker: Mutex::new(FetchTracker::new()),
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Runs `f` against the fetch tracker.
    pub fn with_tracker<T>(&self, f: impl FnOnce(&FetchTracker) -> T) -> T {
        f(&self.tracker.lock().expect("tracker lock poisoned"))
    }

    /// Fetches the daily close series for one asset over a date range.
    ///
    /// Retries up to `max_retries` times with a fixed delay, then records a
    /// failure and starts the ticker's cooldown. While a cooldown is active
    /// the fetch is refused immediately with `DownloadError::CoolingDown`.
    ///
    /// # Errors
    /// Returns an error on cooldown, on network/API failure after all
    /// retries, or when the payload cannot be parsed.
    pub async fn fetch_series(
        &self,
        asset: &AssetKey,
        range: &DateRange,
    ) -> Result<Series, DownloadError> {
        let now = Utc::now();
        if let Some(until) = self
            .tracker
            .lock()
            .expect("tracker lock poisoned")
            .cooling_down(asset.as_str(), now)
        {
            return Err(DownloadError::CoolingDown { until });
        }

        let url = self.history_url(asset, range)?;

        let mut last_error = DownloadError::NetworkError("No attempt made".to_string());
        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(self.config.retry_delay_seconds)).await;
            }

            match self.fetch_once(&url).await {
                Ok(payload) => {
                    let series = csv_series::parse_series(&payload)
                        .map_err(|e| DownloadError::ParseError(e.to_string()))?;
                    self.tracker
                        .lock()
                        .expect("tracker lock poisoned")
                        .record_success(asset.as_str());
                    return Ok(series);
                }
                Err(e) => {
                    log::warn!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt + 1,
                        self.config.max_retries,
                        asset,
                        e
                    );
                    last_error = e;
                }
            }
        }

        self.tracker
            .lock()
            .expect("tracker lock poisoned")
            .record_failure(asset.as_str(), Utc::now(), self.config.cooldown_seconds);
        Err(last_error)
    }

    /// Fetches several assets concurrently, one task per asset.
    ///
    /// Returns one result per input asset, in input order; an asset that
    /// fails does not abort the others.
    pub async fn fetch_many(
        &self,
        assets: &[AssetKey],
        range: &DateRange,
    ) -> Vec<(AssetKey, Result<Series, DownloadError>)> {
        let fetches = assets
            .iter()
            .map(|asset| async move { (asset.clone(), self.fetch_series(asset, range).await) });
        futures::future::join_all(fetches).await
    }

    fn history_url(&self, asset: &AssetKey, range: &DateRange) -> Result<String, DownloadError> {
        let start = range
            .start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DownloadError::InvalidDate("Invalid start date".to_string()))?
            .and_utc()
            .timestamp();
        let end = range
            .end
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| DownloadError::InvalidDate("Invalid end date".to_string()))?
            .and_utc()
            .timestamp();

        Ok(format!(
            "https://query1.finance.yahoo.com/v7/finance/download/{}?period1={}&period2={}&interval=1d&events=history",
            asset, start, end
        ))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ApiError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadError::ParseError(e.to_string()))
    }
}

/// Errors that can occur during quote downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// HTTP client creation failed
    ClientCreation(String),
    /// Network error occurred
    NetworkError(String),
    /// API returned an error response
    ApiError(String),
    /// Failed to parse response data
    ParseError(String),
    /// Invalid date provided
    InvalidDate(String),
    /// Ticker is cooling down after a failed fetch cycle
    CoolingDown { until: DateTime<Utc> },
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::ClientCreation(msg) => write!(f, "Client creation error: {}", msg),
            DownloadError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DownloadError::ApiError(msg) => write!(f, "API error: {}", msg),
            DownloadError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DownloadError::InvalidDate(msg) => write!(f, "Invalid date: {}", msg),
            DownloadError::CoolingDown { until } => {
                write!(f, "Ticker cooling down until {}", until)
            }
        }
    }
}

impl std::error::Error for DownloadError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_downloader_creation() {
        assert!(QuoteDownloader::new().is_ok());
    }

    #[test]
    fn test_downloader_with_config() {
        let config = DownloaderConfig {
            max_retries: 5,
            retry_delay_seconds: 1,
            timeout_seconds: 60,
            cooldown_seconds: 120,
        };
        let downloader = QuoteDownloader::with_config(config).unwrap();
        assert_eq!(downloader.config().max_retries, 5);
        assert_eq!(downloader.config().cooldown_seconds, 120);
    }

    #[test]
    fn test_history_url_contains_symbol_and_interval() {
        let downloader = QuoteDownloader::new().unwrap();
        let asset = AssetKey::new("^TNX").unwrap();
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));

        let url = downloader.history_url(&asset, &range).unwrap();
        assert!(url.contains("/^TNX?"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("period1="));
        assert!(url.contains("period2="));
    }

    #[test]
    fn test_tracker_cooldown_lifecycle() {
        let mut tracker = FetchTracker::new();
        let now = Utc::now();

        assert!(tracker.cooling_down("AAPL", now).is_none());

        tracker.record_failure("AAPL", now, 300);
        assert!(tracker.cooling_down("AAPL", now).is_some());
        assert_eq!(tracker.record("AAPL").unwrap().failures, 1);

        // Expired cooldown no longer blocks
        let later = now + ChronoDuration::seconds(301);
        assert!(tracker.cooling_down("AAPL", later).is_none());
    }

    #[test]
    fn test_tracker_success_clears_cooldown() {
        let mut tracker = FetchTracker::new();
        let now = Utc::now();

        tracker.record_failure("^VIX", now, 300);
        assert!(tracker.cooling_down("^VIX", now).is_some());

        tracker.record_success("^VIX");
        assert!(tracker.cooling_down("^VIX", now).is_none());
        // Failure count is history, not state; it survives the success
        assert_eq!(tracker.record("^VIX").unwrap().failures, 1);
    }

    #[test]
    fn test_tracker_counts_repeated_failures() {
        let mut tracker = FetchTracker::new();
        let now = Utc::now();

        tracker.record_failure("CL=F", now, 60);
        tracker.record_failure("CL=F", now + ChronoDuration::seconds(120), 60);
        assert_eq!(tracker.record("CL=F").unwrap().failures, 2);
    }

    #[test]
    fn test_tracker_is_per_ticker() {
        let mut tracker = FetchTracker::new();
        let now = Utc::now();

        tracker.record_failure("AAPL", now, 300);
        assert!(tracker.cooling_down("AAPL", now).is_some());
        assert!(tracker.cooling_down("MSFT", now).is_none());
    }
}
