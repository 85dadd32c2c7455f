use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset key for uniquely identifying quoted assets.
///
/// The dashboard keys everything — equities, index levels, treasury yields,
/// volatility indices, FX pairs — by its quote symbol (e.g. "AAPL", "^TNX",
/// "EURUSD=X"). The key is the lookup handle for series storage, the reindex
/// policy table, and every API path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Creates a new asset key from a ticker symbol.
    ///
    /// # Arguments
    /// * `ticker` - The quote symbol (e.g., "AAPL", "^VIX", "GC=F")
    ///
    /// # Returns
    /// Returns `Ok(AssetKey)` if valid, or `Err` if invalid.
    ///
    /// # Errors
    /// Returns an error if the ticker is empty or contains invalid characters.
    pub fn new(ticker: impl Into<String>) -> Result<Self, AssetKeyError> {
        let ticker = ticker.into();
        Self::validate(&ticker)?;
        Ok(AssetKey(ticker))
    }

    /// Validates a ticker symbol.
    ///
    /// Rejects empty strings and strings containing invalid characters.
    /// Index symbols ("^VIX") and quote suffixes ("GC=F", "EURUSD=X") are
    /// accepted alongside plain tickers.
    fn validate(ticker: &str) -> Result<(), AssetKeyError> {
        if ticker.is_empty() {
            return Err(AssetKeyError::EmptyKey);
        }

        if !ticker
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '^' | '='))
        {
            return Err(AssetKeyError::InvalidCharacters);
        }

        Ok(())
    }

    /// Returns the ticker symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when creating or validating asset keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKeyError {
    /// The key is empty
    EmptyKey,
    /// The key contains invalid characters
    InvalidCharacters,
}

impl fmt::Display for AssetKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKeyError::EmptyKey => write!(f, "Asset key cannot be empty"),
            AssetKeyError::InvalidCharacters => {
                write!(f, "Asset key contains invalid characters")
            }
        }
    }
}

impl std::error::Error for AssetKeyError {}
