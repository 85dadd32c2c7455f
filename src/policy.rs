//! Asset classification and reindexing policy.
//!
//! Whether an event window rebases multiplicatively (prices) or additively
//! (rate and volatility levels) is a property of the asset itself, not a
//! request parameter. The mapping lives in an explicit ticker table so a
//! rename of a display label can never silently flip an asset's formula.

use crate::asset_key::AssetKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Broad asset classification used to resolve the reindexing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Common stock or ETF priced in currency units
    Equity,
    /// Broad equity/commodity index level
    Index,
    /// Treasury yield index quoted in percentage points
    YieldIndex,
    /// Volatility index quoted in points
    VolatilityIndex,
    /// Futures contract price
    Commodity,
    /// Currency pair
    Currency,
}

impl AssetClass {
    /// The reindexing rule fixed by asset class.
    ///
    /// Yields and volatility are quoted as levels where ratios are
    /// meaningless (a move from 1% to 2% is "+1 point", not "+100%"), so
    /// they rebase additively; everything priced in currency rebases
    /// multiplicatively.
    pub fn reindex_policy(self) -> ReindexPolicy {
        match self {
            AssetClass::YieldIndex | AssetClass::VolatilityIndex => ReindexPolicy::Additive,
            AssetClass::Equity
            | AssetClass::Index
            | AssetClass::Commodity
            | AssetClass::Currency => ReindexPolicy::Multiplicative,
        }
    }
}

/// How a series is rebased against its anchor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexPolicy {
    /// value -> value / anchor * 100
    Multiplicative,
    /// value -> value - anchor + 100
    Additive,
}

impl ReindexPolicy {
    /// Rebases one value against the anchor.
    pub fn apply(self, value: f64, anchor: f64) -> f64 {
        match self {
            ReindexPolicy::Multiplicative => value / anchor * 100.0,
            ReindexPolicy::Additive => value - anchor + 100.0,
        }
    }
}

/// Explicit ticker -> asset class lookup.
///
/// Unknown tickers default to `Equity` (multiplicative), so only the symbols
/// whose class changes the reindexing formula need an entry.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: HashMap<String, AssetClass>,
}

impl PolicyTable {
    /// Creates an empty table (every asset resolves to `Equity`).
    pub fn new() -> Self {
        PolicyTable {
            entries: HashMap::new(),
        }
    }

    /// The table shipped with the dashboard.
    ///
    /// Covers the yield and volatility symbols the default watchlist uses;
    /// reviewed alongside any watchlist change.
    pub fn builtin() -> Self {
        let mut table = PolicyTable::new();
        for ticker in ["^IRX", "^FVX", "^TNX", "^TYX"] {
            table.insert(ticker, AssetClass::YieldIndex);
        }
        for ticker in ["^VIX", "^VVIX", "^MOVE"] {
            table.insert(ticker, AssetClass::VolatilityIndex);
        }
        for ticker in ["^GSPC", "^IXIC", "^DJI", "^RUT"] {
            table.insert(ticker, AssetClass::Index);
        }
        for ticker in ["GC=F", "CL=F", "SI=F", "HG=F"] {
            table.insert(ticker, AssetClass::Commodity);
        }
        for ticker in ["EURUSD=X", "USDJPY=X", "GBPUSD=X", "DX-Y.NYB"] {
            table.insert(ticker, AssetClass::Currency);
        }
        table
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, ticker: &str, class: AssetClass) {
        self.entries.insert(ticker.to_string(), class);
    }

    /// Resolves the asset class for a key, defaulting to `Equity`.
    pub fn class_of(&self, asset: &AssetKey) -> AssetClass {
        self.entries
            .get(asset.as_str())
            .copied()
            .unwrap_or(AssetClass::Equity)
    }

    /// Resolves the reindex policy for a key.
    pub fn policy_for(&self, asset: &AssetKey) -> ReindexPolicy {
        self.class_of(asset).reindex_policy()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yields_and_vol_are_additive() {
        let table = PolicyTable::builtin();
        for ticker in ["^TNX", "^TYX", "^VIX", "^MOVE"] {
            let key = AssetKey::new(ticker).unwrap();
            assert_eq!(
                table.policy_for(&key),
                ReindexPolicy::Additive,
                "{} should rebase additively",
                ticker
            );
        }
    }

    #[test]
    fn test_prices_are_multiplicative() {
        let table = PolicyTable::builtin();
        for ticker in ["AAPL", "^GSPC", "GC=F", "EURUSD=X"] {
            let key = AssetKey::new(ticker).unwrap();
            assert_eq!(table.policy_for(&key), ReindexPolicy::Multiplicative);
        }
    }

    #[test]
    fn test_unknown_ticker_defaults_to_equity() {
        let table = PolicyTable::builtin();
        let key = AssetKey::new("ZZZZ").unwrap();
        assert_eq!(table.class_of(&key), AssetClass::Equity);
        assert_eq!(table.policy_for(&key), ReindexPolicy::Multiplicative);
    }

    #[test]
    fn test_policy_apply() {
        assert_eq!(ReindexPolicy::Multiplicative.apply(55.0, 50.0), 110.0);
        assert_eq!(ReindexPolicy::Additive.apply(55.0, 50.0), 105.0);
        // Anchor rebases to 100 under both rules
        assert_eq!(ReindexPolicy::Multiplicative.apply(50.0, 50.0), 100.0);
        assert_eq!(ReindexPolicy::Additive.apply(50.0, 50.0), 100.0);
    }

    #[test]
    fn test_insert_overrides_default() {
        let mut table = PolicyTable::new();
        let key = AssetKey::new("CUSTOM").unwrap();
        assert_eq!(table.policy_for(&key), ReindexPolicy::Multiplicative);
        table.insert("CUSTOM", AssetClass::VolatilityIndex);
        assert_eq!(table.policy_for(&key), ReindexPolicy::Additive);
    }
}
