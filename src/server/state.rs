//! Shared application state for the API server

use crate::policy::PolicyTable;
use crate::sqlite_provider::SqliteDataProvider;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite data provider for querying stored series.
    /// Wrapped in Mutex because SQLite connections are not thread-safe.
    pub provider: Arc<Mutex<SqliteDataProvider>>,
    /// Ticker -> asset class table resolving each asset's reindex policy
    pub policies: Arc<PolicyTable>,
}

impl AppState {
    /// Creates application state with the built-in policy table.
    pub fn new(provider: SqliteDataProvider) -> Self {
        AppState {
            provider: Arc::new(Mutex::new(provider)),
            policies: Arc::new(PolicyTable::builtin()),
        }
    }

    /// Creates application state with a custom policy table.
    pub fn with_policies(provider: SqliteDataProvider, policies: PolicyTable) -> Self {
        AppState {
            provider: Arc::new(Mutex::new(provider)),
            policies: Arc::new(policies),
        }
    }
}
