pub mod asset_key;
pub mod csv_series;
pub mod downloader;
pub mod engine;
pub mod policy;
pub mod server;
pub mod sqlite_provider;
pub mod time_series;


pub use asset_key::{AssetKey, AssetKeyError};
pub use csv_series::{parse_series, read_series, CsvSeriesError};
pub use downloader::{
    DownloadError, DownloaderConfig, FetchRecord, FetchTracker, QuoteDownloader,
};
pub use engine::{
    aggregate_events, align, build_matrices, pct_change, reindex_around, rolling_beta,
    rolling_correlation, AlignedPanel, BetaMatrix, CorrelationMatrix, EngineError,
    MultiEventTable, ReindexedEventSeries, RollingSeries,
};
pub use policy::{AssetClass, PolicyTable, ReindexPolicy};
pub use server::{run_server, ApiError, AppState, ServerConfig};
pub use sqlite_provider::SqliteDataProvider;
pub use time_series::{
    DataProvider, DataProviderError, DateRange, InMemoryDataProvider, Series, SeriesError,
    TimePoint,
};
