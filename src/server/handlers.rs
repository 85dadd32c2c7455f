//! HTTP request handlers for API endpoints
//!
//! Handlers are thin wrappers: parse and validate the request, lock the
//! provider, and delegate to the pure engine. Per-asset and per-event
//! failures are collected into `skipped` lists instead of failing whole
//! responses, so one dead ticker never blanks a dashboard page.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::asset_key::AssetKey;
use crate::engine::{
    aggregate_events, align, build_matrices, pct_change, reindex_around, rolling_beta,
    rolling_correlation, BetaMatrix, CorrelationMatrix, EngineError, ReindexedEventSeries,
};
use crate::policy::{AssetClass, ReindexPolicy};
use crate::sqlite_provider::SqliteDataProvider;
use crate::time_series::{DataProvider, DataProviderError, DateRange, Series};

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidDateRange(format!("Invalid {} date: {}", field, e)))
}

fn parse_range(start: &str, end: &str) -> Result<DateRange, ApiError> {
    let start = parse_date("start", start)?;
    let end = parse_date("end", end)?;
    if start > end {
        return Err(ApiError::InvalidDateRange(
            "Start date must be before or equal to end date".to_string(),
        ));
    }
    Ok(DateRange::new(start, end))
}

fn get_named_series(
    provider: &SqliteDataProvider,
    asset: &AssetKey,
    range: &DateRange,
) -> Result<Series, ApiError> {
    provider.get_series(asset, range).map_err(|e| match e {
        DataProviderError::AssetNotFound => ApiError::AssetNotFound(asset.to_string()),
        other => other.into(),
    })
}

// Asset listing and raw data

/// Information about a single stored asset
#[derive(Debug, Serialize)]
pub struct AssetInfo {
    pub key: String,
    pub class: AssetClass,
    pub reindex_policy: ReindexPolicy,
    pub points: usize,
}

/// Response for asset listing
#[derive(Debug, Serialize)]
pub struct AssetsResponse {
    pub assets: Vec<AssetInfo>,
}

/// GET /assets - List stored assets with their class and point counts
pub async fn list_assets(
    State(state): State<AppState>,
) -> Result<Json<AssetsResponse>, ApiError> {
    let provider = state.provider.lock().await;
    let stored = provider
        .list_assets()
        .map_err(|e| ApiError::InternalError(format!("SQL error: {}", e)))?;

    let assets = stored
        .into_iter()
        .map(|(ticker, points)| {
            let class = AssetKey::new(ticker.as_str())
                .map(|key| state.policies.class_of(&key))
                .unwrap_or(AssetClass::Equity);
            AssetInfo {
                key: ticker,
                class,
                reindex_policy: class.reindex_policy(),
                points,
            }
        })
        .collect();

    Ok(Json(AssetsResponse { assets }))
}

/// Query parameters for the raw data endpoint
#[derive(Debug, Deserialize)]
pub struct DataQueryParams {
    pub start: String,
    pub end: String,
}

/// Single data point in a raw series response
#[derive(Debug, Serialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Response for a raw series query
#[derive(Debug, Serialize)]
pub struct AssetDataResponse {
    pub asset: String,
    pub start: String,
    pub end: String,
    pub data: Vec<DataPoint>,
}

/// GET /assets/{asset}/data - Get raw close data for an asset
pub async fn get_asset_data(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Query(params): Query<DataQueryParams>,
) -> Result<Json<AssetDataResponse>, ApiError> {
    let range = parse_range(&params.start, &params.end)?;
    let key = AssetKey::new(asset.as_str())?;

    let provider = state.provider.lock().await;
    let series = get_named_series(&provider, &key, &range)?;

    let data = series
        .points()
        .iter()
        .map(|p| DataPoint {
            date: p.date,
            close: p.value,
        })
        .collect();

    Ok(Json(AssetDataResponse {
        asset,
        start: params.start,
        end: params.end,
        data,
    }))
}

// Rolling correlation / beta

/// Query parameters for the rolling statistics endpoint
#[derive(Debug, Deserialize)]
pub struct RollingQueryParams {
    pub start: String,
    pub end: String,
    pub window: usize,
    /// Percent-change horizon in aligned observations (default 1)
    pub periods: Option<usize>,
}

/// Response for the rolling statistics endpoint
#[derive(Debug, Serialize)]
pub struct RollingResponse {
    pub base: String,
    pub target: String,
    pub window: usize,
    pub periods: usize,
    /// Label dates, parallel to `correlation` and `beta`
    pub dates: Vec<NaiveDate>,
    pub correlation: Vec<f64>,
    /// Beta of `base` returns against `target` returns
    pub beta: Vec<f64>,
}

/// GET /analytics/rolling/{base}/{target} - Rolling correlation and beta
///
/// An alignment window that cannot fit (too little overlapping history)
/// produces empty arrays, not an error, so the dashboard renders an
/// "insufficient data" panel instead of a failure.
pub async fn get_rolling_stats(
    State(state): State<AppState>,
    Path((base, target)): Path<(String, String)>,
    Query(params): Query<RollingQueryParams>,
) -> Result<Json<RollingResponse>, ApiError> {
    let range = parse_range(&params.start, &params.end)?;
    let periods = params.periods.unwrap_or(1);
    if params.window == 0 {
        return Err(ApiError::InvalidParameter(
            "Window size must be greater than 0".to_string(),
        ));
    }
    if periods == 0 {
        return Err(ApiError::InvalidParameter(
            "Periods must be greater than 0".to_string(),
        ));
    }

    let base_key = AssetKey::new(base.as_str())?;
    let target_key = AssetKey::new(target.as_str())?;

    let provider = state.provider.lock().await;
    let base_series = get_named_series(&provider, &base_key, &range)?;
    let target_series = get_named_series(&provider, &target_key, &range)?;
    drop(provider);

    let panel = align(&[
        (base_key.clone(), base_series),
        (target_key.clone(), target_series),
    ])?;

    if panel.len() <= periods {
        return Ok(Json(RollingResponse {
            base,
            target,
            window: params.window,
            periods,
            dates: Vec::new(),
            correlation: Vec::new(),
            beta: Vec::new(),
        }));
    }

    let base_returns = named_pct_change(&panel.values[0], periods, &base_key)?;
    let target_returns = named_pct_change(&panel.values[1], periods, &target_key)?;
    let return_dates = &panel.dates[periods..];

    let correlation = rolling_correlation(
        return_dates,
        &base_returns,
        &target_returns,
        params.window,
    );
    let beta = rolling_beta(return_dates, &base_returns, &target_returns, params.window);

    Ok(Json(RollingResponse {
        base,
        target,
        window: params.window,
        periods,
        dates: correlation.dates,
        correlation: correlation.values,
        beta: beta.values,
    }))
}

fn named_pct_change(
    values: &[f64],
    periods: usize,
    asset: &AssetKey,
) -> Result<Vec<f64>, ApiError> {
    pct_change(values, periods)
        .map_err(|e| match e {
            EngineError::DivisionByZero { index, .. } => EngineError::DivisionByZero {
                asset: Some(asset.to_string()),
                index,
            },
            other => other,
        })
        .map_err(ApiError::from)
}

// Correlation / beta matrices

/// Request body for the matrix endpoint
#[derive(Debug, Deserialize)]
pub struct MatrixRequest {
    pub assets: Vec<String>,
    pub start: String,
    pub end: String,
    pub periods: Option<usize>,
}

/// An asset or event excluded from a partial-success response
#[derive(Debug, Serialize)]
pub struct Skipped {
    pub id: String,
    pub reason: String,
}

/// Response for the matrix endpoint
#[derive(Debug, Serialize)]
pub struct MatrixResponse {
    pub correlation: CorrelationMatrix,
    pub beta: BetaMatrix,
    pub skipped: Vec<Skipped>,
}

/// POST /analytics/matrix - Pairwise correlation and beta matrices
///
/// Assets that cannot contribute (unknown ticker, no rows in range) are
/// reported in `skipped`; the matrices are built over the rest as long as
/// at least two remain.
pub async fn build_matrix(
    State(state): State<AppState>,
    Json(request): Json<MatrixRequest>,
) -> Result<Json<MatrixResponse>, ApiError> {
    let range = parse_range(&request.start, &request.end)?;
    let periods = request.periods.unwrap_or(1);
    if request.assets.len() < 2 {
        return Err(ApiError::InvalidParameter(
            "At least two assets are required".to_string(),
        ));
    }
    if periods == 0 {
        return Err(ApiError::InvalidParameter(
            "Periods must be greater than 0".to_string(),
        ));
    }

    let provider = state.provider.lock().await;
    let mut input: Vec<(AssetKey, Series)> = Vec::with_capacity(request.assets.len());
    let mut skipped = Vec::new();
    for ticker in &request.assets {
        let key = AssetKey::new(ticker.as_str())?;
        match provider.get_series(&key, &range) {
            Ok(series) if !series.is_empty() => input.push((key, series)),
            Ok(_) => skipped.push(Skipped {
                id: ticker.clone(),
                reason: "No data in the requested range".to_string(),
            }),
            Err(DataProviderError::AssetNotFound) => skipped.push(Skipped {
                id: ticker.clone(),
                reason: "Asset not found".to_string(),
            }),
            Err(other) => return Err(other.into()),
        }
    }
    drop(provider);

    if input.len() < 2 {
        return Err(ApiError::InsufficientData(format!(
            "Only {} of {} assets had data in the requested range",
            input.len(),
            request.assets.len()
        )));
    }

    let panel = align(&input)?;
    let (correlation, beta) = build_matrices(&panel, periods)?;

    Ok(Json(MatrixResponse {
        correlation,
        beta,
        skipped,
    }))
}

// Event-impact aggregation

/// One event in an aggregation request
#[derive(Debug, Deserialize)]
pub struct EventSpec {
    pub id: String,
    pub date: String,
}

/// Request body for the event aggregation endpoint
#[derive(Debug, Deserialize)]
pub struct EventAggregateRequest {
    pub asset: String,
    pub events: Vec<EventSpec>,
    pub before: u32,
    pub after: u32,
}

/// Response for the event aggregation endpoint
#[derive(Debug, Serialize)]
pub struct EventAggregateResponse {
    pub asset: String,
    pub class: AssetClass,
    pub reindex_policy: ReindexPolicy,
    pub offsets: Vec<i64>,
    pub mean: Vec<f64>,
    pub median: Vec<f64>,
    pub events: Vec<ReindexedEventSeries>,
    pub skipped: Vec<Skipped>,
}

/// POST /events/aggregate - Rebase an asset around many event dates
///
/// Each event is reindexed onto the shared `-before..=+after` day grid and
/// the grid columns are reduced to mean and median. Events the series
/// cannot cover are reported in `skipped`; the request only fails when no
/// event survives.
pub async fn aggregate_event_impact(
    State(state): State<AppState>,
    Json(request): Json<EventAggregateRequest>,
) -> Result<Json<EventAggregateResponse>, ApiError> {
    if request.events.is_empty() {
        return Err(ApiError::InvalidParameter(
            "At least one event is required".to_string(),
        ));
    }

    let key = AssetKey::new(request.asset.as_str())?;
    let class = state.policies.class_of(&key);
    let policy = class.reindex_policy();

    let mut anchors = Vec::with_capacity(request.events.len());
    for event in &request.events {
        anchors.push(parse_date("event", &event.date)?);
    }

    // One fetch spanning every window
    let fetch_start = *anchors.iter().min().expect("events checked non-empty")
        - chrono::Duration::days(request.before as i64);
    let fetch_end = *anchors.iter().max().expect("events checked non-empty")
        + chrono::Duration::days(request.after as i64);

    let provider = state.provider.lock().await;
    let series = get_named_series(&provider, &key, &DateRange::new(fetch_start, fetch_end))?;
    drop(provider);

    let mut windows = Vec::with_capacity(request.events.len());
    let mut skipped = Vec::new();
    for (event, &anchor) in request.events.iter().zip(anchors.iter()) {
        match reindex_around(
            &series,
            &key,
            &event.id,
            anchor,
            request.before,
            request.after,
            policy,
        ) {
            Ok(window) => windows.push(window),
            Err(e) => skipped.push(Skipped {
                id: event.id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let table = aggregate_events(windows).map_err(|_| {
        ApiError::InsufficientData(format!(
            "None of the {} events had usable data",
            request.events.len()
        ))
    })?;

    Ok(Json(EventAggregateResponse {
        asset: request.asset,
        class,
        reindex_policy: policy,
        offsets: table.offsets,
        mean: table.mean,
        median: table.median,
        events: table.per_event,
        skipped,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_series::TimePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn seeded_state() -> AppState {
        let mut provider = SqliteDataProvider::new_in_memory().unwrap();
        let start = d(2024, 1, 1);
        // 60 weekday-ish days of co-moving closes
        let aapl: Vec<TimePoint> = (0..60)
            .map(|i| {
                TimePoint::new(
                    start + chrono::Duration::days(i),
                    150.0 + (i as f64 * 0.4).sin() * 5.0 + i as f64 * 0.1,
                )
            })
            .collect();
        let spx: Vec<TimePoint> = (0..60)
            .map(|i| {
                TimePoint::new(
                    start + chrono::Duration::days(i),
                    4800.0 + (i as f64 * 0.4).sin() * 40.0 + i as f64 * 0.5,
                )
            })
            .collect();
        provider
            .store_series(
                &AssetKey::new("AAPL").unwrap(),
                &Series::new(aapl).unwrap(),
            )
            .unwrap();
        provider
            .store_series(
                &AssetKey::new("^GSPC").unwrap(),
                &Series::new(spx).unwrap(),
            )
            .unwrap();
        AppState::new(provider)
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.0["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_assets_reports_classes() {
        let state = seeded_state();
        let response = list_assets(State(state)).await.unwrap();
        let assets = &response.0.assets;
        assert_eq!(assets.len(), 2);

        let spx = assets.iter().find(|a| a.key == "^GSPC").unwrap();
        assert_eq!(spx.class, AssetClass::Index);
        assert_eq!(spx.reindex_policy, ReindexPolicy::Multiplicative);
        assert_eq!(spx.points, 60);
    }

    #[tokio::test]
    async fn test_get_asset_data() {
        let state = seeded_state();
        let response = get_asset_data(
            State(state),
            Path("AAPL".to_string()),
            Query(DataQueryParams {
                start: "2024-01-01".to_string(),
                end: "2024-01-10".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.data.len(), 10);
        assert_eq!(response.0.data[0].date, d(2024, 1, 1));
    }

    #[tokio::test]
    async fn test_get_asset_data_unknown_asset() {
        let state = seeded_state();
        let result = get_asset_data(
            State(state),
            Path("GHOST".to_string()),
            Query(DataQueryParams {
                start: "2024-01-01".to_string(),
                end: "2024-01-10".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::AssetNotFound(_))));
    }

    #[tokio::test]
    async fn test_rolling_stats_shape() {
        let state = seeded_state();
        let response = get_rolling_stats(
            State(state),
            Path(("AAPL".to_string(), "^GSPC".to_string())),
            Query(RollingQueryParams {
                start: "2024-01-01".to_string(),
                end: "2024-02-29".to_string(),
                window: 20,
                periods: Some(1),
            }),
        )
        .await
        .unwrap();

        // 60 aligned dates -> 59 returns -> 39 windows
        assert_eq!(response.0.correlation.len(), 39);
        assert_eq!(response.0.beta.len(), 39);
        assert_eq!(response.0.dates.len(), 39);
        for &r in &response.0.correlation {
            assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&r));
        }
    }

    #[tokio::test]
    async fn test_rolling_stats_window_too_large_is_empty() {
        let state = seeded_state();
        let response = get_rolling_stats(
            State(state),
            Path(("AAPL".to_string(), "^GSPC".to_string())),
            Query(RollingQueryParams {
                start: "2024-01-01".to_string(),
                end: "2024-02-29".to_string(),
                window: 500,
                periods: Some(1),
            }),
        )
        .await
        .unwrap();

        assert!(response.0.correlation.is_empty());
        assert!(response.0.dates.is_empty());
    }

    #[tokio::test]
    async fn test_rolling_stats_rejects_zero_window() {
        let state = seeded_state();
        let result = get_rolling_stats(
            State(state),
            Path(("AAPL".to_string(), "^GSPC".to_string())),
            Query(RollingQueryParams {
                start: "2024-01-01".to_string(),
                end: "2024-02-29".to_string(),
                window: 0,
                periods: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_matrix_partial_success() {
        let state = seeded_state();
        let response = build_matrix(
            State(state),
            Json(MatrixRequest {
                assets: vec![
                    "AAPL".to_string(),
                    "^GSPC".to_string(),
                    "GHOST".to_string(),
                ],
                start: "2024-01-01".to_string(),
                end: "2024-02-29".to_string(),
                periods: None,
            }),
        )
        .await
        .unwrap();

        // GHOST skipped, the two live assets produce a 2x2
        assert_eq!(response.0.skipped.len(), 1);
        assert_eq!(response.0.skipped[0].id, "GHOST");
        assert_eq!(response.0.correlation.assets.len(), 2);
        assert_eq!(response.0.correlation.matrix[0][0], 1.0);
        assert_eq!(response.0.beta.matrix[1][1], 1.0);
    }

    #[tokio::test]
    async fn test_matrix_requires_two_live_assets() {
        let state = seeded_state();
        let result = build_matrix(
            State(state),
            Json(MatrixRequest {
                assets: vec!["AAPL".to_string(), "GHOST".to_string()],
                start: "2024-01-01".to_string(),
                end: "2024-02-29".to_string(),
                periods: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InsufficientData(_))));
    }

    #[tokio::test]
    async fn test_event_aggregation_partial_success() {
        let state = seeded_state();
        let response = aggregate_event_impact(
            State(state),
            Json(EventAggregateRequest {
                asset: "AAPL".to_string(),
                events: vec![
                    EventSpec {
                        id: "mid-january".to_string(),
                        date: "2024-01-20".to_string(),
                    },
                    EventSpec {
                        id: "ancient".to_string(),
                        date: "2020-01-01".to_string(),
                    },
                ],
                before: 5,
                after: 10,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.offsets.len(), 16);
        assert_eq!(response.0.mean.len(), 16);
        assert_eq!(response.0.events.len(), 1);
        assert_eq!(response.0.skipped.len(), 1);
        assert_eq!(response.0.skipped[0].id, "ancient");

        // Anchor offset rebases to 100
        let zero = response.0.offsets.iter().position(|&o| o == 0).unwrap();
        assert_eq!(response.0.mean[zero], 100.0);
        assert_eq!(response.0.reindex_policy, ReindexPolicy::Multiplicative);
    }

    #[tokio::test]
    async fn test_event_aggregation_all_skipped_is_error() {
        let state = seeded_state();
        let result = aggregate_event_impact(
            State(state),
            Json(EventAggregateRequest {
                asset: "AAPL".to_string(),
                events: vec![EventSpec {
                    id: "ancient".to_string(),
                    date: "2020-01-01".to_string(),
                }],
                before: 5,
                after: 10,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InsufficientData(_))));
    }

    #[tokio::test]
    async fn test_event_aggregation_rejects_empty_events() {
        let state = seeded_state();
        let result = aggregate_event_impact(
            State(state),
            Json(EventAggregateRequest {
                asset: "AAPL".to_string(),
                events: Vec::new(),
                before: 5,
                after: 10,
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InvalidParameter(_))));
    }
}
