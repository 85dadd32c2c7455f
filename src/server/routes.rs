//! Route definitions for the API server

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // The dashboard frontend is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stored assets and raw series
        .route("/assets", get(handlers::list_assets))
        .route("/assets/:asset/data", get(handlers::get_asset_data))
        // Cross-asset analytics
        .route(
            "/analytics/rolling/:base/:target",
            get(handlers::get_rolling_stats),
        )
        .route("/analytics/matrix", post(handlers::build_matrix))
        // Event-impact analysis
        .route("/events/aggregate", post(handlers::aggregate_event_impact))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(state)
}
