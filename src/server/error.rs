//! Error types for the REST API server

use crate::engine::EngineError;
use crate::time_series::DataProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Asset not found in the data store
    AssetNotFound(String),
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Invalid date range
    InvalidDateRange(String),
    /// Not enough overlapping data to compute the requested statistic
    InsufficientData(String),
    /// Analytics computation failed
    ComputationFailed(String),
    /// Internal server error
    InternalError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::AssetNotFound(asset) => write!(f, "Asset not found: {}", asset),
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            ApiError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            ApiError::ComputationFailed(msg) => write!(f, "Computation failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::AssetNotFound(asset) => (
                StatusCode::NOT_FOUND,
                "AssetNotFound",
                format!("Asset '{}' not found", asset),
            ),
            ApiError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, "InvalidParameter", msg.clone())
            }
            ApiError::InvalidDateRange(msg) => {
                (StatusCode::BAD_REQUEST, "InvalidDateRange", msg.clone())
            }
            ApiError::InsufficientData(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "InsufficientData",
                msg.clone(),
            ),
            ApiError::ComputationFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ComputationFailed",
                msg.clone(),
            ),
            ApiError::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                msg.clone(),
            ),
        };

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

// Conversions from library error types

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InsufficientData { .. } => ApiError::InsufficientData(err.to_string()),
            EngineError::DivisionByZero { .. } => ApiError::ComputationFailed(err.to_string()),
            EngineError::NoData { .. } => ApiError::InsufficientData(err.to_string()),
        }
    }
}

impl From<DataProviderError> for ApiError {
    fn from(err: DataProviderError) -> Self {
        match err {
            DataProviderError::AssetNotFound => {
                ApiError::AssetNotFound("requested asset".to_string())
            }
            DataProviderError::InvalidDateRange => ApiError::InvalidDateRange(err.to_string()),
            DataProviderError::Other(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<chrono::ParseError> for ApiError {
    fn from(err: chrono::ParseError) -> Self {
        ApiError::InvalidDateRange(format!("Date parse error: {}", err))
    }
}

impl From<crate::asset_key::AssetKeyError> for ApiError {
    fn from(err: crate::asset_key::AssetKeyError) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}
