//! Error types for shelf-audit HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Membership tier lacks the feature (403)
    #[error("{message}")]
    FeatureLocked {
        feature: String,
        required_tier: Option<String>,
        message: String,
    },

    /// shelf-common error
    #[error("Common error: {0}")]
    Common(#[from] shelf_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::FeatureLocked { .. } => StatusCode::FORBIDDEN,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::FeatureLocked { .. } => "FEATURE_LOCKED",
            ApiError::Common(_) => "COMMON_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
            ApiError::FeatureLocked {
                feature,
                required_tier,
                message,
            } => json!({
                "error": {
                    "code": code,
                    "message": message,
                    "feature": feature,
                    "requiredTier": required_tier,
                }
            }),
            // store details stay in the log
            ApiError::Common(_) => json!({
                "error": {
                    "code": code,
                    "message": "Internal error",
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
