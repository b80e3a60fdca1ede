//! HTTP error responses.
//!
//! Every failure leaves the API as
//! `{"error": msg, "errorDetails": {"errorCode": code, "errorMessage": msg}}`.

use crate::utils::error::HoneycombError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Body could not be parsed into the request type (422)
    InvalidBody(String),
    /// Wrapped library error
    Service(HoneycombError),
}

impl From<HoneycombError> for ApiError {
    fn from(err: HoneycombError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidBody(msg) => write!(f, "Invalid request body: {}", msg),
            ApiError::Service(err) => write!(f, "{}", err),
        }
    }
}

fn error_code(err: &HoneycombError) -> (StatusCode, &'static str) {
    match err {
        HoneycombError::ValidationError { .. } | HoneycombError::InvalidConfigValueError { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "ERR_VALIDATION")
        }
        HoneycombError::StorageUnavailable => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ERR_STORAGE_UNAVAILABLE")
        }
        HoneycombError::BatchFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ERR_BATCH_FAILED")
        }
        HoneycombError::StorageError { .. } | HoneycombError::ApiError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ERR_STORAGE")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL_SERVER_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidBody(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ERR_VALIDATION",
                msg.clone(),
            ),
            ApiError::Service(err) => {
                let (status, code) = error_code(err);
                (status, code, err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(code, "❌ {}", message);
        } else {
            tracing::warn!(code, "{}", message);
        }

        let body = Json(json!({
            "error": message,
            "errorDetails": {
                "errorCode": code,
                "errorMessage": message,
            }
        }));

        (status, body).into_response()
    }
}
