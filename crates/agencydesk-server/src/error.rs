//! HTTP rendering of [`BrokerError`].

use agencydesk_core::error::BrokerError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler and middleware.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub BrokerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BrokerError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            BrokerError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BrokerError::NotFound { .. } => StatusCode::NOT_FOUND,
            BrokerError::Validation { .. } => StatusCode::BAD_REQUEST,
            BrokerError::Conflict { .. } => StatusCode::CONFLICT,
            BrokerError::Database(_) | BrokerError::Crypto(_) | BrokerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self.0, "request failed");
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(BrokerError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(BrokerError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(BrokerError::validation(rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
