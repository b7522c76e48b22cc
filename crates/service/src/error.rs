use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use normform_core::error::FdError;
use normform_sql::error::SqlError;

/// The HTTP-facing error type every handler converges on (spec §7).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Fd(#[from] FdError),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Fd(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Sql(SqlError::InputValidation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Sql(SqlError::UnknownTable(name)) => (StatusCode::NOT_FOUND, format!("table '{name}' not found")),
            ApiError::Sql(SqlError::SchemaIntrospection(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Sql(SqlError::FdInconsistency(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Sql(err @ SqlError::DecompositionInvariant(_)) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Sql(err @ SqlError::Database { .. }) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Sql(err @ SqlError::ConnectionFailure(_)) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        log::warn!("request failed: {message}");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
