use crate::domain::Decimal;
use crate::service::LedgerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Insufficient balance. You can withdraw up to {available}")]
    InsufficientBalance { available: Decimal },
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance { available } => {
                AppError::InsufficientBalance { available }
            }
            LedgerError::NotFound(what) => AppError::NotFound(what),
            LedgerError::NonPositiveQuantity
            | LedgerError::UnknownUser(_)
            | LedgerError::UnknownAsset(_)
            | LedgerError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
            LedgerError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg }),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InsufficientBalance { available } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": format!(
                        "Insufficient balance. You can withdraw up to {}",
                        available
                    ),
                    "available": available.to_canonical_string(),
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Map a write error to BadRequest when it is a uniqueness violation
/// (duplicate email, asset symbol, or external transaction id).
pub fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.message().contains("UNIQUE constraint failed") {
            return AppError::BadRequest(message.to_string());
        }
    }
    AppError::from(err)
}
