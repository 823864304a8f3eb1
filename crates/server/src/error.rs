use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::validation::ValidationError;
use services::services::{lead_conversion::ConversionError, transitions::TransitionError};
use thiserror::Error;
use tracing::{error, warn};
use utils::response::ApiResponse;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("rate limit exceeded")]
    TooManyRequests,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Transition(_) => StatusCode::CONFLICT,
            ApiError::Conversion(err) => match err {
                ConversionError::LeadNotFound => StatusCode::NOT_FOUND,
                ConversionError::Validation(_) => StatusCode::BAD_REQUEST,
                ConversionError::AlreadyConverted(_) | ConversionError::Transition(_) => {
                    StatusCode::CONFLICT
                }
                ConversionError::Database(err) => database_status(err),
            },
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(err) => database_status(err),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Database(err) | ApiError::Conversion(ConversionError::Database(err)) => {
                database_message(err).to_string()
            }
            other => other.to_string(),
        }
    }
}

fn database_status(err: &sqlx::Error) -> StatusCode {
    match err {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db_err)
            if is_foreign_key_error(&**db_err) || db_err.is_unique_violation() =>
        {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// SQLite reports a `RESTRICT` action through the trigger constraint code
/// (1811) rather than the foreign key one (787).
fn is_foreign_key_error(db_err: &dyn sqlx::error::DatabaseError) -> bool {
    db_err.is_foreign_key_violation()
        || matches!(db_err.code().as_deref(), Some("787") | Some("1811"))
}

fn database_message(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::RowNotFound => "record not found",
        sqlx::Error::Database(db_err) if is_foreign_key_error(&**db_err) => {
            "record is still referenced by other records"
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => "record already exists",
        _ => "internal server error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, ?self, "request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            warn!(error = %self, "rejected unauthenticated request");
        }
        (status, Json(ApiResponse::<()>::error(self.message()))).into_response()
    }
}
