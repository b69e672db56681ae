//! Error types for the Circulate server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure taxonomy exposed to API callers.
///
/// Every `AppError` classifies into exactly one kind; the kind decides the
/// HTTP status and whether the caller may usefully retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    PolicyViolation,
    DependencyUnavailable,
    Invalid,
    Internal,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("User with id {0} not found")]
    UserNotFound(i32),

    #[error("Item with id {0} not found")]
    ItemNotFound(i32),

    #[error("Loan with id {0} not found")]
    LoanNotFound(i32),

    #[error("Item with id {0} has no available copies")]
    ItemUnavailable(i32),

    #[error("User {user_id} already has an active loan for item {item_id}")]
    DuplicateActiveLoan { user_id: i32, item_id: i32 },

    #[error("Loan {0} is not active")]
    LoanNotActive(i32),

    #[error("Loan {0} has reached the maximum number of extensions")]
    MaxExtensionsReached(i32),

    #[error("{0} is unavailable")]
    DependencyUnavailable(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UserNotFound(_)
            | AppError::ItemNotFound(_)
            | AppError::LoanNotFound(_) => ErrorKind::NotFound,
            AppError::ItemUnavailable(_) | AppError::DuplicateActiveLoan { .. } => {
                ErrorKind::Conflict
            }
            AppError::LoanNotActive(_) | AppError::MaxExtensionsReached(_) => {
                ErrorKind::PolicyViolation
            }
            AppError::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
            AppError::Validation(_) => ErrorKind::Invalid,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::PolicyViolation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            kind: self.kind(),
            error: format!("{:?}", self.kind()),
            message,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
