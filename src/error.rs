//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum ErrorKind {
    DuplicateKey,
    NotFound,
    PreconditionFailed,
    InvalidCredentials,
    ValidationFailed,
    Unauthenticated,
    Forbidden,
    Internal,
}

/// Stable numeric codes carried in error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchBook = 5,
    NoCopiesAvailable = 7,
    Duplicate = 8,
    BadValue = 18,
    UsernameAlreadyExists = 19,
    NoSuchData = 20,
    NoActiveLoan = 22,
    InvalidCredentials = 23,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Book ID '{0}' already exists")]
    DuplicateBookId(String),

    #[error("Book '{0}' not found")]
    BookNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No copies of book '{0}' are available")]
    NoCopiesAvailable(String),

    #[error("No active loan for book '{book_id}' and borrower '{borrower_id}'")]
    NoActiveLoan { book_id: String, borrower_id: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::DuplicateUsername(_) | AppError::DuplicateBookId(_) => ErrorKind::DuplicateKey,
            AppError::BookNotFound(_) | AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::NoCopiesAvailable(_) | AppError::NoActiveLoan { .. } => {
                ErrorKind::PreconditionFailed
            }
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AppError::Validation(_) => ErrorKind::ValidationFailed,
            AppError::Authentication(_) => ErrorKind::Unauthenticated,
            AppError::Authorization(_) => ErrorKind::Forbidden,
            AppError::Database(_) | AppError::Migration(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            AppError::DuplicateUsername(_) => ErrorCode::UsernameAlreadyExists,
            AppError::DuplicateBookId(_) => ErrorCode::Duplicate,
            AppError::BookNotFound(_) => ErrorCode::NoSuchBook,
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::NoCopiesAvailable(_) => ErrorCode::NoCopiesAvailable,
            AppError::NoActiveLoan { .. } => ErrorCode::NoActiveLoan,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Authentication(_) | AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::Database(_) | AppError::Migration(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::DuplicateKey => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PreconditionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::InvalidCredentials | ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let code = self.code();
        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            kind: self.kind(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
