use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::application::{AppError, ErrorKind};

/// HTTP-facing error: a status plus a stable machine-readable name.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    pub fn not_found(error: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
    }
}

/// JSON response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.status.as_u16(),
            error: self.error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_name(err: &AppError) -> &'static str {
    match err {
        AppError::InvalidAmount(_) => "INVALID_AMOUNT",
        AppError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        AppError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
        AppError::InvalidCurrency(_) => "INVALID_CURRENCY",
        AppError::InvalidInput(_) => "INVALID_INPUT",
        AppError::UserNotFound(_) => "USER_NOT_FOUND",
        AppError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
        AppError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
        AppError::UsernameTaken(_) => "USERNAME_TAKEN",
        AppError::EmailTaken(_) => "EMAIL_TAKEN",
        AppError::AccountAlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
        AppError::UserHasAccounts { .. } => "USER_HAS_ACCOUNTS",
        AppError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
        AppError::UserBlocked(_) => "USER_BLOCKED",
        AppError::Storage(_) => "INTERNAL_ERROR",
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = status_for(err.kind());
        let message = match &err {
            AppError::Storage(e) => {
                error!(error = ?e, "request failed with a storage error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        Self::new(status, error_name(&err), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let err = ApiError::from(AppError::AccountNotFound("ACC1".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error, "ACCOUNT_NOT_FOUND");

        let err = ApiError::from(AppError::UserBlocked("john_doe".into()));
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err = ApiError::from(AppError::EmailTaken("john@email.com".into()));
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = ApiError::from(AppError::ConcurrentModification("ACC1".into()));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.error, "CONCURRENT_MODIFICATION");
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = ApiError::from(AppError::Storage(anyhow::anyhow!("disk on fire")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }
}
