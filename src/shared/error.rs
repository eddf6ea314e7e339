//! Application Error Types
//!
//! Centralized error handling with Axum integration. Every failure leaves the
//! server as the error envelope `{success: false, error: {code, message, details?}}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::response::error_response;
use super::trace_id::TraceId;

/// Machine-readable error codes clients are expected to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationError,
    BadRequest,
    AlreadyExists,
    RateLimitExceeded,
    InvalidFileType,
    FileTooLarge,
    InternalError,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status that always accompanies this code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationError | Self::BadRequest | Self::InvalidFileType => {
                StatusCode::BAD_REQUEST
            }
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File too large (max {max_bytes} bytes)")]
    FileTooLarge { max_bytes: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AppError {
    /// Caller has no valid session.
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".into())
    }

    /// Caller is authenticated but may not act on the resource.
    pub fn forbidden() -> Self {
        Self::Forbidden("You do not have permission to perform this action".into())
    }

    /// `resource` is a human label such as "Post" or "User".
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn validation_error(details: Vec<FieldError>) -> Self {
        Self::Validation(details)
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists(message.into())
    }

    pub fn server_error(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn rate_limit_error(retry_after_secs: u64) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            Self::InvalidFileType(_) => ErrorCode::InvalidFileType,
            Self::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            Self::Internal(_) | Self::Database(_) | Self::Redis(_) | Self::Storage(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Message safe to show to clients. Internal failures collapse to a generic text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::AlreadyExists(msg) => msg.clone(),
            Self::Validation(_) => "Request validation failed".into(),
            Self::RateLimited { .. } => "Too many requests. Please try again later.".into(),
            Self::InvalidFileType(content_type) => {
                format!("File type '{}' is not allowed", content_type)
            }
            Self::FileTooLarge { max_bytes } => {
                format!("File exceeds the maximum size of {} bytes", max_bytes)
            }
            Self::Internal(_) | Self::Database(_) | Self::Redis(_) | Self::Storage(_) => {
                "An unexpected error occurred".into()
            }
        }
    }

    pub fn is_internal(&self) -> bool {
        self.code() == ErrorCode::InternalError
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        if self.is_internal() {
            let trace_id = TraceId::current();
            tracing::error!(
                trace_id = trace_id.as_ref().map(TraceId::as_str).unwrap_or("-"),
                error = %self,
                "Request failed with internal error"
            );
        }

        let retry_after = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let message = self.public_message();
        let details = match self {
            Self::Validation(details) => Some(details),
            _ => None,
        };

        let mut response = error_response(code, message, code.status(), details);

        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use test_case::test_case;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test_case(AppError::unauthorized(), StatusCode::UNAUTHORIZED, "UNAUTHORIZED")]
    #[test_case(AppError::forbidden(), StatusCode::FORBIDDEN, "FORBIDDEN")]
    #[test_case(AppError::not_found("Post"), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[test_case(AppError::already_exists("Already liked"), StatusCode::CONFLICT, "ALREADY_EXISTS")]
    #[test_case(AppError::rate_limit_error(30), StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")]
    #[test_case(AppError::FileTooLarge { max_bytes: 10 }, StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE")]
    #[test_case(AppError::server_error("boom"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
    #[tokio::test]
    async fn constructors_fix_code_and_status(err: AppError, status: StatusCode, code: &str) {
        let response = err.into_response();
        assert_eq!(response.status(), status);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!(code));
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_detail() {
        let response = AppError::server_error("connection refused at 10.0.0.3:5432").into_response();
        let body = body_json(response).await;

        assert_eq!(body["error"]["message"], json!("An unexpected error occurred"));
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn validation_error_lists_every_field() {
        let response = AppError::validation_error(vec![
            FieldError::new("content", "Content is required"),
            FieldError::new("visibility", "Unknown visibility"),
        ])
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(
            body["error"]["details"],
            json!([
                {"field": "content", "message": "Content is required"},
                {"field": "visibility", "message": "Unknown visibility"},
            ])
        );
    }

    #[test]
    fn rate_limit_sets_retry_after_header() {
        let response = AppError::rate_limit_error(42).into_response();
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
