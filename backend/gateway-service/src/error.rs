/// Error types for gateway-service
///
/// Errors are converted to structured JSON responses for API clients. Quota
/// and rate errors carry the observed count and the ceiling so the caller
/// can display "X/Y used"; store errors surface as a generic failure and are
/// never corrected automatically.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for gateway-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Which identity a daily quota decision was keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    User,
    Origin,
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller is not authenticated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Required payload fields are missing or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// Daily write quota exhausted for a user or a network origin
    #[error("Daily quota exceeded ({count}/{ceiling})")]
    DailyQuotaExceeded {
        scope: QuotaScope,
        count: i64,
        ceiling: i64,
    },

    /// Hourly read ceiling exhausted for a network origin
    #[error("Hourly read rate exceeded ({count}/{ceiling})")]
    ReadRateExceeded { count: u32, ceiling: u32 },

    /// Malformed request input (e.g. an undecodable cursor)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Counter store operation failed
    #[error("Counter store error: {0}")]
    CounterStore(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code surfaced in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "not-authenticated",
            AppError::Validation(_) => "missing-required-field",
            AppError::DailyQuotaExceeded {
                scope: QuotaScope::User,
                ..
            } => "daily-quota-user-exceeded",
            AppError::DailyQuotaExceeded {
                scope: QuotaScope::Origin,
                ..
            } => "daily-quota-origin-exceeded",
            AppError::ReadRateExceeded { .. } => "hourly-rate-exceeded",
            AppError::BadRequest(_) => "bad-request",
            AppError::Database(_) | AppError::CounterStore(_) | AppError::Internal(_) => {
                "internal-error"
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DailyQuotaExceeded { .. } | AppError::ReadRateExceeded { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Database(_) | AppError::CounterStore(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Store failures are logged with detail but surfaced generically.
        let message = match self {
            AppError::Database(msg) | AppError::CounterStore(msg) | AppError::Internal(msg) => {
                tracing::error!(code = self.code(), "request failed: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "success": false,
            "error": message,
            "code": self.code(),
            "status": status.as_u16(),
        });

        match self {
            AppError::DailyQuotaExceeded { count, ceiling, .. } => {
                body["count"] = serde_json::json!(count);
                body["ceiling"] = serde_json::json!(ceiling);
            }
            AppError::ReadRateExceeded { count, ceiling } => {
                body["count"] = serde_json::json!(count);
                body["ceiling"] = serde_json::json!(ceiling);
            }
            _ => {}
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CounterStore(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_map_to_429_with_counts() {
        let err = AppError::DailyQuotaExceeded {
            scope: QuotaScope::User,
            count: 5,
            ceiling: 5,
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "daily-quota-user-exceeded");

        let err = AppError::DailyQuotaExceeded {
            scope: QuotaScope::Origin,
            count: 20,
            ceiling: 20,
        };
        assert_eq!(err.code(), "daily-quota-origin-exceeded");

        let err = AppError::ReadRateExceeded {
            count: 301,
            ceiling: 300,
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "hourly-rate-exceeded");
    }

    #[test]
    fn auth_and_validation_codes() {
        assert_eq!(
            AppError::Unauthorized("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unauthorized("no token".into()).code(),
            "not-authenticated"
        );
        assert_eq!(
            AppError::Validation("name".into()).code(),
            "missing-required-field"
        );
    }

    #[test]
    fn store_errors_surface_generically() {
        let err = AppError::Database("connection refused to 10.0.0.5".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "internal-error");
    }
}
