//! Error types for nursery_feed

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failure talking to the inventory store
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Store answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Failed to parse JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Reading an import file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A previous holder of the connection panicked
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Invalid start-up configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--supabase-url requires --supabase-key (or SUPABASE_ANON_KEY)")]
    MissingSupabaseKey,
    #[error("invalid origin {0:?}: {1}")]
    InvalidOrigin(String, String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Error returned by an HTTP handler
///
/// Every variant renders as `{"success": false, "error": ...}`; the message is
/// what the client sees, details stay in the server log.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing input (400)
    #[error("{0}")]
    Validation(String),
    /// Requested row does not exist (404)
    #[error("{0}")]
    NotFound(String),
    /// Client exceeded its request budget (429)
    #[error("Too many requests")]
    RateLimited,
    /// The inventory store call failed (500)
    #[error("{message}")]
    Upstream {
        message: &'static str,
        code: Option<&'static str>,
    },
    /// Anything unexpected (500)
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn upstream(message: &'static str) -> Self {
        ApiError::Upstream {
            message,
            code: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { .. } | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::Upstream { code, .. } => *code,
            _ => None,
        }
    }
}

/// JSON body for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::upstream("Failed to fetch products").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_omits_missing_code() {
        let body = ErrorBody {
            success: false,
            error: ApiError::RateLimited.to_string(),
            code: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"Too many requests"}"#);
    }

    #[test]
    fn upstream_error_carries_code() {
        let err = ApiError::Upstream {
            message: "Failed to verify products",
            code: Some("DATABASE_ERROR"),
        };
        assert_eq!(err.code(), Some("DATABASE_ERROR"));
        assert_eq!(err.to_string(), "Failed to verify products");
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "HTTP error: 503 Service Unavailable");
    }
}
