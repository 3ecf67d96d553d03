//! Centralized Error Handling Module
//!
//! Every failure in the fetch pipeline carries an [`ErrorCode`] so the run
//! report and the logs can tell transient network trouble apart from
//! structurally broken responses.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - NET_xxx: transport / provider throttling
//! - RETRY_xxx: retry budget
//! - RESP_xxx: malformed provider responses
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ============================================
    // Network Errors
    // ============================================
    /// Connection refused, reset, timed out, or a transient 5xx
    ConnectivityFailure,
    /// Provider signaled throttling (HTTP 429 or GoPlus code 4029)
    RateLimited,

    // ============================================
    // Retry Errors
    // ============================================
    /// Retry budget exhausted
    MaxRetriesExceeded,

    // ============================================
    // Response Errors
    // ============================================
    /// Expected field absent from an otherwise valid response
    MissingField,
    /// Response could not be interpreted
    BadResponse,

    // ============================================
    // Configuration / IO Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Local file access failed
    Io,
    /// A worker task died (panic / cancellation)
    Internal,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectivityFailure => "NET_CONNECTIVITY",
            Self::RateLimited => "NET_RATE_LIMITED",
            Self::MaxRetriesExceeded => "RETRY_EXHAUSTED",
            Self::MissingField => "RESP_MISSING_FIELD",
            Self::BadResponse => "RESP_BAD_RESPONSE",
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::Io => "IO_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Check if error is retryable.
    ///
    /// Structural failures are never retried: the same request would get the
    /// same broken answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectivityFailure | Self::RateLimited)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConnectivityFailure, msg)
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, msg)
    }

    /// Retry budget exhausted; keeps the last failure as source
    pub fn max_retries_exceeded(label: &str, attempts: u32, last: AppError) -> Self {
        Self::with_source(
            ErrorCode::MaxRetriesExceeded,
            format!("{} failed after {} attempts: {}", label, attempts, last),
            last,
        )
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Missing '{}' in response", field),
        )
    }

    pub fn bad_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadResponse, msg)
    }

    pub fn missing_env(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Environment variable {} not configured", name),
        )
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Io, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::with_source(ErrorCode::BadResponse, "Failed to decode response body", err)
        } else if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            let msg = format!("Request failed: {}", err);
            Self::with_source(ErrorCode::ConnectivityFailure, msg, err)
        } else {
            let msg = err.to_string();
            Self::with_source(ErrorCode::BadResponse, msg, err)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::BadResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::connectivity("connection reset");
        assert_eq!(err.code, ErrorCode::ConnectivityFailure);
        assert_eq!(err.code_str(), "NET_CONNECTIVITY");
        assert_eq!(err.to_string(), "[NET_CONNECTIVITY] connection reset");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::ConnectivityFailure.is_retryable());
        assert!(ErrorCode::RateLimited.is_retryable());
        assert!(!ErrorCode::BadResponse.is_retryable());
        assert!(!ErrorCode::MissingField.is_retryable());
        assert!(!ErrorCode::MaxRetriesExceeded.is_retryable());
    }

    #[test]
    fn test_exhausted_keeps_source() {
        use std::error::Error;

        let err = AppError::max_retries_exceeded("eth_blockNumber", 5, AppError::connectivity("down"));
        assert_eq!(err.code, ErrorCode::MaxRetriesExceeded);
        assert!(err.message.contains("5 attempts"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_error_is_bad_response() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::BadResponse);
    }
}
