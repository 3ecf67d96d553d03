//! RPC Client Module - Alchemy JSON-RPC transport
//!
//! 1. One configured endpoint, API key never logged
//! 2. Gzip compression for large transfer pages
//! 3. User-Agent header for the provider dashboard
//! 4. Transport failures classified into the hunter's error taxonomy
//!
//! Retries are not done here: callers wrap each request in a
//! `BackoffRetrier` so that the budget is visible per page / per call.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// JSON-RPC provider for a single endpoint
#[derive(Clone)]
pub struct RpcProvider {
    url: String,
    client: reqwest::Client,
}

impl RpcProvider {
    /// Create a provider for `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            url: url.into(),
            client: build_client(timeout)?,
        })
    }

    /// Execute one JSON-RPC call, no retry. A missing `result` is reported
    /// as `MissingField`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!("📡 {} → {}", method, self.masked_url());

        let response = self.client.post(&self.url).json(&payload).send().await?;
        check_status(response.status())?;

        let body = response.bytes().await?;
        let json: RpcResponse<T> = serde_json::from_slice(&body)?;

        if let Some(error) = json.error {
            return Err(error.into_app_error(method));
        }

        json.result.ok_or_else(|| AppError::missing_field("result"))
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        match self.url.split_once("/v2/") {
            Some((base, _)) => format!("{}/v2/***HIDDEN***", base),
            None => self.url.clone(),
        }
    }
}

/// Build HTTP client with custom headers (gzip enabled)
pub(crate) fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| AppError::invalid_config(format!("Failed to build HTTP client: {}", e)))
}

/// Map an HTTP status onto the error taxonomy.
///
/// 429 is throttling, 5xx is a transient server problem and retryable, any
/// other non-success status means the request itself is wrong.
pub(crate) fn check_status(status: StatusCode) -> AppResult<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::rate_limited("Rate limited (HTTP 429)"));
    }
    if status.is_server_error() {
        return Err(AppError::connectivity(format!("HTTP error: {}", status)));
    }
    if !status.is_success() {
        return Err(AppError::bad_response(format!("HTTP error: {}", status)));
    }
    Ok(())
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Check if this is a rate limit error (Alchemy: code 429 or -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == 429
            || self.code == -32005
            || self.message.to_lowercase().contains("rate limit")
    }

    fn into_app_error(self, method: &str) -> AppError {
        let msg = format!("{} RPC error: {} (code: {})", method, self.message, self.code);
        if self.is_rate_limit() {
            AppError::rate_limited(msg)
        } else {
            AppError::bad_response(msg)
        }
    }
}
