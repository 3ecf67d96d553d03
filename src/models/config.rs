//! Configuration module for Token Hunter
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! first). Defaults live in utils/constants.rs.

use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use crate::core::retry::RetryPolicy;
use crate::utils::constants::{
    build_alchemy_url, get_chain_name, CHAIN_ID_ETHEREUM, CHAIN_INITIAL_RETRY_MS,
    CHAIN_MAX_ATTEMPTS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_QUERIES,
    DEFAULT_WINDOW_SIZE, GOPLUS_BASE_URL, MAX_RETRY_DELAY_MS, SECURITY_MAX_ATTEMPTS,
    SECURITY_RATE_LIMIT_PAUSE_MS,
};

/// Configuration for a hunt run
#[derive(Debug, Clone)]
pub struct HunterConfig {
    /// Chain scanned by Alchemy and queried on GoPlus
    pub chain_id: u64,
    /// Alchemy JSON-RPC endpoint (contains the API key)
    pub alchemy_url: String,
    /// GoPlus token_security base URL, without chain id
    pub security_base_url: String,
    /// Blocks behind head covered by the scan
    pub window_size: u64,
    /// Bound on in-flight security queries
    pub max_concurrent_queries: usize,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Retry policy for eth_blockNumber and transfer pages
    pub chain_retry: RetryPolicy,
    /// Retry policy for a single security query
    pub security_retry: RetryPolicy,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            chain_id: CHAIN_ID_ETHEREUM,
            alchemy_url: String::new(),
            security_base_url: GOPLUS_BASE_URL.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            chain_retry: RetryPolicy::new(
                CHAIN_MAX_ATTEMPTS,
                Duration::from_millis(CHAIN_INITIAL_RETRY_MS),
            )
            .with_max_delay(Duration::from_millis(MAX_RETRY_DELAY_MS)),
            security_retry: RetryPolicy::new(
                SECURITY_MAX_ATTEMPTS,
                Duration::from_millis(SECURITY_RATE_LIMIT_PAUSE_MS),
            )
            .with_rate_limit_pause(Duration::from_millis(SECURITY_RATE_LIMIT_PAUSE_MS)),
        }
    }
}

impl HunterConfig {
    /// Build config from environment variables. Call [`Self::with_overrides`]
    /// before use; values are not validated here.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        config.chain_id = env_parse("CHAIN_ID")?.unwrap_or(CHAIN_ID_ETHEREUM);
        config.alchemy_url = Self::resolve_alchemy_url(config.chain_id)?;

        if let Some(url) = env_string("GOPLUS_BASE_URL") {
            config.security_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(size) = env_parse("HUNTER_WINDOW_SIZE")? {
            config.window_size = size;
        }
        if let Some(limit) = env_parse("HUNTER_MAX_CONCURRENT_QUERIES")? {
            config.max_concurrent_queries = limit;
        }
        if let Some(secs) = env_parse("HUNTER_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Apply command-line overrides, then validate the merged config.
    /// Validation runs only here so an override can fix a bad env value.
    pub fn with_overrides(
        mut self,
        window_size: Option<u64>,
        max_concurrent_queries: Option<usize>,
    ) -> AppResult<Self> {
        if let Some(size) = window_size {
            self.window_size = size;
        }
        if let Some(limit) = max_concurrent_queries {
            self.max_concurrent_queries = limit;
        }

        self.validate()?;

        info!(
            "⚙️ Chain: {} ({}) | Window: {} blocks | Query concurrency: {}",
            get_chain_name(self.chain_id),
            self.chain_id,
            self.window_size,
            self.max_concurrent_queries
        );

        Ok(self)
    }

    /// Alchemy URL from ALCHEMY_HTTP_URL, or built from ALCHEMY_API_KEY.
    /// The key is never logged.
    fn resolve_alchemy_url(chain_id: u64) -> AppResult<String> {
        if let Some(url) = env_string("ALCHEMY_HTTP_URL") {
            return Ok(url);
        }

        let key = env_string("ALCHEMY_API_KEY")
            .filter(|k| k != "YOUR_API_KEY")
            .ok_or_else(|| AppError::missing_env("ALCHEMY_API_KEY"))?;

        info!("🔑 Using ALCHEMY_API_KEY (key hidden)");
        build_alchemy_url(chain_id, &key)
            .ok_or_else(|| AppError::invalid_config(format!("Unsupported chain_id: {}", chain_id)))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.window_size == 0 {
            return Err(AppError::invalid_config("window size must be positive"));
        }
        if self.max_concurrent_queries == 0 {
            return Err(AppError::invalid_config("query concurrency must be positive"));
        }
        if self.chain_retry.max_attempts == 0 || self.security_retry.max_attempts == 0 {
            return Err(AppError::invalid_config("retry policies need at least one attempt"));
        }
        Ok(())
    }

    /// Security endpoint for the configured chain
    pub fn security_url(&self) -> String {
        format!("{}/{}", self.security_base_url, self.chain_id)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> AppResult<Option<T>> {
    match env_string(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::invalid_config(format!("{}={} is not valid", name, raw))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[test]
    fn test_default_retry_policies() {
        let config = HunterConfig::default();
        assert_eq!(config.window_size, 8000);
        assert_eq!(config.chain_retry.max_attempts, 5);
        assert_eq!(config.chain_retry.initial_delay, Duration::from_secs(1));
        assert_eq!(config.security_retry.max_attempts, 3);
        assert_eq!(
            config.security_retry.rate_limit_pause,
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_security_url() {
        let config = HunterConfig::default();
        assert_eq!(
            config.security_url(),
            "https://api.gopluslabs.io/api/v1/token_security/1"
        );
    }

    #[test]
    fn test_override_fixes_invalid_env_value() {
        let from_env = HunterConfig {
            max_concurrent_queries: 0,
            ..HunterConfig::default()
        };

        let config = from_env.clone().with_overrides(None, Some(5)).unwrap();
        assert_eq!(config.max_concurrent_queries, 5);
        assert_eq!(config.window_size, 8000);

        let err = from_env.with_overrides(Some(100), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = HunterConfig {
            max_concurrent_queries: 0,
            ..HunterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
