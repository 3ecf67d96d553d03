//! GoPlus Security API Client
//!
//! API: https://api.gopluslabs.io/api/v1/token_security/{chain_id}?contract_addresses=...
//! Free tier, no API key required, throttled per IP.
//!
//! Throttling is NOT signaled over HTTP: the body comes back with
//! `"code": 4029` and status 200. The client returns the body as-is and the
//! security fetcher decides what the code means.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::rpc::{build_client, check_status};
use super::source::SecuritySource;
use crate::models::errors::AppResult;
use crate::models::types::SecurityResponse;

/// GoPlus token_security client for one chain
#[derive(Clone)]
pub struct GoPlusClient {
    client: reqwest::Client,
    /// Full endpoint, chain id included
    url: String,
}

impl GoPlusClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SecuritySource for GoPlusClient {
    async fn token_security(&self, contract_addresses: &[String]) -> AppResult<SecurityResponse> {
        let joined = contract_addresses.join(",");
        debug!("🛡️ GoPlus: querying {}", joined);

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "*/*")
            .query(&[("contract_addresses", joined.as_str())])
            .send()
            .await?;

        check_status(response.status())?;

        let body = response.bytes().await?;
        parse_security_body(&body)
    }
}

/// Decode a token_security body. The status code is left for the caller.
pub fn parse_security_body(body: &[u8]) -> AppResult<SecurityResponse> {
    Ok(serde_json::from_slice::<SecurityResponse>(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_body_parses() {
        let json = r#"{"code": 4029, "message": "too many requests", "result": {}}"#;
        let response: SecurityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.code, 4029);
        assert!(response.result.is_empty());
    }

    #[test]
    fn test_rate_limited_body_with_null_result_parses() {
        let body = br#"{"code": 4029, "message": "too many requests", "result": null}"#;
        let response = parse_security_body(body).unwrap();
        assert_eq!(response.code, 4029);
        assert!(response.result.is_empty());
    }

    #[test]
    fn test_body_without_result_parses() {
        let json = r#"{"code": 2, "message": "partial"}"#;
        let response: SecurityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.code, 2);
        assert!(response.result.is_empty());
    }

    #[test]
    fn test_client_keeps_url() {
        let client = GoPlusClient::new(
            "https://api.gopluslabs.io/api/v1/token_security/1",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(client.url().ends_with("/token_security/1"));
    }
}
