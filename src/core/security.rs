//! Token Security Fetcher
//!
//! Enriches newly discovered tokens with GoPlus security metadata.
//!
//! - Known tokens are filtered out before any query is made
//! - One task per token, in-flight queries bounded by a semaphore
//! - Each query retries up to its policy budget; a `4029` body pauses for a
//!   fixed interval and retries in place, using the same budget
//! - Results land in a shared `DashMap`; the phase ends only once every
//!   task has finished (join barrier)
//! - A token that cannot be fetched is reported and left out of the map

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::retry::{BackoffRetrier, RetryPolicy};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    FailedUnit, KnownTokens, SecurityMetadata, SecurityResponse, TokenAddressSet, UnitFailure,
};
use crate::providers::source::SecuritySource;
use crate::utils::constants::{GOPLUS_CODE_OK, GOPLUS_CODE_RATE_LIMITED};

/// Result of the enrichment phase
#[derive(Debug, Default)]
pub struct SecurityReport {
    /// Token address → raw security response (unranked)
    pub metadata: SecurityMetadata,
    /// Addresses that were actually queried
    pub queried: Vec<String>,
    /// Tokens skipped because a previous run already reported them
    pub skipped_known: usize,
    /// Tokens whose query failed
    pub failures: Vec<UnitFailure>,
}

/// Concurrent security-metadata fetcher
pub struct TokenSecurityFetcher {
    source: Arc<dyn SecuritySource>,
    policy: RetryPolicy,
    max_concurrent: usize,
}

impl TokenSecurityFetcher {
    pub fn new(source: Arc<dyn SecuritySource>, policy: RetryPolicy, max_concurrent: usize) -> Self {
        Self {
            source,
            policy,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Tokens that still need a query: discovered minus known
    pub fn query_set(tokens: &TokenAddressSet, known: &KnownTokens) -> Vec<String> {
        tokens.unknown(known)
    }

    /// Query every unknown token and wait for all of them
    pub async fn fetch_all(&self, tokens: &TokenAddressSet, known: &KnownTokens) -> SecurityReport {
        let start = Instant::now();
        let queried = Self::query_set(tokens, known);
        let skipped_known = tokens.len() - queried.len();

        info!(
            "🛡️ Fetching security data for {} tokens ({} already known, concurrency {})",
            queried.len(),
            skipped_known,
            self.max_concurrent
        );

        let results: Arc<DashMap<String, SecurityResponse>> = Arc::new(DashMap::new());
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(queried.len());

        for token in &queried {
            let sem = semaphore.clone();
            let source = self.source.clone();
            let retrier = BackoffRetrier::new(self.policy.clone());
            let results = results.clone();
            let key = token.clone();

            let handle = tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::internal(format!("Semaphore closed: {}", e)))?;

                let response = query_token(&retrier, source.as_ref(), &key).await?;
                results.insert(key, response);
                Ok::<(), AppError>(())
            });
            handles.push((token.clone(), handle));
        }

        // Join barrier: every task reports before ranking starts
        let mut failures = Vec::new();
        for (token, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(AppError::internal(format!("Task join error: {}", e))),
            };
            if let Err(e) = outcome {
                warn!("⚠️ Security data unavailable for {}: {}", token, e);
                failures.push(UnitFailure::new(FailedUnit::Token(token), &e));
            }
        }

        let metadata: SecurityMetadata = match Arc::try_unwrap(results) {
            Ok(map) => map.into_iter().collect(),
            Err(shared) => shared
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        };

        info!(
            "📊 Security phase: {} enriched, {} failed in {}ms",
            metadata.len(),
            failures.len(),
            start.elapsed().as_millis()
        );

        SecurityReport {
            metadata,
            queried,
            skipped_known,
            failures,
        }
    }
}

/// One token, one retried query
async fn query_token(
    retrier: &BackoffRetrier,
    source: &dyn SecuritySource,
    token: &str,
) -> AppResult<SecurityResponse> {
    let addresses = vec![token.to_string()];
    let addresses = &addresses;
    let label = format!("security query for {}", token);

    let response = retrier
        .execute(&label, move |attempt| async move {
            debug!("🛡️ {} attempt {}", token, attempt);
            check_code(source.token_security(addresses).await?)
        })
        .await?;

    Ok(response)
}

/// Interpret the provider status code carried in the body
pub fn check_code(response: SecurityResponse) -> AppResult<SecurityResponse> {
    match response.code {
        GOPLUS_CODE_OK => Ok(response),
        GOPLUS_CODE_RATE_LIMITED => Err(AppError::rate_limited(format!(
            "GoPlus rate limit (code {})",
            GOPLUS_CODE_RATE_LIMITED
        ))),
        code => Err(AppError::bad_response(format!(
            "GoPlus returned code {}: {}",
            code,
            response.message.as_deref().unwrap_or("no message")
        ))),
    }
}
