//! Block Height Resolver
//!
//! Fetches the chain head and derives the scan window from it. Everything
//! downstream depends on this step, so its failure aborts the run.

use std::sync::Arc;
use tracing::info;

use super::retry::{BackoffRetrier, RetryPolicy};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::ScanWindow;
use crate::providers::source::ChainDataSource;

/// Resolves the current head block through a [`ChainDataSource`]
pub struct BlockHeightResolver {
    source: Arc<dyn ChainDataSource>,
    retrier: BackoffRetrier,
}

impl BlockHeightResolver {
    pub fn new(source: Arc<dyn ChainDataSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            retrier: BackoffRetrier::new(policy),
        }
    }

    /// Current head block number
    pub async fn resolve(&self) -> AppResult<u64> {
        let source = &self.source;
        let raw = self
            .retrier
            .execute("eth_blockNumber", move |_| source.block_number())
            .await?;
        parse_hex_block(&raw)
    }

    /// Scan window ending at the current head
    pub async fn scan_window(&self, window_size: u64) -> AppResult<ScanWindow> {
        let head = self.resolve().await?;
        let window = ScanWindow::ending_at(head, window_size);
        info!(
            "⛓️ Head block: {} | Scanning from block {} ({} blocks)",
            head, window.from_block, window_size
        );
        Ok(window)
    }
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_hex_block(raw: &str) -> AppResult<u64> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .or_else(|| raw.trim().strip_prefix("0X"))
        .ok_or_else(|| AppError::bad_response(format!("Block number is not hex: {:?}", raw)))?;

    u64::from_str_radix(digits, 16)
        .map_err(|e| AppError::bad_response(format!("Invalid block number {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use crate::providers::alchemy::{AssetTransfersPage, AssetTransfersParams};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails with connectivity errors `failures` times, then answers `reply`
    struct HeadSource {
        failures: u32,
        reply: fn() -> AppResult<String>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ChainDataSource for HeadSource {
        async fn block_number(&self) -> AppResult<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(AppError::connectivity("connection refused"));
            }
            (self.reply)()
        }

        async fn asset_transfers(&self, _: &AssetTransfersParams) -> AppResult<AssetTransfersPage> {
            unreachable!("not used by the resolver")
        }
    }

    fn resolver(source: Arc<HeadSource>, attempts: u32) -> BlockHeightResolver {
        BlockHeightResolver::new(source, RetryPolicy::new(attempts, Duration::from_millis(1)))
    }

    #[test]
    fn test_parse_hex_block() {
        assert_eq!(parse_hex_block("0x121cb80").unwrap(), 18_992_000);
        assert_eq!(parse_hex_block("0X10").unwrap(), 16);
        assert_eq!(parse_hex_block("1234").unwrap_err().code, ErrorCode::BadResponse);
        assert_eq!(parse_hex_block("0xzz").unwrap_err().code, ErrorCode::BadResponse);
    }

    #[tokio::test]
    async fn test_resolves_after_transient_failures() {
        let source = Arc::new(HeadSource {
            failures: 2,
            reply: || Ok("0x1312d00".to_string()),
            calls: AtomicU32::new(0),
        });

        let window = resolver(source.clone(), 5).scan_window(8000).await.unwrap();

        assert_eq!(window.head_block, 20_000_000);
        assert_eq!(window.from_block, 19_992_000);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_result_fails_without_retry() {
        let source = Arc::new(HeadSource {
            failures: 0,
            reply: || Err(AppError::missing_field("result")),
            calls: AtomicU32::new(0),
        });

        let err = resolver(source.clone(), 5).resolve().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_provider_exhausts_retries() {
        let source = Arc::new(HeadSource {
            failures: u32::MAX,
            reply: || Ok("0x1".to_string()),
            calls: AtomicU32::new(0),
        });

        let err = resolver(source.clone(), 5).resolve().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::MaxRetriesExceeded);
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }
}
