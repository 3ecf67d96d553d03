//! Token Hunter - run orchestrator
//!
//! head block → scan window → transfer scan (sequential, shuffled wallets)
//! → security fan-out (bounded, join barrier) → liquidity ranking.
//!
//! Only the head-block step is fatal. Wallet and token failures are
//! collected in the report and the run carries on with partial results.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::block_height::BlockHeightResolver;
use super::ranker;
use super::scanner::{TransferScanner, TransferSink};
use super::security::TokenSecurityFetcher;
use crate::models::config::HunterConfig;
use crate::models::errors::AppResult;
use crate::models::types::{
    ExportRow, HuntStats, KnownTokens, ScanWindow, SecurityMetadata, TokenAddressSet,
    TransferRecord, UnitFailure,
};
use crate::providers::alchemy::AlchemyClient;
use crate::providers::goplus::GoPlusClient;
use crate::providers::source::{ChainDataSource, SecuritySource};

/// Everything a finished run hands to the exporters
#[derive(Debug)]
pub struct HuntReport {
    pub window: ScanWindow,
    /// Transfer log in scan order
    pub transfers: Vec<TransferRecord>,
    /// All token addresses seen, known ones included
    pub discovered: TokenAddressSet,
    /// Ranked security metadata of newly discovered tokens
    pub metadata: SecurityMetadata,
    /// Best pool per token, tokens by liquidity
    pub rows: Vec<ExportRow>,
    /// Wallets and tokens that could not be processed
    pub failures: Vec<UnitFailure>,
    pub stats: HuntStats,
}

/// Main pipeline struct
pub struct TokenHunter {
    resolver: BlockHeightResolver,
    scanner: TransferScanner,
    fetcher: TokenSecurityFetcher,
    window_size: u64,
    shuffle_wallets: bool,
}

impl TokenHunter {
    /// Wire the pipeline to arbitrary data sources
    pub fn new(
        config: &HunterConfig,
        chain: Arc<dyn ChainDataSource>,
        security: Arc<dyn SecuritySource>,
    ) -> Self {
        Self {
            resolver: BlockHeightResolver::new(chain.clone(), config.chain_retry.clone()),
            scanner: TransferScanner::new(chain, config.chain_retry.clone()),
            fetcher: TokenSecurityFetcher::new(
                security,
                config.security_retry.clone(),
                config.max_concurrent_queries,
            ),
            window_size: config.window_size,
            shuffle_wallets: true,
        }
    }

    /// Pipeline backed by the live Alchemy and GoPlus clients
    pub fn from_config(config: &HunterConfig) -> AppResult<Self> {
        let chain = Arc::new(AlchemyClient::new(&config.alchemy_url, config.http_timeout)?);
        info!("📡 Alchemy endpoint: {}", chain.provider().masked_url());
        let security = Arc::new(GoPlusClient::new(config.security_url(), config.http_timeout)?);
        Ok(Self::new(config, chain, security))
    }

    /// Scan wallets in the given order instead of shuffling
    pub fn with_fixed_wallet_order(mut self) -> Self {
        self.shuffle_wallets = false;
        self
    }

    /// Run the whole pipeline once
    pub async fn run(&self, wallets: &[String], known: &KnownTokens) -> AppResult<HuntReport> {
        self.run_with_sink(wallets, known, &mut |_: &[TransferRecord]| {})
            .await
    }

    /// Run the pipeline, handing each wallet's transfers to `sink` as soon
    /// as that wallet has been scanned
    pub async fn run_with_sink(
        &self,
        wallets: &[String],
        known: &KnownTokens,
        sink: &mut TransferSink<'_>,
    ) -> AppResult<HuntReport> {
        let start = Instant::now();
        info!(
            "🚀 Starting hunt: {} wallets, {} known tokens",
            wallets.len(),
            known.len()
        );

        let window = match self.resolver.scan_window(self.window_size).await {
            Ok(window) => window,
            Err(e) => {
                error!("❌ Unable to get current block number: {}", e);
                return Err(e);
            }
        };

        let scan = if self.shuffle_wallets {
            self.scanner.scan_all(wallets, &window, sink).await
        } else {
            self.scanner.scan_in_order(wallets, &window, sink).await
        };

        let security = self.fetcher.fetch_all(&scan.tokens, known).await;

        let mut metadata = security.metadata;
        let rows = ranker::ranked_export(&mut metadata);

        let stats = HuntStats {
            wallets_scanned: scan.wallets_scanned,
            wallets_failed: scan.failures.len(),
            transfers_seen: scan.records.len(),
            tokens_discovered: scan.tokens.len(),
            tokens_known: security.skipped_known,
            tokens_queried: security.queried.len(),
            tokens_enriched: metadata.len(),
            tokens_failed: security.failures.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        let mut failures = scan.failures;
        failures.extend(security.failures);

        info!("🏁 {}", stats.summary());

        Ok(HuntReport {
            window,
            transfers: scan.records,
            discovered: scan.tokens,
            metadata,
            rows,
            failures,
            stats,
        })
    }
}
