//! Transfer Scanner
//!
//! Walks `alchemy_getAssetTransfers` pages for each tracked wallet and turns
//! every incoming ERC-20 transfer into a [`TransferRecord`].
//!
//! - Pages of one wallet are strictly sequential (cursor chaining)
//! - Each page has its own retry budget
//! - A failed page ends that wallet's walk only; the run goes on
//! - Wallet order is shuffled per run to spread provider load

use futures_util::stream::{self, Stream, StreamExt};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::retry::{BackoffRetrier, RetryPolicy};
use crate::models::errors::AppResult;
use crate::models::types::{
    normalize_address, FailedUnit, ScanWindow, TokenAddressSet, TransferRecord, UnitFailure,
};
use crate::providers::alchemy::{AssetTransfer, AssetTransfersParams};
use crate::providers::source::ChainDataSource;
use crate::utils::constants::UNKNOWN_ASSET;

/// Everything the scan phase produced
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Transfer log in scan order, duplicates kept
    pub records: Vec<TransferRecord>,
    /// Unique token addresses across all wallets
    pub tokens: TokenAddressSet,
    pub wallets_scanned: usize,
    /// Wallets whose pagination stopped early
    pub failures: Vec<UnitFailure>,
}

/// Receives each wallet's records as soon as that wallet is done
pub type TransferSink<'a> = dyn FnMut(&[TransferRecord]) + Send + 'a;

/// Paginating scanner over a [`ChainDataSource`]
pub struct TransferScanner {
    source: Arc<dyn ChainDataSource>,
    retrier: BackoffRetrier,
}

impl TransferScanner {
    pub fn new(source: Arc<dyn ChainDataSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            retrier: BackoffRetrier::new(policy),
        }
    }

    /// Lazily walk every page of incoming transfers for `wallet`.
    ///
    /// Yields one `Ok` per transfer. If a page cannot be fetched the stream
    /// yields that error once and ends.
    pub fn scan<'a>(
        &'a self,
        wallet: &'a str,
        window: &ScanWindow,
    ) -> impl Stream<Item = AppResult<TransferRecord>> + 'a {
        let first = AssetTransfersParams::incoming_erc20(wallet, window);

        stream::unfold(Some((first, 1u32)), move |state| async move {
            let (params, page) = state?;
            let label = format!("transfers page {} for {}", page, wallet);

            let source = &self.source;
            let request = &params;
            let result = self
                .retrier
                .execute(&label, move |_| source.asset_transfers(request))
                .await;

            match result {
                Ok(response) => {
                    debug!(
                        "📄 {}: {} transfers, more: {}",
                        label,
                        response.transfers.len(),
                        response.next_page_key().is_some()
                    );

                    let next = response.next_page_key().map(|key| {
                        (params.clone().with_page_key(Some(key.to_string())), page + 1)
                    });
                    let records: Vec<AppResult<TransferRecord>> = response
                        .transfers
                        .iter()
                        .filter_map(|transfer| to_record(wallet, transfer))
                        .map(Ok)
                        .collect();

                    Some((stream::iter(records), next))
                }
                Err(e) => Some((stream::iter(vec![Err(e)]), None)),
            }
        })
        .flatten()
    }

    /// Scan all wallets in a random order
    pub async fn scan_all(
        &self,
        wallets: &[String],
        window: &ScanWindow,
        sink: &mut TransferSink<'_>,
    ) -> ScanOutcome {
        let mut order: Vec<String> = wallets.to_vec();
        order.shuffle(&mut rand::thread_rng());
        self.scan_in_order(&order, window, sink).await
    }

    /// Scan wallets one after another in the given order
    pub async fn scan_in_order(
        &self,
        wallets: &[String],
        window: &ScanWindow,
        sink: &mut TransferSink<'_>,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        info!("🔍 Scanning {} wallets", wallets.len());

        for wallet in wallets {
            info!("👛 Processing wallet: {}", wallet);
            let mut seen = 0usize;
            let first = outcome.records.len();

            let transfers = self.scan(wallet, window);
            futures_util::pin_mut!(transfers);

            while let Some(item) = transfers.next().await {
                match item {
                    Ok(record) => {
                        outcome.tokens.insert(&record.token_address);
                        outcome.records.push(record);
                        seen += 1;
                    }
                    Err(e) => {
                        warn!("⚠️ Stopped scanning {} after {} transfers: {}", wallet, seen, e);
                        outcome
                            .failures
                            .push(UnitFailure::new(FailedUnit::Wallet(wallet.clone()), &e));
                    }
                }
            }

            sink(&outcome.records[first..]);
            outcome.wallets_scanned += 1;
            info!("✅ Completed wallet {} ({} transfers)", wallet, seen);
        }

        info!(
            "📊 Scan finished: {} transfers, {} unique tokens, {} wallets with errors",
            outcome.records.len(),
            outcome.tokens.len(),
            outcome.failures.len()
        );

        outcome
    }
}

/// Transfer entry → record; entries without a contract address are skipped
fn to_record(wallet: &str, transfer: &AssetTransfer) -> Option<TransferRecord> {
    let Some(token) = transfer.token_address() else {
        warn!(
            "⚠️ Skipping transfer to {} without contract address (tx: {})",
            wallet,
            transfer.hash.as_deref().unwrap_or("?")
        );
        return None;
    };

    Some(TransferRecord {
        wallet: wallet.to_string(),
        token_address: normalize_address(token),
        asset: transfer
            .asset
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ASSET.to_string()),
    })
}
