//! Alchemy Enhanced APIs Module
//!
//! Transfers API (`alchemy_getAssetTransfers`, 120 CU) and the head block
//! (`eth_blockNumber`, 10 CU) used to build the scan window.
//!
//! Reference: https://alchemy.com/docs/reference/transfers-api-quickstart.mdx

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::rpc::RpcProvider;
use super::source::ChainDataSource;
use crate::models::errors::AppResult;
use crate::models::types::ScanWindow;
use crate::utils::constants::TRANSFERS_PAGE_SIZE;

// ============================================
// TRANSFERS API TYPES
// ============================================

/// Transfer category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferCategory {
    Erc20,
}

/// Parameters of one `alchemy_getAssetTransfers` page request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersParams {
    pub from_block: String,
    pub to_block: String,
    pub category: Vec<TransferCategory>,
    pub to_address: String,
    pub exclude_zero_value: bool,
    pub max_count: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

impl AssetTransfersParams {
    /// First page of incoming ERC-20 transfers for `wallet` inside `window`
    pub fn incoming_erc20(wallet: &str, window: &ScanWindow) -> Self {
        Self {
            from_block: window.from_block_hex(),
            to_block: window.to_block().to_string(),
            category: vec![TransferCategory::Erc20],
            to_address: wallet.to_string(),
            exclude_zero_value: true,
            max_count: format!("{:#x}", TRANSFERS_PAGE_SIZE),
            page_key: None,
        }
    }

    /// Same query continued at `page_key`
    pub fn with_page_key(mut self, page_key: Option<String>) -> Self {
        self.page_key = page_key;
        self
    }
}

/// Asset transfer entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    #[serde(default)]
    pub block_num: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub raw_contract: Option<RawContract>,
}

impl AssetTransfer {
    /// Contract address of the transferred token, if the provider sent one
    pub fn token_address(&self) -> Option<&str> {
        self.raw_contract
            .as_ref()
            .and_then(|c| c.address.as_deref())
            .filter(|a| !a.is_empty())
    }
}

/// Raw contract info in transfer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub decimal: Option<String>,
}

/// Response from alchemy_getAssetTransfers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersPage {
    #[serde(default)]
    pub transfers: Vec<AssetTransfer>,
    #[serde(default)]
    pub page_key: Option<String>,
}

impl AssetTransfersPage {
    /// Cursor for the next page; an empty key ends pagination too
    pub fn next_page_key(&self) -> Option<&str> {
        self.page_key.as_deref().filter(|k| !k.is_empty())
    }
}

// ============================================
// ALCHEMY API CLIENT
// ============================================

/// Alchemy Enhanced API Client
pub struct AlchemyClient {
    provider: RpcProvider,
}

impl AlchemyClient {
    /// Create new Alchemy client for a full endpoint URL
    pub fn new(url: &str, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            provider: RpcProvider::new(url, timeout)?,
        })
    }

    /// Get underlying RPC provider
    pub fn provider(&self) -> &RpcProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainDataSource for AlchemyClient {
    async fn block_number(&self) -> AppResult<String> {
        self.provider
            .call::<String>("eth_blockNumber", serde_json::json!([]))
            .await
    }

    async fn asset_transfers(&self, params: &AssetTransfersParams) -> AppResult<AssetTransfersPage> {
        debug!(
            "📜 Transfers for {} from {} (page key: {})",
            params.to_address,
            params.from_block,
            params.page_key.as_deref().unwrap_or("-")
        );

        self.provider
            .call::<AssetTransfersPage>("alchemy_getAssetTransfers", serde_json::json!([params]))
            .await
    }
}
