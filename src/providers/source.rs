//! Data source traits
//!
//! The core pipeline talks to providers only through these traits so that a
//! run can be driven by the live HTTP clients or by in-memory fakes.

use async_trait::async_trait;

use super::alchemy::{AssetTransfersPage, AssetTransfersParams};
use crate::models::errors::AppResult;
use crate::models::types::SecurityResponse;

/// Blockchain data provider (head block + transfer history)
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Raw `eth_blockNumber` result (hex string)
    async fn block_number(&self) -> AppResult<String>;

    /// One page of `alchemy_getAssetTransfers`
    async fn asset_transfers(&self, params: &AssetTransfersParams) -> AppResult<AssetTransfersPage>;
}

/// Security-metadata provider
#[async_trait]
pub trait SecuritySource: Send + Sync {
    /// Query security reports for the given contracts. The provider status
    /// code is returned untouched; interpreting it is the caller's job.
    async fn token_security(&self, contract_addresses: &[String]) -> AppResult<SecurityResponse>;
}
