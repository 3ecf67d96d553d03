//! Token Hunter Library
//!
//! Discovers ERC-20 tokens recently received by a set of tracked wallets,
//! filters out tokens already known, enriches the new ones with GoPlus
//! security metadata and ranks them by DEX liquidity.
//!
//! Module layout:
//! - `core`: block height, transfer scanning, security fan-out, ranking, retry
//! - `models`: config, errors, domain types
//! - `providers`: Alchemy / GoPlus clients behind the data-source traits
//! - `utils`: constants and file adapters

pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{BackoffRetrier, HuntReport, RetryPolicy, TokenHunter, TransferSink};
pub use models::{AppError, AppResult, ErrorCode, HunterConfig};
pub use models::types::{
    ExportRow, HuntStats, KnownTokens, ScanWindow, SecurityMetadata, SecurityResponse,
    TokenAddressSet, TransferRecord, UnitFailure,
};
pub use providers::{ChainDataSource, SecuritySource};
