//! Type definitions for Token Hunter
//! All core data structures for transfer discovery and token enrichment

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use super::errors::{AppError, ErrorCode};

/// Normalize an address for use as a map/set key (trimmed, lowercase)
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

// ============================================
// SCAN WINDOW
// ============================================

/// Block range scanned for incoming transfers: `[from_block, latest]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanWindow {
    pub head_block: u64,
    pub from_block: u64,
}

impl ScanWindow {
    /// Window covering the last `window_size` blocks before `head_block`
    pub fn ending_at(head_block: u64, window_size: u64) -> Self {
        Self {
            head_block,
            from_block: head_block.saturating_sub(window_size),
        }
    }

    /// `fromBlock` as the provider expects it
    pub fn from_block_hex(&self) -> String {
        format!("{:#x}", self.from_block)
    }

    /// Upper bound is always the moving chain tip
    pub fn to_block(&self) -> &'static str {
        "latest"
    }
}

// ============================================
// TRANSFERS
// ============================================

/// One observed ERC-20 transfer into a tracked wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub wallet: String,
    pub token_address: String,
    pub asset: String,
}

impl TransferRecord {
    /// Line appended to the found-tokens log
    pub fn log_line(&self) -> String {
        format!("{} - {} - {}", self.wallet, self.token_address, self.asset)
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_line())
    }
}

/// Every token address seen during the run. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenAddressSet {
    inner: BTreeSet<String>,
}

impl TokenAddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the address was not already present
    pub fn insert(&mut self, address: &str) -> bool {
        self.inner.insert(normalize_address(address))
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.contains(&normalize_address(address))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.inner.iter()
    }

    /// Addresses not present in the known-token registry, in sorted order
    pub fn unknown(&self, known: &KnownTokens) -> Vec<String> {
        self.inner
            .iter()
            .filter(|addr| !known.contains(addr))
            .cloned()
            .collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TokenAddressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for addr in iter {
            set.insert(addr.as_ref());
        }
        set
    }
}

/// Tokens already reported by a previous run. Read-only for the run.
#[derive(Debug, Clone, Default)]
pub struct KnownTokens {
    inner: HashSet<String>,
}

impl KnownTokens {
    pub fn contains(&self, address: &str) -> bool {
        self.inner.contains(&normalize_address(address))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KnownTokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|a| normalize_address(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

// ============================================
// SECURITY METADATA (GoPlus token_security)
// ============================================

/// Raw response of one security query, kept whole for the JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityResponse {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Throttled and error bodies may send `null` here
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: BTreeMap<String, TokenSecurity>,
}

/// Per-token security report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSecurity {
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dex: Vec<DexLiquidityEntry>,
    /// Remaining provider fields (honeypot flags, taxes, holders, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single DEX pool listing for a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexLiquidityEntry {
    /// Decimal string as sent by the provider
    #[serde(default, deserialize_with = "string_or_number")]
    pub liquidity: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DexLiquidityEntry {
    /// Liquidity as a number; unparseable values rank as zero
    pub fn liquidity_value(&self) -> f64 {
        self.liquidity
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}

/// Token address → security response, for every token that was enriched
pub type SecurityMetadata = BTreeMap<String, SecurityResponse>;

// ============================================
// EXPORT
// ============================================

/// One CSV row of the ranked export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "address")]
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(rename = "liquidity")]
    pub liquidity_value: f64,
}

// ============================================
// RUN REPORT
// ============================================

/// Unit of work that can fail without aborting the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum FailedUnit {
    Wallet(String),
    Token(String),
}

/// A contained failure, kept for the end-of-run summary
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub unit: FailedUnit,
    pub code: &'static str,
    pub message: String,
}

impl UnitFailure {
    pub fn new(unit: FailedUnit, err: &AppError) -> Self {
        Self {
            unit,
            code: err.code_str(),
            message: err.message.clone(),
        }
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }
}

/// Run counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct HuntStats {
    pub wallets_scanned: usize,
    pub wallets_failed: usize,
    pub transfers_seen: usize,
    pub tokens_discovered: usize,
    pub tokens_known: usize,
    pub tokens_queried: usize,
    pub tokens_enriched: usize,
    pub tokens_failed: usize,
    pub elapsed_ms: u64,
}

impl HuntStats {
    pub fn summary(&self) -> String {
        format!(
            "Wallets: {} scanned ({} failed) | Transfers: {} | Tokens: {} discovered, {} known, {} queried, {} enriched, {} failed | {}ms",
            self.wallets_scanned,
            self.wallets_failed,
            self.transfers_seen,
            self.tokens_discovered,
            self.tokens_known,
            self.tokens_queried,
            self.tokens_enriched,
            self.tokens_failed,
            self.elapsed_ms
        )
    }
}
