//! Constants Module - Single Source of Truth
//!
//! Every endpoint, policy number and file name used by the hunter is defined
//! here. Other modules import from this file instead of hardcoding values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "TokenHunter";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = concat!("TokenHunter/", env!("CARGO_PKG_VERSION"));

// ============================================
// HTTP / RETRY CONSTANTS
// ============================================

/// Default timeout for a single HTTP request (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Attempts for block-height and transfer-page requests
pub const CHAIN_MAX_ATTEMPTS: u32 = 5;

/// First backoff delay for chain requests (milliseconds), doubled per retry
pub const CHAIN_INITIAL_RETRY_MS: u64 = 1000;

/// Backoff ceiling (milliseconds)
pub const MAX_RETRY_DELAY_MS: u64 = 64_000;

/// Attempts per security query, rate-limit retries included
pub const SECURITY_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause after a rate-limited security query (milliseconds)
pub const SECURITY_RATE_LIMIT_PAUSE_MS: u64 = 1000;

/// Default bound on in-flight security queries
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 10;

// ============================================
// SCAN CONSTANTS
// ============================================

/// Number of blocks behind the chain head that a scan covers
pub const DEFAULT_WINDOW_SIZE: u64 = 8000;

/// Transfers requested per page (0x3e8, the provider maximum)
pub const TRANSFERS_PAGE_SIZE: u32 = 1000;

/// Asset label used when the provider omits the symbol
pub const UNKNOWN_ASSET: &str = "Unknown";

// ============================================
// GOPLUS CONSTANTS
// ============================================

/// Default GoPlus token security endpoint (chain id is appended)
pub const GOPLUS_BASE_URL: &str = "https://api.gopluslabs.io/api/v1/token_security";

/// GoPlus status code for a successful query
pub const GOPLUS_CODE_OK: i64 = 1;

/// GoPlus status code signaling throttling (sent with HTTP 200)
pub const GOPLUS_CODE_RATE_LIMITED: i64 = 4029;

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// BNB Smart Chain
pub const CHAIN_ID_BSC: u64 = 56;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Optimism
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Avalanche C-Chain
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;

/// EVM chains served by both Alchemy and GoPlus
pub const SUPPORTED_CHAIN_IDS: [u64; 7] = [
    CHAIN_ID_ETHEREUM,
    CHAIN_ID_BSC,
    CHAIN_ID_POLYGON,
    CHAIN_ID_ARBITRUM,
    CHAIN_ID_OPTIMISM,
    CHAIN_ID_AVALANCHE,
    CHAIN_ID_BASE,
];

/// Get Alchemy subdomain for chain
pub fn get_alchemy_subdomain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("eth-mainnet"),
        CHAIN_ID_BSC => Some("bnb-mainnet"),
        CHAIN_ID_POLYGON => Some("polygon-mainnet"),
        CHAIN_ID_ARBITRUM => Some("arb-mainnet"),
        CHAIN_ID_OPTIMISM => Some("opt-mainnet"),
        CHAIN_ID_AVALANCHE => Some("avax-mainnet"),
        CHAIN_ID_BASE => Some("base-mainnet"),
        _ => None,
    }
}

/// Build Alchemy URL for a chain
pub fn build_alchemy_url(chain_id: u64, api_key: &str) -> Option<String> {
    get_alchemy_subdomain(chain_id)
        .map(|subdomain| format!("https://{}.g.alchemy.com/v2/{}", subdomain, api_key))
}

/// Get chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_AVALANCHE => "Avalanche C-Chain",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

// ============================================
// OUTPUT FILES
// ============================================

/// Default wallet list
pub const DEFAULT_WALLETS_FILE: &str = "wallet.txt";

/// Default known-token registry
pub const DEFAULT_KNOWN_TOKENS_FILE: &str = "tokens.txt";

/// Date format used in output file names
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Transfer log: `found-tokens_<date>.txt`
pub fn transfer_log_name(date: &str) -> String {
    format!("found-tokens_{}.txt", date)
}

/// Security metadata dump: `prime_token_data_<date>.json`
pub fn metadata_json_name(date: &str) -> String {
    format!("prime_token_data_{}.json", date)
}

/// Ranked export: `extracted_token_data_<date>.csv`
pub fn export_csv_name(date: &str) -> String {
    format!("extracted_token_data_{}.csv", date)
}
