//! Token Hunter - find new tokens landing in tracked wallets
//!
//! One run: read wallet.txt / tokens.txt, scan the recent block window for
//! incoming ERC-20 transfers, enrich unseen tokens with GoPlus security data,
//! rank them by liquidity and write the dated outputs.
//!
//! Environment:
//!   ALCHEMY_API_KEY / ALCHEMY_HTTP_URL - Alchemy access (one is required)
//!   CHAIN_ID                           - default: 1
//!   RUST_LOG                           - log filter (default: info)

use clap::Parser;
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use token_hunter::utils::constants::{
    APP_NAME, APP_VERSION, DEFAULT_KNOWN_TOKENS_FILE, DEFAULT_WALLETS_FILE, OUTPUT_DATE_FORMAT,
};
use token_hunter::utils::io::{
    append_transfer_log, read_known_tokens, read_wallets, write_export_csv, write_metadata_json,
    OutputPaths,
};
use token_hunter::{HunterConfig, TokenHunter, TransferRecord};

#[derive(Parser, Debug)]
#[command(name = "token_hunter", version, about = "Discover and rank new tokens received by tracked wallets")]
struct Args {
    /// File with one wallet address per line
    #[arg(long, default_value = DEFAULT_WALLETS_FILE)]
    wallets: PathBuf,

    /// File with one already-known token address per line
    #[arg(long, default_value = DEFAULT_KNOWN_TOKENS_FILE)]
    known_tokens: PathBuf,

    /// Directory for the dated output files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Blocks behind head to scan (overrides HUNTER_WINDOW_SIZE)
    #[arg(long)]
    window_size: Option<u64>,

    /// Max in-flight security queries (overrides HUNTER_MAX_CONCURRENT_QUERIES)
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let args = Args::parse();
    info!("🔎 {} v{}", APP_NAME, APP_VERSION);

    let config = HunterConfig::from_env()?.with_overrides(args.window_size, args.concurrency)?;

    let wallets = read_wallets(&args.wallets)?;
    if wallets.is_empty() {
        warn!("⚠️ No wallets to scan in {}", args.wallets.display());
    }
    let known = read_known_tokens(&args.known_tokens)?;

    std::fs::create_dir_all(&args.out_dir)
        .wrap_err_with(|| format!("Failed to create {}", args.out_dir.display()))?;
    let date = chrono::Local::now().format(OUTPUT_DATE_FORMAT).to_string();
    let paths = OutputPaths::new(&args.out_dir, &date);

    // Transfer lines land in the log wallet by wallet, before enrichment
    let transfer_log = paths.transfer_log.clone();
    let mut log_transfers = |records: &[TransferRecord]| {
        if records.is_empty() {
            return;
        }
        if let Err(e) = append_transfer_log(&transfer_log, records) {
            warn!("⚠️ Could not append to {}: {:#}", transfer_log.display(), e);
        }
    };

    let hunter = TokenHunter::from_config(&config)?;
    let report = hunter
        .run_with_sink(&wallets, &known, &mut log_transfers)
        .await?;

    write_metadata_json(&paths.metadata_json, &report.metadata)?;
    write_export_csv(&paths.export_csv, &report.rows)?;

    info!("📝 Transfer log:  {}", paths.transfer_log.display());
    info!("📝 Security data: {}", paths.metadata_json.display());
    info!("📝 Ranked export: {} ({} tokens)", paths.export_csv.display(), report.rows.len());

    if !report.failures.is_empty() {
        warn!("⚠️ {} units failed during the run:", report.failures.len());
        for failure in &report.failures {
            warn!("   {:?} [{}] {}", failure.unit, failure.code, failure.message);
        }
    }

    if let Some(top) = report.rows.first() {
        info!(
            "🏆 Top token: {} ({}) liquidity {:.2}",
            top.token_symbol, top.token_address, top.liquidity_value
        );
    }

    Ok(())
}
