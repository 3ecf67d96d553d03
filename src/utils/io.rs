//! File adapters
//!
//! Sequential I/O around the pipeline: address lists in, transfer log /
//! JSON dump / CSV export out.

use alloy_primitives::Address;
use eyre::{Result, WrapErr};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::models::types::{ExportRow, KnownTokens, SecurityMetadata, TransferRecord};
use crate::utils::constants::{export_csv_name, metadata_json_name, transfer_log_name};

/// Read a wallet list: one address per line, blank lines and `#` comments
/// skipped, malformed addresses dropped with a warning, duplicates removed.
pub fn read_wallets(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read wallet list {}", path.display()))?;

    let mut wallets: Vec<String> = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if Address::from_str(line).is_err() {
            warn!("⚠️ {}:{}: not an address, skipped: {}", path.display(), line_no + 1, line);
            continue;
        }
        if !wallets.iter().any(|w| w.eq_ignore_ascii_case(line)) {
            wallets.push(line.to_string());
        }
    }

    info!("👛 Loaded {} wallet addresses from {}", wallets.len(), path.display());
    Ok(wallets)
}

/// Load the known-token registry. A missing file means nothing is known yet.
pub fn read_known_tokens(path: &Path) -> Result<KnownTokens> {
    if !path.exists() {
        warn!("⚠️ Known-token file {} not found, treating every token as new", path.display());
        return Ok(KnownTokens::default());
    }

    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read known tokens {}", path.display()))?;
    let known: KnownTokens = content.lines().collect();

    info!("📚 Loaded {} known tokens from {}", known.len(), path.display());
    Ok(known)
}

/// Dated output files of one run
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub transfer_log: PathBuf,
    pub metadata_json: PathBuf,
    pub export_csv: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: &Path, date: &str) -> Self {
        Self {
            transfer_log: out_dir.join(transfer_log_name(date)),
            metadata_json: out_dir.join(metadata_json_name(date)),
            export_csv: out_dir.join(export_csv_name(date)),
        }
    }
}

/// Append transfer records, one `wallet - token - asset` line each
pub fn append_transfer_log(path: &Path, records: &[TransferRecord]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Failed to open transfer log {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{}", record.log_line())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the security metadata map as pretty JSON
pub fn write_metadata_json(path: &Path, metadata: &SecurityMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the ranked export as CSV (`address,token_name,token_symbol,liquidity`)
pub fn write_export_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;

    if rows.is_empty() {
        writer.write_record(["address", "token_name", "token_symbol", "liquidity"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
