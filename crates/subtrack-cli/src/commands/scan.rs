//! Receipt scanning commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use subtrack_core::db::Database;
use subtrack_core::import::{import_receipts, ImportReceipt};
use subtrack_core::receipt::{parse_multiple_receipts, ParsedReceipt, SAMPLE_RECEIPTS};
use tracing::debug;

use super::truncate;

/// Read each file as one receipt and parse them together
///
/// Services seen in more than one file are reported once.
pub fn scan_files(files: &[PathBuf]) -> Result<Vec<ParsedReceipt>> {
    let texts = files
        .iter()
        .map(|path| read_receipt(path))
        .collect::<Result<Vec<_>>>()?;

    let receipts = parse_multiple_receipts(&texts);
    debug!(files = files.len(), found = receipts.len(), "Scanned receipt files");
    Ok(receipts)
}

fn read_receipt(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read receipt file: {}", path.display()))
}

pub fn cmd_scan(files: &[PathBuf], json: bool) -> Result<()> {
    let receipts = scan_files(files)?;
    print_receipts(&receipts, json)
}

/// Scan files and import what was found for `user_id`
pub fn cmd_scan_import(db: &Database, user_id: &str, files: &[PathBuf]) -> Result<()> {
    let receipts = scan_files(files)?;
    print_receipts(&receipts, false)?;

    if receipts.is_empty() {
        return Ok(());
    }

    let to_import: Vec<ImportReceipt> = receipts.iter().map(ImportReceipt::from).collect();
    let result = import_receipts(db, user_id, &to_import, Utc::now())?;

    println!();
    println!(
        "✅ Imported {} subscription(s), skipped {}",
        result.imported.len(),
        result.skipped.len()
    );
    for name in &result.skipped {
        println!("   ⏭️  {} (already tracked)", name);
    }

    Ok(())
}

pub fn cmd_samples(json: bool) -> Result<()> {
    let receipts = parse_multiple_receipts(&SAMPLE_RECEIPTS);
    print_receipts(&receipts, json)
}

fn print_receipts(receipts: &[ParsedReceipt], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(receipts)?);
        return Ok(());
    }

    if receipts.is_empty() {
        println!("No subscriptions found in the receipts.");
        return Ok(());
    }

    println!();
    println!("🧾 Detected Subscriptions");
    println!("   ─────────────────────────────────────────────────────────────");

    for receipt in receipts {
        println!(
            "   {:22} │ {:>9}/{:<7} │ {} │ {}",
            truncate(&receipt.service_name, 22),
            format!("${:.2}", receipt.amount),
            receipt.billing_cycle.as_str(),
            receipt.date,
            receipt.confidence.as_str()
        );
        println!("     {}", truncate(&receipt.email_subject, 60));
    }

    Ok(())
}
