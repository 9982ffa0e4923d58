//! Payment CSV import

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use outlay_core::{PaymentRecord, PaymentStatus, Snapshot};
use tracing::{debug, warn};

use super::{load_snapshot, save_snapshot};

const COLUMNS: [&str; 5] = ["subscription_id", "id", "date", "amount", "status"];

/// Outcome of merging one CSV file into a snapshot
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    pub duplicates: usize,
    pub unknown_subscription: usize,
}

/// Column positions resolved from the header row
struct Columns([usize; 5]);

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let mut positions = [0; 5];
        for (slot, name) in positions.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow::anyhow!("CSV is missing required column '{}'", name))?;
        }
        Ok(Self(positions))
    }

    fn get<'r>(&self, record: &'r StringRecord, index: usize) -> &'r str {
        record.get(self.0[index]).unwrap_or("").trim()
    }
}

fn parse_row(columns: &Columns, record: &StringRecord, line: usize) -> Result<(String, PaymentRecord)> {
    let subscription_id = columns.get(record, 0).to_string();
    let id = columns.get(record, 1).to_string();
    if subscription_id.is_empty() || id.is_empty() {
        anyhow::bail!("Row {}: subscription_id and id are required", line);
    }

    let date = NaiveDate::parse_from_str(columns.get(record, 2), "%Y-%m-%d")
        .with_context(|| format!("Row {}: invalid date", line))?;
    let amount: f64 = columns
        .get(record, 3)
        .parse()
        .with_context(|| format!("Row {}: invalid amount", line))?;
    let status: PaymentStatus = columns
        .get(record, 4)
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Row {}: {}", line, e))?;

    Ok((
        subscription_id,
        PaymentRecord {
            id,
            date,
            amount,
            status,
        },
    ))
}

/// Merge payment rows from `reader` into `snapshot`
///
/// Rows for unknown subscriptions are skipped, and a payment id already
/// present for the subscription is never imported twice.
pub fn import_payments<R: Read>(snapshot: &mut Snapshot, reader: R) -> Result<ImportStats> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;
    let mut stats = ImportStats::default();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let (subscription_id, payment) = parse_row(&columns, &record, index + 2)?;

        if !snapshot.subscriptions.iter().any(|s| s.id == subscription_id) {
            warn!(subscription_id = %subscription_id, "Skipping payment for unknown subscription");
            stats.unknown_subscription += 1;
            continue;
        }

        let payments = snapshot.payments.entry(subscription_id).or_default();
        if payments.iter().any(|p| p.id == payment.id) {
            debug!(payment_id = %payment.id, "Skipping duplicate payment");
            stats.duplicates += 1;
            continue;
        }
        payments.push(payment);
        stats.imported += 1;
    }

    for payments in snapshot.payments.values_mut() {
        payments.sort_by_key(|p| p.date);
    }

    Ok(stats)
}

pub fn cmd_import_payments(data: &Path, file: &Path) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    let mut snapshot = if data.exists() {
        load_snapshot(data)?
    } else {
        Snapshot::default()
    };

    println!("📥 Importing payments from {}...", file.display());

    let stats = import_payments(&mut snapshot, csv_file)?;
    save_snapshot(data, &snapshot)?;

    println!("✅ Import complete!");
    println!("   Imported: {}", stats.imported);
    println!("   Skipped (duplicates): {}", stats.duplicates);
    if stats.unknown_subscription > 0 {
        println!("   Skipped (unknown subscription): {}", stats.unknown_subscription);
    }

    Ok(())
}
