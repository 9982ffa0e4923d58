//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use outlay_core::test_utils::{sample_snapshot, sample_today};
use outlay_core::{Period, PeriodComparison, Snapshot};
use tempfile::TempDir;

use crate::commands::{self, truncate, Session};

/// Write the sample snapshot into a temp dir, returning (dir, path)
fn write_sample() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("outlay.json");
    commands::save_snapshot(&path, &sample_snapshot()).unwrap();
    (dir, path)
}

fn session(path: &Path, json: bool) -> Session {
    commands::open_session(path, None, Some(sample_today()), json).unwrap()
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Spotify", 10), "Spotify");
    assert_eq!(truncate("Amazon Prime Video", 10), "Amazon ...");
    assert_eq!(truncate("Café Crème Brûlée", 8), "Café ...");
}

#[test]
fn test_format_change() {
    assert_eq!(commands::format_change(12.34), "+12.3%");
    assert_eq!(commands::format_change(-3.0), "-3.0%");
}

#[test]
fn test_parse_period() {
    assert_eq!(commands::parse_period("month").unwrap(), Period::Month);
    assert_eq!(commands::parse_period("all").unwrap(), Period::All);
    assert!(commands::parse_period("fortnight").is_err());
}

#[test]
fn test_parse_window() {
    assert_eq!(
        commands::parse_window("3m").unwrap(),
        PeriodComparison::ThreeMonths
    );
    assert!(commands::parse_window("2w").is_err());
}

// ========== Session Tests ==========

#[test]
fn test_open_session_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = commands::open_session(&dir.path().join("missing.json"), None, None, false);
    assert!(result.is_err());
}

#[test]
fn test_open_session_invalid_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("outlay.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = commands::open_session(&path, None, None, false)
        .err()
        .unwrap();
    assert!(err.to_string().contains("Invalid snapshot file"));
}

#[test]
fn test_save_snapshot_replaces_file() {
    let (_dir, path) = write_sample();
    commands::save_snapshot(&path, &Snapshot::default()).unwrap();

    let loaded = commands::load_snapshot(&path).unwrap();
    assert!(loaded.subscriptions.is_empty());
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_open_session_uses_as_of() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);
    assert_eq!(session.service.today(), sample_today());
}

// ========== Report Command Tests ==========

#[tokio::test]
async fn test_report_commands() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);

    commands::cmd_spending(&session, Period::Month, None).await.unwrap();
    commands::cmd_spending(&session, Period::Year, Some("Music")).await.unwrap();
    commands::cmd_monthly(&session, 6, true).await.unwrap();
    commands::cmd_categories(&session, Period::Quarter).await.unwrap();
    commands::cmd_subscription(&session, "netflix").await.unwrap();
    commands::cmd_compare(&session, PeriodComparison::OneMonth).await.unwrap();
    commands::cmd_yearly(&session).await.unwrap();
}

#[tokio::test]
async fn test_insight_commands() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);

    commands::cmd_insights(&session).await.unwrap();
    commands::cmd_predict(&session, None).await.unwrap();
    commands::cmd_predict(&session, Some(1)).await.unwrap();
    commands::cmd_anomalies(&session, None).await.unwrap();
    commands::cmd_budget(&session, Period::Month).await.unwrap();
}

#[tokio::test]
async fn test_commands_json_output() {
    let (_dir, path) = write_sample();
    let session = session(&path, true);

    commands::cmd_insights(&session).await.unwrap();
    commands::cmd_budget(&session, Period::Month).await.unwrap();
    commands::cmd_monthly(&session, 3, false).await.unwrap();
}

#[tokio::test]
async fn test_cmd_subscription_unknown() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);

    let result = commands::cmd_subscription(&session, "nope").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_compare_propagates_source_failure() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);
    session.source.fail_with("disk unplugged");

    assert!(commands::cmd_compare(&session, PeriodComparison::OneMonth)
        .await
        .is_err());
    // Everything else degrades to an empty report
    assert!(commands::cmd_insights(&session).await.is_ok());
}

#[tokio::test]
async fn test_cmd_watch_rejects_zero_interval() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);

    let result = commands::cmd_watch(&session, &path, Some(0)).await;
    assert!(result.is_err());
    assert_eq!(session.service.listener_count(), 0);
}

#[tokio::test]
async fn test_cmd_watch_rejects_overflowing_interval() {
    let (_dir, path) = write_sample();
    let session = session(&path, false);

    let err = commands::cmd_watch(&session, &path, Some(u64::MAX))
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("too large"));
    assert_eq!(session.service.listener_count(), 0);
}

// ========== Import Tests ==========

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_import_payments_merges_and_dedupes() {
    let mut snapshot = sample_snapshot();
    let csv = "\
subscription_id,id,date,amount,status
spotify,sp-2025-06,2025-06-12,10.99,completed
spotify,sp-2025-07,2025-07-12,11.99,completed
gym,gym-2025-04,2025-04-01,40.00,failed
unknown,x-1,2025-06-01,5.00,completed
";

    let stats = commands::import_payments(&mut snapshot, csv.as_bytes()).unwrap();
    assert_eq!(
        stats,
        commands::ImportStats {
            imported: 2,
            duplicates: 1,
            unknown_subscription: 1,
        }
    );

    let spotify = &snapshot.payments["spotify"];
    assert_eq!(spotify.len(), 13);
    assert_eq!(spotify.last().unwrap().date, date(2025, 7, 12));
    assert!(!snapshot.payments.contains_key("unknown"));
}

#[test]
fn test_import_payments_keeps_dates_sorted() {
    let mut snapshot = sample_snapshot();
    let csv = "\
subscription_id,id,date,amount,status
icloud,ic-early,2024-01-20,2.99,completed
";

    commands::import_payments(&mut snapshot, csv.as_bytes()).unwrap();
    let icloud = &snapshot.payments["icloud"];
    assert_eq!(icloud.first().unwrap().id, "ic-early");
    assert!(icloud.windows(2).all(|w| w[0].date <= w[1].date));
}

#[test]
fn test_import_payments_column_order_and_case() {
    let mut snapshot = sample_snapshot();
    let csv = "\
Status,Amount,Date,ID,Subscription_ID
paid,2.99,2025-07-20,ic-2025-07,icloud
";

    let stats = commands::import_payments(&mut snapshot, csv.as_bytes()).unwrap();
    assert_eq!(stats.imported, 1);
}

#[test]
fn test_import_payments_missing_column() {
    let mut snapshot = sample_snapshot();
    let csv = "subscription_id,id,date,amount\nspotify,x,2025-06-01,1.00\n";

    let err = commands::import_payments(&mut snapshot, csv.as_bytes())
        .err()
        .unwrap();
    assert!(err.to_string().contains("status"));
}

#[test]
fn test_import_payments_bad_row() {
    let mut snapshot = sample_snapshot();
    let csv = "\
subscription_id,id,date,amount,status
spotify,x,06/01/2025,1.00,completed
";

    let err = commands::import_payments(&mut snapshot, csv.as_bytes())
        .err()
        .unwrap();
    assert!(err.to_string().contains("Row 2"));
}

#[test]
fn test_cmd_import_payments_creates_snapshot() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("outlay.json");
    let file = dir.path().join("payments.csv");
    std::fs::write(
        &file,
        "subscription_id,id,date,amount,status\nspotify,sp-1,2025-06-12,10.99,completed\n",
    )
    .unwrap();

    // No subscriptions yet, so the row is skipped but the file is written
    commands::cmd_import_payments(&data, &file).unwrap();
    let snapshot = commands::load_snapshot(&data).unwrap();
    assert!(snapshot.payments.is_empty());
}

#[test]
fn test_cmd_import_payments_into_sample() {
    let (_dir, data) = write_sample();
    let file = data.with_file_name("payments.csv");
    std::fs::write(
        &file,
        "subscription_id,id,date,amount,status\ngym,gym-2025-06,2025-06-01,40.00,completed\n",
    )
    .unwrap();

    commands::cmd_import_payments(&data, &file).unwrap();
    let snapshot = commands::load_snapshot(&data).unwrap();
    assert_eq!(snapshot.payments["gym"].len(), 10);
}
