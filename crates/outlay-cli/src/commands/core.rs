//! Session setup and shared helpers

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use outlay_core::{AnalyticsConfig, AnalyticsService, MemorySource, Period, PeriodComparison, Snapshot};
use serde::Serialize;

/// Everything a report command needs
pub struct Session {
    pub source: Arc<MemorySource>,
    pub service: Arc<AnalyticsService>,
    pub json: bool,
}

impl Session {
    /// Print `value` as JSON when requested, otherwise run `render`
    pub fn output<T: Serialize>(&self, value: &T, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }
}

/// Read a snapshot file
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read snapshot {}. Create it or pass --data",
            path.display()
        )
    })?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid snapshot file: {}", path.display()))
}

/// Write a snapshot file, replacing the old one only after a complete write
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Load config and snapshot and build the analytics service
pub fn open_session(
    data: &Path,
    config: Option<&Path>,
    as_of: Option<NaiveDate>,
    json: bool,
) -> Result<Session> {
    let config = AnalyticsConfig::load(config).context("Failed to load analytics config")?;
    let snapshot = load_snapshot(data)?;

    tracing::debug!(
        subscriptions = snapshot.subscriptions.len(),
        budgets = snapshot.budgets.len(),
        "Loaded snapshot"
    );

    let source = Arc::new(MemorySource::new(snapshot));
    let mut service = AnalyticsService::new(source.clone(), config);
    if let Some(date) = as_of {
        service = service.with_reference_date(date);
    }

    Ok(Session {
        source,
        service: Arc::new(service),
        json,
    })
}

pub fn parse_period(s: &str) -> Result<Period> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn parse_window(s: &str) -> Result<PeriodComparison> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// "+12.5%" / "-3.0%"
pub fn format_change(pct: f64) -> String {
    format!("{:+.1}%", pct)
}
