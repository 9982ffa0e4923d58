//! Background refresh loop

use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use outlay_core::{minutes_to_duration, AnalyticsEvent, BackgroundScheduler};
use tracing::{info, warn};

use super::{load_snapshot, Session};

/// How often the snapshot file is checked for changes
const POLL_INTERVAL: Duration = Duration::from_secs(2);

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

pub async fn cmd_watch(session: &Session, data: &Path, interval_minutes: Option<u64>) -> Result<()> {
    let every = match interval_minutes {
        Some(0) => anyhow::bail!("--interval-minutes must be greater than zero"),
        Some(minutes) => minutes_to_duration(minutes)
            .ok_or_else(|| anyhow::anyhow!("--interval-minutes {} is too large", minutes))?,
        None => match session.service.config().refresh_interval {
            Some(every) if !every.is_zero() => every,
            _ => anyhow::bail!(
                "Background refresh is disabled in the config. Pass --interval-minutes to enable it"
            ),
        },
    };

    let json = session.json;
    let listener = session.service.subscribe(move |event| match event {
        AnalyticsEvent::DataChanged => {
            if !json {
                println!("🔄 Data changed, cached views dropped");
            }
        }
        AnalyticsEvent::Refreshed(summary) => {
            if json {
                if let Ok(line) = serde_json::to_string(summary) {
                    println!("{}", line);
                }
            } else {
                println!(
                    "✅ Refreshed at {}: {} insights, {} anomalies, {} forecasts",
                    summary.completed_at.format("%H:%M:%S"),
                    summary.insights,
                    summary.anomalies,
                    summary.predictions
                );
            }
        }
    });

    let mut scheduler = BackgroundScheduler::start(session.service.clone(), every);
    scheduler.trigger();

    if !json {
        println!(
            "👀 Watching {} (refresh every {}s). Press Ctrl-C to stop.",
            data.display(),
            every.as_secs()
        );
    }

    let mut last_modified = modified_at(data).await;
    let mut poll = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
            _ = poll.tick() => {
                let modified = modified_at(data).await;
                if modified == last_modified {
                    continue;
                }
                last_modified = modified;

                match load_snapshot(data) {
                    Ok(snapshot) => {
                        session.source.replace(snapshot);
                        session.service.notify_data_changed();
                        scheduler.trigger();
                    }
                    Err(e) => warn!("Ignoring unreadable snapshot: {:#}", e),
                }
            }
        }
    }

    scheduler.shutdown();
    listener.unsubscribe();
    Ok(())
}
