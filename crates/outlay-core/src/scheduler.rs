//! Background refresh scheduler
//!
//! Periodically re-runs the insight, anomaly, and forecast pipeline so
//! foreground queries find a warm cache. The interval comes from
//! [`AnalyticsConfig::refresh_interval`](crate::config::AnalyticsConfig):
//!
//! - `refresh_interval_secs` in the config file (default 1800)
//! - `OUTLAY_REFRESH_MINUTES` overrides it; 0 disables the scheduler
//!
//! A pass never overlaps with another: a tick that fires while the previous
//! pass is still running is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::service::AnalyticsService;

const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Handle to a running refresh loop
///
/// Dropping the scheduler stops the loop. A pass already in progress is
/// left to finish.
pub struct BackgroundScheduler {
    service: Arc<AnalyticsService>,
    in_flight: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl BackgroundScheduler {
    /// Start refreshing `service` every `every`
    ///
    /// The first pass runs one full interval after start. A zero interval
    /// starts no timer; passes then only run through [`trigger`](Self::trigger).
    /// Intervals above one year are clamped to a year.
    pub fn start(service: Arc<AnalyticsService>, every: Duration) -> Self {
        let in_flight = Arc::new(AtomicBool::new(false));

        if every.is_zero() {
            warn!("Refresh interval is zero, timer not started");
            return Self {
                service,
                in_flight,
                timer: None,
            };
        }

        let every = every.min(MAX_INTERVAL);
        info!(interval_secs = every.as_secs(), "Starting analytics refresh scheduler");

        let timer = {
            let service = service.clone();
            let in_flight = in_flight.clone();
            tokio::spawn(async move {
                let mut ticker = interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                // Skip the first immediate tick - the cache fills on demand at startup
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    if spawn_pass(&service, &in_flight).is_none() {
                        debug!("Previous refresh still running, skipping tick");
                    }
                }
            })
        };

        Self {
            service,
            in_flight,
            timer: Some(timer),
        }
    }

    /// Start with the configured interval, or None when refresh is disabled
    pub fn from_config(service: Arc<AnalyticsService>) -> Option<Self> {
        match service.config().refresh_interval {
            Some(every) if !every.is_zero() => Some(Self::start(service, every)),
            _ => {
                warn!("Background refresh disabled");
                None
            }
        }
    }

    /// Run a pass now unless one is already running
    ///
    /// Returns the spawned pass, or None when it was skipped.
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        spawn_pass(&self.service, &self.in_flight)
    }

    /// Whether the periodic timer is active
    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop the timer loop
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("Analytics refresh scheduler stopped");
        }
    }
}

impl Drop for BackgroundScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Clears the in-flight flag when the pass ends, even if it panics
struct PassGuard(Arc<AtomicBool>);

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn spawn_pass(
    service: &Arc<AnalyticsService>,
    in_flight: &Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    if in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return None;
    }

    let guard = PassGuard(in_flight.clone());
    let service = service.clone();
    Some(tokio::spawn(async move {
        let _guard = guard;
        info!("Running scheduled analytics refresh...");
        let summary = service.refresh().await;
        debug!(completed_at = %summary.completed_at, "Scheduled refresh finished");
    }))
}
