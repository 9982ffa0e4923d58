//! Analytics configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for an override file (explicit path, else
//!    ~/.local/share/outlay/config/analytics.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied last:
//! - `OUTLAY_CACHE_TTL_SECS`: cache entry lifetime in seconds
//! - `OUTLAY_REFRESH_MINUTES`: background refresh interval (0 disables it)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::period::Period;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analytics.toml");

/// Anomaly detector settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyConfig {
    /// Below this many records detection is skipped
    pub min_records: usize,
    /// Sigma multiple at which a charge is flagged
    pub medium_sigma: f64,
    /// Sigma multiple at which severity escalates to high
    pub high_sigma: f64,
    /// Default lookback window
    pub lookback: Period,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_records: 10,
            medium_sigma: 2.0,
            high_sigma: 3.0,
            lookback: Period::Quarter,
        }
    }
}

/// Forecast engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Fewer monthly totals than this yields an empty forecast
    pub min_months: usize,
    /// Months projected when the caller does not say
    pub default_horizon: usize,
    /// Months of history fed to the regression
    pub history_months: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_months: 6,
            default_horizon: 3,
            history_months: 12,
        }
    }
}

/// Insight analyzer thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct InsightConfig {
    /// Days without a payment before a subscription is considered unused
    pub unused_days: i64,
    /// Minimum absolute yearly change (percent) for a trend insight
    pub trend_threshold_pct: f64,
    /// Typical discount for switching monthly billing to annual
    pub annual_discount: f64,
    /// Minimum yearly saving worth suggesting an annual switch
    pub annual_savings_floor: f64,
    /// Price increase threshold (percentage)
    pub price_increase_percent: f64,
    /// Price increase threshold (absolute dollars)
    pub price_increase_absolute: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            unused_days: 30,
            trend_threshold_pct: 20.0,
            annual_discount: 0.15,
            annual_savings_floor: 10.0,
            price_increase_percent: 5.0,
            price_increase_absolute: 1.0,
        }
    }
}

/// Complete analytics configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Lifetime of memoized query results
    pub cache_ttl: Duration,
    /// Background refresh interval; None disables the scheduler
    pub refresh_interval: Option<Duration>,
    pub anomaly: AnomalyConfig,
    pub forecast: ForecastConfig,
    pub insights: InsightConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            refresh_interval: Some(Duration::from_secs(30 * 60)),
            anomaly: AnomalyConfig::default(),
            forecast: ForecastConfig::default(),
            insights: InsightConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration (override first, then default), then apply env vars
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = load_config(override_path)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML content; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Apply `OUTLAY_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var("OUTLAY_CACHE_TTL_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.cache_ttl = Duration::from_secs(secs),
                Err(_) => warn!(value = %raw, "Ignoring invalid OUTLAY_CACHE_TTL_SECS"),
            }
        }

        if let Ok(raw) = std::env::var("OUTLAY_REFRESH_MINUTES") {
            self.apply_refresh_minutes(&raw);
        }
    }

    fn apply_refresh_minutes(&mut self, raw: &str) {
        match raw.trim().parse::<u64>() {
            Ok(0) => {
                warn!("OUTLAY_REFRESH_MINUTES is 0, background refresh disabled");
                self.refresh_interval = None;
            }
            Ok(minutes) => match minutes_to_duration(minutes) {
                Some(every) => self.refresh_interval = Some(every),
                None => warn!(value = %raw, "Ignoring out-of-range OUTLAY_REFRESH_MINUTES"),
            },
            Err(_) => warn!(value = %raw, "Ignoring invalid OUTLAY_REFRESH_MINUTES"),
        }
    }
}

/// Minutes as a Duration, or None when the seconds overflow
pub fn minutes_to_duration(minutes: u64) -> Option<Duration> {
    minutes.checked_mul(60).map(Duration::from_secs)
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("outlay").join("config").join("analytics.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<AnalyticsConfig> {
    let candidate = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match candidate {
        Some(path) if path.exists() => fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    cache: Option<RawCache>,
    scheduler: Option<RawScheduler>,
    anomaly: Option<RawAnomaly>,
    forecast: Option<RawForecast>,
    insights: Option<RawInsights>,
}

#[derive(Debug, Deserialize)]
struct RawCache {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawScheduler {
    refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawAnomaly {
    min_records: Option<usize>,
    medium_sigma: Option<f64>,
    high_sigma: Option<f64>,
    lookback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    min_months: Option<usize>,
    default_horizon: Option<usize>,
    history_months: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    unused_days: Option<i64>,
    trend_threshold_pct: Option<f64>,
    annual_discount: Option<f64>,
    annual_savings_floor: Option<f64>,
    price_increase_percent: Option<f64>,
    price_increase_absolute: Option<f64>,
}

fn parse_config(content: &str) -> Result<AnalyticsConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalyticsConfig::default();

    if let Some(ttl) = raw.cache.and_then(|c| c.ttl_secs) {
        config.cache_ttl = Duration::from_secs(ttl);
    }

    if let Some(secs) = raw.scheduler.and_then(|s| s.refresh_interval_secs) {
        config.refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
    }

    if let Some(anomaly) = raw.anomaly {
        if let Some(min) = anomaly.min_records {
            config.anomaly.min_records = min;
        }
        if let Some(sigma) = anomaly.medium_sigma {
            config.anomaly.medium_sigma = sigma;
        }
        if let Some(sigma) = anomaly.high_sigma {
            config.anomaly.high_sigma = sigma;
        }
        if let Some(lookback) = anomaly.lookback {
            config.anomaly.lookback = lookback.parse().map_err(Error::Config)?;
        }
        if config.anomaly.high_sigma < config.anomaly.medium_sigma {
            return Err(Error::Config(
                "anomaly.high_sigma must not be below anomaly.medium_sigma".to_string(),
            ));
        }
    }

    if let Some(forecast) = raw.forecast {
        if let Some(min) = forecast.min_months {
            // OLS needs two distinct x values
            config.forecast.min_months = min.max(2);
        }
        if let Some(horizon) = forecast.default_horizon {
            config.forecast.default_horizon = horizon;
        }
        if let Some(history) = forecast.history_months {
            config.forecast.history_months = history;
        }
    }

    if let Some(insights) = raw.insights {
        if let Some(days) = insights.unused_days {
            config.insights.unused_days = days;
        }
        if let Some(pct) = insights.trend_threshold_pct {
            config.insights.trend_threshold_pct = pct;
        }
        if let Some(discount) = insights.annual_discount {
            config.insights.annual_discount = discount;
        }
        if let Some(floor) = insights.annual_savings_floor {
            config.insights.annual_savings_floor = floor;
        }
        if let Some(pct) = insights.price_increase_percent {
            config.insights.price_increase_percent = pct;
        }
        if let Some(abs) = insights.price_increase_absolute {
            config.insights.price_increase_absolute = abs;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AnalyticsConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = AnalyticsConfig::from_toml_str(
            r#"
            [cache]
            ttl_secs = 60

            [insights]
            unused_days = 45
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.insights.unused_days, 45);
        assert_eq!(config.insights.trend_threshold_pct, 20.0);
        assert_eq!(config.forecast.min_months, 6);
    }

    #[test]
    fn test_zero_refresh_disables_scheduler() {
        let config = AnalyticsConfig::from_toml_str(
            r#"
            [scheduler]
            refresh_interval_secs = 0
            "#,
        )
        .unwrap();
        assert!(config.refresh_interval.is_none());
    }

    #[test]
    fn test_refresh_minutes_override() {
        let mut config = AnalyticsConfig::default();
        config.apply_refresh_minutes("10");
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(600)));

        // Overflowing and garbage values leave the interval alone
        config.apply_refresh_minutes(&u64::MAX.to_string());
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(600)));
        config.apply_refresh_minutes("soon");
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(600)));

        config.apply_refresh_minutes("0");
        assert!(config.refresh_interval.is_none());
    }

    #[test]
    fn test_minutes_to_duration_overflow() {
        assert_eq!(minutes_to_duration(30), Some(Duration::from_secs(1800)));
        assert_eq!(minutes_to_duration(u64::MAX), None);
    }

    #[test]
    fn test_invalid_lookback_rejected() {
        let result = AnalyticsConfig::from_toml_str(
            r#"
            [anomaly]
            lookback = "fortnight"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_inverted_sigmas_rejected() {
        let result = AnalyticsConfig::from_toml_str(
            r#"
            [anomaly]
            medium_sigma = 3.0
            high_sigma = 2.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[forecast]\nmin_months = 4\ndefault_horizon = 6").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.forecast.min_months, 4);
        assert_eq!(config.forecast.default_horizon, 6);
    }

    #[test]
    fn test_missing_override_falls_back_to_embedded() {
        let config = load_config(Some(Path::new("/nonexistent/outlay.toml"))).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }
}
