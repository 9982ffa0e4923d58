//! Outlay Core Library
//!
//! Analytics and forecasting engine for the Outlay subscription tracker:
//! - Record source boundary and normalization
//! - Calendar-month aggregation and category breakdowns
//! - Z-score anomaly detection
//! - Linear-trend spending forecasts
//! - Budget evaluation with month-end projection
//! - Rule-based insight generator
//! - TTL-cached query service with push notifications
//! - Background refresh scheduler

pub mod aggregate;
pub mod anomaly;
pub mod budget;
pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod models;
pub mod period;
pub mod reports;
pub mod scheduler;
pub mod service;
pub mod source;

/// Fixture builders and a slow record source
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use anomaly::AnomalyDetector;
pub use cache::{CacheStats, TtlCache};
pub use config::{minutes_to_duration, AnalyticsConfig, AnomalyConfig, ForecastConfig, InsightConfig};
pub use error::{Error, Result};
pub use forecast::ForecastEngine;
pub use insights::{Impact, Insight, InsightGenerator, InsightType};
pub use models::{
    Anomaly, AnomalySeverity, BillingCycle, BudgetStatus, BudgetSummary, BudgetTier,
    CategoryBreakdown, ComparisonData, Forecast, MonthlyBucket, PaymentRecord, PaymentStatus,
    RefreshSummary, SpendingRecord, Subscription, SubscriptionAnalytics, UserBudget, YearlyData,
};
pub use period::{Period, PeriodComparison};
pub use scheduler::BackgroundScheduler;
pub use service::{AnalyticsEvent, AnalyticsService, ListenerHandle};
pub use source::{MemorySource, RecordSource, Snapshot};
