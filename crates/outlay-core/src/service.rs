//! Analytics service - the public query surface
//!
//! Every query is memoized in a [`TtlCache`] keyed by operation and
//! parameters. Queries are failure boundaries: upstream errors are logged
//! and turned into an empty list or `None`. The period comparison is the
//! one exception and returns its error to the caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::aggregate::{self, filter_range, filter_records, monthly_window};
use crate::anomaly::AnomalyDetector;
use crate::budget;
use crate::cache::{cache_key, CacheStats, TtlCache};
use crate::config::AnalyticsConfig;
use crate::forecast::{forecast_bucket, ForecastEngine};
use crate::insights::{AnalysisContext, Insight, InsightGenerator};
use crate::models::{
    Anomaly, BudgetStatus, BudgetSummary, CategoryBreakdown, ComparisonData, Forecast,
    MonthlyBucket, RefreshSummary, SpendingRecord, SubscriptionAnalytics, YearlyData,
};
use crate::period::{
    first_of_month, month_key, shift_months, Period, PeriodComparison, MAX_HORIZON_MONTHS,
    MAX_WINDOW_MONTHS,
};
use crate::reports;
use crate::source::{load_budgets, load_records, LoadedRecords, RecordSource};
use crate::Result;

/// Push notification delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    /// The host reported new or changed records; cached views were dropped
    DataChanged,
    /// A refresh pass recomputed the pipeline
    Refreshed(RefreshSummary),
}

type Listener = Arc<dyn Fn(&AnalyticsEvent) + Send + Sync>;
type ListenerMap = Mutex<HashMap<u64, Listener>>;

/// Registration returned by [`AnalyticsService::subscribe`]
///
/// Dropping the handle keeps the listener registered.
pub struct ListenerHandle {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl ListenerHandle {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).remove(&self.id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Log a failed query and fall back to an empty value
fn or_empty<T: Default>(operation: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(operation, error = %e, "Analytics query failed");
            T::default()
        }
    }
}

pub struct AnalyticsService {
    source: Arc<dyn RecordSource>,
    config: AnalyticsConfig,
    cache: Mutex<TtlCache>,
    listeners: Arc<ListenerMap>,
    next_listener: AtomicU64,
    reference_date: Option<NaiveDate>,
    generator: InsightGenerator,
    detector: AnomalyDetector,
    forecaster: ForecastEngine,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn RecordSource>, config: AnalyticsConfig) -> Self {
        Self {
            source,
            cache: Mutex::new(TtlCache::new(config.cache_ttl)),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: AtomicU64::new(1),
            reference_date: None,
            generator: InsightGenerator::new(),
            detector: AnomalyDetector::new(config.anomaly.clone()),
            forecaster: ForecastEngine::new(config.forecast.clone()),
            config,
        }
    }

    /// Pin "today" instead of reading the local clock
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Last day of the previous calendar month
    fn last_complete_month(&self) -> NaiveDate {
        first_of_month(self.today()) - chrono::Duration::days(1)
    }

    async fn cached<T, F, Fut>(&self, key: String, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let hit = lock(&self.cache).get::<T>(&key);
        if let Some(value) = hit {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let value = compute().await?;
        lock(&self.cache).set(&key, &value);
        Ok(value)
    }

    async fn records(&self) -> Result<LoadedRecords> {
        load_records(self.source.as_ref()).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Spending records in `period`, optionally limited to one category
    pub async fn spending_data(
        &self,
        period: Period,
        category: Option<&str>,
    ) -> Vec<SpendingRecord> {
        let key = cache_key("spending", &(period, category));
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                Ok(filter_records(&loaded.records, period, category, self.today()))
            })
            .await;
        or_empty("spending_data", result)
    }

    /// The last `months` calendar months, current month included
    ///
    /// With `include_forecast`, one projected bucket for next month is
    /// appended (flagged `is_forecast`).
    pub async fn monthly_data(&self, months: usize, include_forecast: bool) -> Vec<MonthlyBucket> {
        let months = months.min(MAX_WINDOW_MONTHS);
        let key = cache_key("monthly", &(months, include_forecast));
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                let today = self.today();
                let mut buckets = monthly_window(&loaded.records, today, months);

                if include_forecast {
                    let totals: Vec<f64> = buckets.iter().map(|b| b.total).collect();
                    let month = month_key(shift_months(first_of_month(today), 1));
                    let projected = match (buckets.last(), self.forecaster.next_month(&totals)) {
                        (Some(last), Some(next)) => Some(forecast_bucket(last, month, &next)),
                        _ => None,
                    };
                    buckets.extend(projected);
                }
                Ok(buckets)
            })
            .await;
        or_empty("monthly_data", result)
    }

    pub async fn category_breakdown(&self, period: Period) -> Vec<CategoryBreakdown> {
        let key = cache_key("categories", &period);
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                Ok(self.breakdowns(&loaded.records, period).0)
            })
            .await;
        or_empty("category_breakdown", result)
    }

    /// Current and previous-period breakdowns
    fn breakdowns(
        &self,
        records: &[SpendingRecord],
        period: Period,
    ) -> (Vec<CategoryBreakdown>, Option<Vec<CategoryBreakdown>>) {
        let today = self.today();
        let current = filter_records(records, period, None, today);

        match period.previous_range(today) {
            Some((from, to)) => {
                let previous = filter_range(records, from, to);
                (
                    aggregate::category_breakdown(&current, &previous),
                    Some(aggregate::category_breakdown(&previous, &[])),
                )
            }
            None => (aggregate::category_breakdown(&current, &[]), None),
        }
    }

    pub async fn subscription_analytics(&self, id: &str) -> Option<SubscriptionAnalytics> {
        let key = cache_key("subscription", id);
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                let Some(sub) = loaded.subscriptions.iter().find(|s| s.id == id) else {
                    return Ok(None);
                };
                let payments = loaded
                    .payments
                    .get(id)
                    .map(|p| p.as_slice())
                    .unwrap_or(&[]);
                Ok(Some(reports::subscription_analytics(
                    sub,
                    payments,
                    &loaded.records,
                    self.today(),
                )))
            })
            .await;
        or_empty("subscription_analytics", result)
    }

    /// Ranked insights from every analyzer
    pub async fn insights(&self) -> Vec<Insight> {
        let result = self
            .cached("insights".to_string(), || async move {
                let (loaded, budgets) = futures::try_join!(
                    self.records(),
                    load_budgets(self.source.as_ref())
                )?;

                let (current, previous) = self.breakdowns(&loaded.records, Period::Month);
                let statuses = budget::evaluate(&budgets, &current, previous.as_deref());
                let monthly = monthly_window(
                    &loaded.records,
                    self.last_complete_month(),
                    self.config.forecast.history_months,
                );

                let ctx = AnalysisContext {
                    today: self.today(),
                    subscriptions: &loaded.subscriptions,
                    payments: &loaded.payments,
                    monthly: &monthly,
                    budgets: &statuses,
                    config: &self.config.insights,
                };
                Ok(self.generator.analyze_all(&ctx).await)
            })
            .await;
        or_empty("insights", result)
    }

    /// Forecast the next `months` months from complete-month history
    pub async fn predictions(&self, months: usize) -> Vec<Forecast> {
        let months = months.min(MAX_HORIZON_MONTHS);
        let key = cache_key("predictions", &months);
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                let last_month = self.last_complete_month();
                let history = monthly_window(
                    &loaded.records,
                    last_month,
                    self.config.forecast.history_months,
                );

                // Leading months before any spending would drag the fit down
                let totals: Vec<f64> = history
                    .iter()
                    .map(|b| b.total)
                    .skip_while(|t| *t == 0.0)
                    .collect();

                let recurring: f64 = loaded
                    .subscriptions
                    .iter()
                    .filter(|s| s.is_active)
                    .map(|s| s.monthly_cost())
                    .sum();
                let recurring = (!loaded.subscriptions.is_empty()).then_some(recurring);

                Ok(self
                    .forecaster
                    .predict(&totals, last_month, months, recurring))
            })
            .await;
        or_empty("predictions", result)
    }

    pub async fn budget_data(&self, period: Period) -> Vec<BudgetStatus> {
        or_empty("budget_data", self.try_budget_data(period).await)
    }

    async fn try_budget_data(&self, period: Period) -> Result<Vec<BudgetStatus>> {
        let key = cache_key("budgets", &period);
        self.cached(key, || async move {
            let (loaded, budgets) =
                futures::try_join!(self.records(), load_budgets(self.source.as_ref()))?;
            let (current, previous) = self.breakdowns(&loaded.records, period);
            Ok(budget::evaluate(&budgets, &current, previous.as_deref()))
        })
        .await
    }

    /// Totals across all budgets for `period` with a month-end projection
    ///
    /// The projection always runs over the current calendar month.
    pub async fn budget_summary(&self, period: Period) -> Option<BudgetSummary> {
        let result: Result<Option<BudgetSummary>> = async {
            let statuses = self.try_budget_data(period).await?;
            let month = match period {
                Period::Month => statuses.clone(),
                _ => self.try_budget_data(Period::Month).await?,
            };
            Ok(budget::summarize(&statuses, &month, self.today()))
        }
        .await;
        or_empty("budget_summary", result)
    }

    /// Compare the last N months against the N before them
    ///
    /// Unlike the other queries, failures are returned to the caller.
    pub async fn comparison_data(&self, comparison: PeriodComparison) -> Result<ComparisonData> {
        let key = cache_key("comparison", &comparison);
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                Ok(reports::comparison_data(
                    &loaded.records,
                    comparison,
                    self.today(),
                ))
            })
            .await;

        if let Err(e) = &result {
            error!(comparison = %comparison, error = %e, "Comparison query failed");
        }
        result
    }

    pub async fn year_over_year(&self) -> Vec<YearlyData> {
        let result = self
            .cached("yearly".to_string(), || async move {
                let loaded = self.records().await?;
                Ok(reports::yearly_data(&loaded.records, self.today()))
            })
            .await;
        or_empty("year_over_year", result)
    }

    /// Unusual charges within `period` (configured lookback when None)
    pub async fn anomalies(&self, period: Option<Period>) -> Vec<Anomaly> {
        let period = period.unwrap_or(self.config.anomaly.lookback);
        let key = cache_key("anomalies", &period);
        let result = self
            .cached(key, || async move {
                let loaded = self.records().await?;
                let window = filter_records(&loaded.records, period, None, self.today());
                Ok(self.detector.detect(&window))
            })
            .await;
        or_empty("anomalies", result)
    }

    // =========================================================================
    // Cache and observers
    // =========================================================================

    /// Drop every cached view
    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
        debug!("Analytics cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.cache).stats()
    }

    pub fn subscribe<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&AnalyticsEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).insert(id, Arc::new(callback));
        ListenerHandle {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn emit(&self, event: AnalyticsEvent) {
        // Listeners may unsubscribe from inside the callback
        let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener(&event);
        }
    }

    /// Called by the host after it saved new or changed records
    pub fn notify_data_changed(&self) {
        self.clear_cache();
        self.emit(AnalyticsEvent::DataChanged);
    }

    /// Recompute insights, anomalies, and predictions from scratch
    ///
    /// Repopulates the cache and notifies listeners.
    pub async fn refresh(&self) -> RefreshSummary {
        self.clear_cache();

        let (insights, anomalies, predictions) = tokio::join!(
            self.insights(),
            self.anomalies(None),
            self.predictions(self.config.forecast.default_horizon),
        );

        let summary = RefreshSummary {
            insights: insights.len(),
            anomalies: anomalies.len(),
            predictions: predictions.len(),
            completed_at: Utc::now(),
        };

        info!(
            insights = summary.insights,
            anomalies = summary.anomalies,
            predictions = summary.predictions,
            "Analytics refresh complete"
        );

        self.emit(AnalyticsEvent::Refreshed(summary.clone()));
        summary
    }
}
