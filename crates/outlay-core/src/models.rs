//! Domain models for Outlay

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Collaborator payloads
// =============================================================================

/// A tracked subscription as supplied by the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Price per billing cycle
    pub amount: f64,
    pub billing_cycle: BillingCycle,
    pub is_active: bool,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_paid_date: Option<NaiveDate>,
}

impl Subscription {
    /// Price normalized to a calendar month
    pub fn monthly_cost(&self) -> f64 {
        self.billing_cycle.monthly_equivalent(self.amount)
    }
}

/// Subscription billing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Approximate number of days between charges
    pub fn interval_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Quarterly => 91,
            Self::Yearly => 365,
        }
    }

    /// Convert a per-cycle amount into a per-month amount
    pub fn monthly_equivalent(&self, amount: f64) -> f64 {
        match self {
            Self::Weekly => amount * 52.0 / 12.0,
            Self::Monthly => amount,
            Self::Quarterly => amount / 3.0,
            Self::Yearly => amount / 12.0,
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" | "annually" => Ok(Self::Yearly),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single payment made for a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub status: PaymentStatus,
}

/// Payment settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" | "paid" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

/// A spending ceiling for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBudget {
    pub category: String,
    pub amount: f64,
    /// Carry the unspent part of the previous period forward
    #[serde(default)]
    pub rollover: bool,
}

// =============================================================================
// Aggregation
// =============================================================================

/// One dated payment, the unit of all aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_name: Option<String>,
}

/// Spending summary for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// Month key in `YYYY-MM` form
    pub month: String,
    pub total: f64,
    pub categories: BTreeMap<String, f64>,
    pub subscriptions: BTreeMap<String, f64>,
    pub count: usize,
    pub average: f64,
    /// Percent change vs. the previous bucket (0 for the first one)
    pub trend_pct: f64,
    pub is_forecast: bool,
}

/// Spending for one category within a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub trend_pct: f64,
    pub previous_amount: f64,
    pub subscription_count: usize,
}

// =============================================================================
// Detection & forecasting
// =============================================================================

/// How far an anomalous charge sits from the mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Medium,
    High,
}

impl AnomalySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A charge that deviates from the population of charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub amount: f64,
    pub expected_amount: f64,
    pub deviation: f64,
    pub severity: AnomalySeverity,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

/// One component of a forecast value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFactor {
    pub name: String,
    pub impact: f64,
    pub description: String,
}

/// Projected spending for one future month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Month key in `YYYY-MM` form
    pub period: String,
    pub predicted_amount: f64,
    pub confidence: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub factors: Vec<ForecastFactor>,
}

// =============================================================================
// Budgets
// =============================================================================

/// Budget status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Under,
    Warning,
    Over,
    Danger,
}

impl BudgetTier {
    /// Classify a spent/budgeted percentage
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Danger
        } else if percentage >= 90.0 {
            Self::Over
        } else if percentage >= 75.0 {
            Self::Warning
        } else {
            Self::Under
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under => "under",
            Self::Warning => "warning",
            Self::Over => "over",
            Self::Danger => "danger",
        }
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spend vs. ceiling for one budgeted category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub category: String,
    pub budgeted: f64,
    pub spent: f64,
    /// Negative when over budget
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetTier,
    pub trend_pct: f64,
}

/// Budget totals across all categories, with a month-end projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_budgeted: f64,
    pub total_spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    /// As-of-today tier
    pub status: BudgetTier,
    pub days_in_month: u32,
    pub day_of_month: u32,
    pub days_remaining: u32,
    pub daily_budget: f64,
    pub daily_average: f64,
    pub projected_total: f64,
    pub projected_percentage: f64,
    /// Tier of the projected month-end spend
    pub projected_status: BudgetTier,
}

// =============================================================================
// Reports
// =============================================================================

/// A detected change in a subscription's charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub date: NaiveDate,
    pub old_amount: f64,
    pub new_amount: f64,
    pub change_pct: f64,
}

/// Total spend in one month for a single subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    pub month: String,
    pub amount: f64,
}

/// Detailed view of one subscription's payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionAnalytics {
    pub subscription_id: String,
    pub name: String,
    pub category: String,
    pub billing_cycle: BillingCycle,
    pub total_spent: f64,
    pub payment_count: usize,
    pub average_payment: f64,
    pub first_payment: Option<NaiveDate>,
    pub last_payment: Option<NaiveDate>,
    pub monthly_cost: f64,
    pub annual_cost: f64,
    /// Share of all recorded spending, in percent
    pub share_of_spending: f64,
    pub price_changes: Vec<PriceChange>,
    pub monthly_history: Vec<MonthlyAmount>,
}

/// Totals for one side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: f64,
    pub count: usize,
}

/// Category delta between two windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: String,
    pub current: f64,
    pub previous: f64,
    pub change_pct: f64,
}

/// Current window vs. the equally long window before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub comparison: String,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub change_amount: f64,
    pub change_pct: f64,
    pub categories: Vec<CategoryChange>,
}

/// Spending totals for one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyData {
    pub year: i32,
    pub total: f64,
    pub monthly_average: f64,
    pub payment_count: usize,
    pub subscription_count: usize,
    pub change_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_category: Option<String>,
}

/// Outcome of one background refresh pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub insights: usize,
    pub anomalies: usize,
    pub predictions: usize,
    pub completed_at: DateTime<Utc>,
}
