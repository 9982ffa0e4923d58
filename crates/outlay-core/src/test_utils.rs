//! Test utilities for outlay-core
//!
//! Fixture builders plus a record source that answers slowly, for
//! exercising concurrency in the service and scheduler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    BillingCycle, MonthlyBucket, PaymentRecord, PaymentStatus, SpendingRecord, Subscription,
    UserBudget,
};
use crate::source::{MemorySource, RecordSource, Snapshot};
use crate::Result;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Active monthly subscription created at the start of 2024
pub fn subscription(id: &str, name: &str, category: &str, amount: f64) -> Subscription {
    Subscription {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        amount,
        billing_cycle: BillingCycle::Monthly,
        is_active: true,
        created_at: date(2024, 1, 1),
        last_paid_date: None,
    }
}

pub fn completed_payment(id: &str, date: NaiveDate, amount: f64) -> PaymentRecord {
    PaymentRecord {
        id: id.to_string(),
        date,
        amount,
        status: PaymentStatus::Completed,
    }
}

pub fn record(
    date: NaiveDate,
    amount: f64,
    category: &str,
    subscription_id: Option<&str>,
) -> SpendingRecord {
    SpendingRecord {
        date,
        amount,
        category: category.to_string(),
        subscription_id: subscription_id.map(str::to_string),
        subscription_name: None,
    }
}

pub fn bucket(month: &str, total: f64) -> MonthlyBucket {
    MonthlyBucket {
        month: month.to_string(),
        total,
        categories: Default::default(),
        subscriptions: Default::default(),
        count: usize::from(total > 0.0),
        average: total,
        trend_pct: 0.0,
        is_forecast: false,
    }
}

/// Reference date the sample snapshot is built around
pub fn sample_today() -> NaiveDate {
    date(2025, 6, 15)
}

/// Monthly payments on `day` from `from` through `to` (inclusive months)
fn monthly_payments(
    prefix: &str,
    from: (i32, u32),
    to: (i32, u32),
    day: u32,
    amount: impl Fn(i32, u32) -> f64,
) -> Vec<PaymentRecord> {
    let mut payments = Vec::new();
    let (mut y, mut m) = from;
    while (y, m) <= to {
        payments.push(completed_payment(
            &format!("{}-{}-{:02}", prefix, y, m),
            date(y, m, day),
            amount(y, m),
        ));
        if m == 12 {
            y += 1;
            m = 1;
        } else {
            m += 1;
        }
    }
    payments
}

/// A year of realistic history as of [`sample_today`]
///
/// - Netflix raised its price in April 2025 (15.49 → 17.99)
/// - a second "Netflix" subscription started in January 2025
/// - the gym has not been paid since March
/// - Streaming and Music are over budget this month
pub fn sample_snapshot() -> Snapshot {
    let mut netflix_family = subscription("netflix-family", "Netflix", "Streaming", 22.99);
    netflix_family.created_at = date(2025, 1, 1);

    let mut domain = subscription("domain", "Domain Renewal", "Web", 12.0);
    domain.billing_cycle = BillingCycle::Yearly;

    let mut old_magazine = subscription("magazine", "Magazine", "News", 4.99);
    old_magazine.is_active = false;

    let subscriptions = vec![
        subscription("netflix", "Netflix", "Streaming", 17.99),
        netflix_family,
        subscription("spotify", "Spotify", "Music", 10.99),
        subscription("gym", "Gym", "Fitness", 40.0),
        subscription("icloud", "iCloud", "Storage", 2.99),
        domain,
        old_magazine,
    ];

    let mut snapshot = Snapshot {
        subscriptions,
        budgets: vec![
            UserBudget {
                category: "Streaming".to_string(),
                amount: 40.0,
                rollover: false,
            },
            UserBudget {
                category: "Music".to_string(),
                amount: 12.0,
                rollover: false,
            },
            UserBudget {
                category: "Fitness".to_string(),
                amount: 50.0,
                rollover: true,
            },
        ],
        ..Default::default()
    };

    let payments = &mut snapshot.payments;
    payments.insert(
        "netflix".to_string(),
        monthly_payments("nf", (2024, 7), (2025, 6), 5, |y, m| {
            if (y, m) >= (2025, 4) {
                17.99
            } else {
                15.49
            }
        }),
    );
    payments.insert(
        "netflix-family".to_string(),
        monthly_payments("nff", (2025, 1), (2025, 6), 8, |_, _| 22.99),
    );
    payments.insert(
        "spotify".to_string(),
        monthly_payments("sp", (2024, 7), (2025, 6), 12, |_, _| 10.99),
    );
    payments.insert(
        "gym".to_string(),
        monthly_payments("gym", (2024, 7), (2025, 3), 1, |_, _| 40.0),
    );
    payments.insert(
        "icloud".to_string(),
        monthly_payments("ic", (2024, 7), (2025, 6), 20, |_, _| 2.99),
    );
    payments.insert(
        "domain".to_string(),
        vec![completed_payment("dom-2024", date(2024, 9, 10), 12.0)],
    );
    payments.insert(
        "magazine".to_string(),
        vec![
            completed_payment("mag-1", date(2024, 7, 3), 4.99),
            PaymentRecord {
                id: "mag-2".to_string(),
                date: date(2024, 8, 3),
                amount: 4.99,
                status: PaymentStatus::Refunded,
            },
        ],
    );

    snapshot
}

/// Record source that waits before every answer and counts calls
pub struct SlowSource {
    inner: MemorySource,
    delay: Duration,
    subscription_calls: AtomicUsize,
}

impl SlowSource {
    pub fn new(snapshot: Snapshot, delay: Duration) -> Self {
        Self {
            inner: MemorySource::new(snapshot),
            delay,
            subscription_calls: AtomicUsize::new(0),
        }
    }

    pub fn subscription_calls(&self) -> usize {
        self.subscription_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for SlowSource {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.subscription_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.subscriptions().await
    }

    async fn payment_history(&self, subscription_id: &str) -> Result<Vec<PaymentRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.payment_history(subscription_id).await
    }

    async fn user_budgets(&self) -> Result<Vec<UserBudget>> {
        tokio::time::sleep(self.delay).await;
        self.inner.user_budgets().await
    }
}
