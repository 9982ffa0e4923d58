//! Record source collaborator
//!
//! The host application owns persistence. The analytics engine reads
//! subscriptions, payment history, and budgets through [`RecordSource`] and
//! normalizes everything at this boundary before aggregation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{PaymentRecord, PaymentStatus, SpendingRecord, Subscription, UserBudget};

/// Interface the host application implements to feed the engine
///
/// Implementations should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All known subscriptions (active and inactive)
    async fn subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Payment history for one subscription, in any order
    async fn payment_history(&self, subscription_id: &str) -> Result<Vec<PaymentRecord>>;

    /// User-defined category budgets
    async fn user_budgets(&self) -> Result<Vec<UserBudget>>;
}

/// Normalized view of everything the source returned
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub subscriptions: Vec<Subscription>,
    /// Completed payments per subscription id, oldest first
    pub payments: HashMap<String, Vec<PaymentRecord>>,
    /// Flattened spending records, oldest first
    pub records: Vec<SpendingRecord>,
}

/// Fetch subscriptions and all payment histories
///
/// Histories are fetched concurrently and all of them are awaited before
/// records are flattened, so the result is always complete.
pub async fn load_records(source: &dyn RecordSource) -> Result<LoadedRecords> {
    let subscriptions = normalize_subscriptions(source.subscriptions().await?);

    let histories = join_all(
        subscriptions
            .iter()
            .map(|sub| source.payment_history(&sub.id)),
    )
    .await;

    let mut loaded = LoadedRecords::default();
    for (sub, history) in subscriptions.iter().zip(histories) {
        let payments = normalize_payments(&sub.id, history?);
        loaded.records.extend(payments.iter().map(|p| SpendingRecord {
            date: p.date,
            amount: p.amount,
            category: sub.category.clone(),
            subscription_id: Some(sub.id.clone()),
            subscription_name: Some(sub.name.clone()),
        }));
        loaded.payments.insert(sub.id.clone(), payments);
    }

    loaded.records.sort_by(|a, b| a.date.cmp(&b.date));
    loaded.subscriptions = subscriptions;

    debug!(
        subscriptions = loaded.subscriptions.len(),
        records = loaded.records.len(),
        "Loaded spending records"
    );

    Ok(loaded)
}

/// Fetch and normalize budgets
pub async fn load_budgets(source: &dyn RecordSource) -> Result<Vec<UserBudget>> {
    Ok(normalize_budgets(source.user_budgets().await?))
}

/// Drop subscriptions that cannot be aggregated
pub fn normalize_subscriptions(raw: Vec<Subscription>) -> Vec<Subscription> {
    raw.into_iter()
        .filter_map(|mut sub| {
            if sub.id.trim().is_empty() {
                warn!(name = %sub.name, "Skipping subscription without id");
                return None;
            }
            if !sub.amount.is_finite() || sub.amount < 0.0 {
                warn!(id = %sub.id, amount = sub.amount, "Skipping subscription with invalid amount");
                return None;
            }
            if sub.category.trim().is_empty() {
                sub.category = "Uncategorized".to_string();
            }
            Some(sub)
        })
        .collect()
}

/// Keep completed payments with usable amounts, oldest first
pub fn normalize_payments(subscription_id: &str, raw: Vec<PaymentRecord>) -> Vec<PaymentRecord> {
    let mut payments: Vec<PaymentRecord> = raw
        .into_iter()
        .filter(|p| {
            if p.status != PaymentStatus::Completed {
                return false;
            }
            let valid = p.amount.is_finite() && p.amount > 0.0;
            if !valid {
                warn!(
                    subscription = subscription_id,
                    payment = %p.id,
                    amount = p.amount,
                    "Skipping payment with invalid amount"
                );
            }
            valid
        })
        .collect();
    payments.sort_by(|a, b| a.date.cmp(&b.date));
    payments
}

pub fn normalize_budgets(raw: Vec<UserBudget>) -> Vec<UserBudget> {
    raw.into_iter()
        .filter(|b| {
            let valid = b.amount.is_finite() && b.amount >= 0.0 && !b.category.trim().is_empty();
            if !valid {
                warn!(category = %b.category, amount = b.amount, "Skipping invalid budget");
            }
            valid
        })
        .collect()
}

/// Serializable snapshot of everything a record source serves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    /// Payment history keyed by subscription id
    #[serde(default)]
    pub payments: HashMap<String, Vec<PaymentRecord>>,
    #[serde(default)]
    pub budgets: Vec<UserBudget>,
}

/// In-memory record source backed by a [`Snapshot`]
#[derive(Debug, Default)]
pub struct MemorySource {
    snapshot: RwLock<Snapshot>,
    failure: RwLock<Option<String>>,
}

impl MemorySource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            failure: RwLock::new(None),
        }
    }

    /// Replace the served data (the host should then notify the service)
    pub fn replace(&self, snapshot: Snapshot) {
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = snapshot;
        }
    }

    /// Make every call fail with `message` until cleared
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut guard) = self.failure.write() {
            *guard = Some(message.into());
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut guard) = self.failure.write() {
            *guard = None;
        }
    }

    fn check(&self) -> Result<()> {
        let guard = self
            .failure
            .read()
            .map_err(|_| Error::Source("record source lock poisoned".to_string()))?;
        match guard.as_ref() {
            Some(message) => Err(Error::Source(message.clone())),
            None => Ok(()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> Result<T> {
        self.check()?;
        let guard = self
            .snapshot
            .read()
            .map_err(|_| Error::Source("record source lock poisoned".to_string()))?;
        Ok(f(&guard))
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.read(|s| s.subscriptions.clone())
    }

    async fn payment_history(&self, subscription_id: &str) -> Result<Vec<PaymentRecord>> {
        self.read(|s| s.payments.get(subscription_id).cloned().unwrap_or_default())
    }

    async fn user_budgets(&self) -> Result<Vec<UserBudget>> {
        self.read(|s| s.budgets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingCycle;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sub(id: &str, amount: f64) -> Subscription {
        Subscription {
            id: id.to_string(),
            name: format!("Service {}", id),
            category: "Streaming".to_string(),
            amount,
            billing_cycle: BillingCycle::Monthly,
            is_active: true,
            created_at: date(2025, 1, 1),
            last_paid_date: None,
        }
    }

    fn payment(id: &str, d: NaiveDate, amount: f64, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            id: id.to_string(),
            date: d,
            amount,
            status,
        }
    }

    #[test]
    fn test_normalize_subscriptions_drops_invalid() {
        let mut blank = sub("", 5.0);
        blank.name = "Blank".to_string();
        let subs = normalize_subscriptions(vec![
            sub("a", 10.0),
            blank,
            sub("b", f64::NAN),
            sub("c", -1.0),
        ]);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "a");
    }

    #[test]
    fn test_normalize_payments_keeps_completed_sorted() {
        let payments = normalize_payments(
            "a",
            vec![
                payment("2", date(2025, 2, 1), 10.0, PaymentStatus::Completed),
                payment("1", date(2025, 1, 1), 10.0, PaymentStatus::Completed),
                payment("3", date(2025, 3, 1), 10.0, PaymentStatus::Failed),
                payment("4", date(2025, 4, 1), f64::INFINITY, PaymentStatus::Completed),
            ],
        );
        let ids: Vec<_> = payments.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_load_records_flattens_all_histories() {
        let mut snapshot = Snapshot {
            subscriptions: vec![sub("a", 10.0), sub("b", 20.0)],
            ..Default::default()
        };
        snapshot.payments.insert(
            "a".to_string(),
            vec![
                payment("a2", date(2025, 3, 1), 10.0, PaymentStatus::Completed),
                payment("a1", date(2025, 1, 1), 10.0, PaymentStatus::Completed),
            ],
        );
        snapshot.payments.insert(
            "b".to_string(),
            vec![payment("b1", date(2025, 2, 1), 20.0, PaymentStatus::Completed)],
        );

        let source = MemorySource::new(snapshot);
        let loaded = load_records(&source).await.unwrap();

        assert_eq!(loaded.records.len(), 3);
        let dates: Vec<_> = loaded.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 2, 1), date(2025, 3, 1)]);
        assert_eq!(loaded.records[1].subscription_id.as_deref(), Some("b"));
        assert_eq!(loaded.payments["a"].len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_propagates() {
        let source = MemorySource::new(Snapshot::default());
        source.fail_with("backend offline");

        let err = load_records(&source).await.unwrap_err();
        assert!(matches!(err, Error::Source(ref m) if m == "backend offline"));

        source.clear_failure();
        assert!(load_records(&source).await.is_ok());
    }
}
