//! Time-bucket aggregation
//!
//! Groups spending records into calendar-month buckets and per-category
//! breakdowns. Division by a zero prior total is defined as a 0% trend,
//! never NaN or infinity.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::models::{CategoryBreakdown, MonthlyBucket, SpendingRecord};
use crate::period::{month_key, month_keys_ending, Period};

/// Percent change from `previous` to `current`; 0 when `previous` is 0
pub fn trend_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Apply a period window and optional category filter
pub fn filter_records(
    records: &[SpendingRecord],
    period: Period,
    category: Option<&str>,
    today: NaiveDate,
) -> Vec<SpendingRecord> {
    let range = period.range(today);
    records
        .iter()
        .filter(|r| match range {
            Some((from, to)) => r.date >= from && r.date <= to,
            None => true,
        })
        .filter(|r| category.map_or(true, |c| r.category.eq_ignore_ascii_case(c)))
        .cloned()
        .collect()
}

/// Records dated within `[from, to]`
pub fn filter_range(records: &[SpendingRecord], from: NaiveDate, to: NaiveDate) -> Vec<SpendingRecord> {
    records
        .iter()
        .filter(|r| r.date >= from && r.date <= to)
        .cloned()
        .collect()
}

/// One bucket per month that has records, oldest first
pub fn monthly_buckets(records: &[SpendingRecord]) -> Vec<MonthlyBucket> {
    let months: BTreeSet<String> = records.iter().map(|r| month_key(r.date)).collect();
    build_buckets(records, months.into_iter().collect())
}

/// Exactly `months` buckets ending with the month of `end`, zero-filled
pub fn monthly_window(records: &[SpendingRecord], end: NaiveDate, months: usize) -> Vec<MonthlyBucket> {
    build_buckets(records, month_keys_ending(end, months))
}

fn build_buckets(records: &[SpendingRecord], keys: Vec<String>) -> Vec<MonthlyBucket> {
    let mut by_month: HashMap<&str, MonthlyBucket> = HashMap::new();
    for key in &keys {
        by_month.insert(key.as_str(), empty_bucket(key));
    }

    for record in records {
        let key = month_key(record.date);
        let Some(bucket) = by_month.get_mut(key.as_str()) else {
            continue;
        };
        bucket.total += record.amount;
        bucket.count += 1;
        *bucket
            .categories
            .entry(record.category.clone())
            .or_insert(0.0) += record.amount;
        if let Some(id) = &record.subscription_id {
            *bucket.subscriptions.entry(id.clone()).or_insert(0.0) += record.amount;
        }
    }

    let mut buckets: Vec<MonthlyBucket> = keys
        .iter()
        .filter_map(|key| by_month.remove(key.as_str()))
        .collect();

    for bucket in &mut buckets {
        bucket.average = if bucket.count > 0 {
            bucket.total / bucket.count as f64
        } else {
            0.0
        };
    }

    apply_trends(&mut buckets);
    buckets
}

fn empty_bucket(month: &str) -> MonthlyBucket {
    MonthlyBucket {
        month: month.to_string(),
        total: 0.0,
        categories: BTreeMap::new(),
        subscriptions: BTreeMap::new(),
        count: 0,
        average: 0.0,
        trend_pct: 0.0,
        is_forecast: false,
    }
}

/// Recompute `trend_pct` for chronologically ordered buckets
pub fn apply_trends(buckets: &mut [MonthlyBucket]) {
    let mut previous: Option<f64> = None;
    for bucket in buckets.iter_mut() {
        bucket.trend_pct = previous.map_or(0.0, |prev| trend_pct(bucket.total, prev));
        previous = Some(bucket.total);
    }
}

/// Category totals for `current`, with trend vs. `previous`
///
/// Sorted by amount, largest first. Percentages are shares of the current
/// total and sum to 100 whenever that total is nonzero.
pub fn category_breakdown(
    current: &[SpendingRecord],
    previous: &[SpendingRecord],
) -> Vec<CategoryBreakdown> {
    let mut amounts: HashMap<&str, f64> = HashMap::new();
    let mut subscriptions: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for record in current {
        *amounts.entry(record.category.as_str()).or_insert(0.0) += record.amount;
        let ids = subscriptions.entry(record.category.as_str()).or_default();
        if let Some(id) = &record.subscription_id {
            ids.insert(id.as_str());
        }
    }

    let mut previous_amounts: HashMap<&str, f64> = HashMap::new();
    for record in previous {
        *previous_amounts
            .entry(record.category.as_str())
            .or_insert(0.0) += record.amount;
    }

    let total: f64 = amounts.values().sum();

    let mut breakdown: Vec<CategoryBreakdown> = amounts
        .iter()
        .map(|(category, &amount)| {
            let previous_amount = previous_amounts.get(category).copied().unwrap_or(0.0);
            CategoryBreakdown {
                category: category.to_string(),
                amount,
                percentage: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
                trend_pct: trend_pct(amount, previous_amount),
                previous_amount,
                subscription_count: subscriptions.get(category).map_or(0, |ids| ids.len()),
            }
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    breakdown
}

pub fn total(records: &[SpendingRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}
