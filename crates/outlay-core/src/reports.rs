//! Per-subscription, period-comparison, and yearly reports
//!
//! Pure functions over already-loaded records; the service handles
//! fetching and caching.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::aggregate::{filter_range, monthly_window, total, trend_pct};
use crate::models::{
    CategoryChange, ComparisonData, MonthlyAmount, PaymentRecord, PeriodTotals, PriceChange,
    SpendingRecord, Subscription, SubscriptionAnalytics, YearlyData,
};
use crate::period::PeriodComparison;

/// Months of history shown per subscription
const HISTORY_MONTHS: usize = 12;

/// Every change in charged amount between consecutive payments
///
/// `payments` must be oldest first.
pub fn price_changes(payments: &[PaymentRecord]) -> Vec<PriceChange> {
    payments
        .windows(2)
        .filter(|pair| pair[0].amount != pair[1].amount)
        .map(|pair| PriceChange {
            date: pair[1].date,
            old_amount: pair[0].amount,
            new_amount: pair[1].amount,
            change_pct: trend_pct(pair[1].amount, pair[0].amount),
        })
        .collect()
}

/// Change between the two most recent payments, if the amount moved
pub fn latest_price_change(payments: &[PaymentRecord]) -> Option<PriceChange> {
    let [.., previous, latest] = payments else {
        return None;
    };
    price_changes(&[previous.clone(), latest.clone()]).pop()
}

/// Lifetime report for one subscription
///
/// `all_records` is every spending record, used for the share of total spend.
pub fn subscription_analytics(
    sub: &Subscription,
    payments: &[PaymentRecord],
    all_records: &[SpendingRecord],
    today: NaiveDate,
) -> SubscriptionAnalytics {
    let total_spent: f64 = payments.iter().map(|p| p.amount).sum();
    let payment_count = payments.len();
    let overall = total(all_records);

    let own: Vec<SpendingRecord> = all_records
        .iter()
        .filter(|r| r.subscription_id.as_deref() == Some(sub.id.as_str()))
        .cloned()
        .collect();
    let monthly_history = monthly_window(&own, today, HISTORY_MONTHS)
        .into_iter()
        .map(|b| MonthlyAmount {
            month: b.month,
            amount: b.total,
        })
        .collect();

    let monthly_cost = sub.monthly_cost();

    SubscriptionAnalytics {
        subscription_id: sub.id.clone(),
        name: sub.name.clone(),
        category: sub.category.clone(),
        billing_cycle: sub.billing_cycle,
        total_spent,
        payment_count,
        average_payment: if payment_count > 0 {
            total_spent / payment_count as f64
        } else {
            0.0
        },
        first_payment: payments.first().map(|p| p.date),
        last_payment: payments.last().map(|p| p.date),
        monthly_cost,
        annual_cost: monthly_cost * 12.0,
        share_of_spending: if overall > 0.0 {
            total_spent / overall * 100.0
        } else {
            0.0
        },
        price_changes: price_changes(payments),
        monthly_history,
    }
}

fn period_totals(records: &[SpendingRecord], from: NaiveDate, to: NaiveDate) -> PeriodTotals {
    PeriodTotals {
        from,
        to,
        total: total(records),
        count: records.len(),
    }
}

fn totals_by_category(records: &[SpendingRecord]) -> HashMap<&str, f64> {
    let mut totals = HashMap::new();
    for record in records {
        *totals.entry(record.category.as_str()).or_insert(0.0) += record.amount;
    }
    totals
}

/// Compare the last N months against the N months before them
pub fn comparison_data(
    records: &[SpendingRecord],
    comparison: PeriodComparison,
    today: NaiveDate,
) -> ComparisonData {
    let ((cur_from, cur_to), (prev_from, prev_to)) = comparison.windows(today);
    let current = filter_range(records, cur_from, cur_to);
    let previous = filter_range(records, prev_from, prev_to);

    let current_by_category = totals_by_category(&current);
    let previous_by_category = totals_by_category(&previous);

    let names: BTreeSet<&str> = current_by_category
        .keys()
        .chain(previous_by_category.keys())
        .copied()
        .collect();

    let mut categories: Vec<CategoryChange> = names
        .into_iter()
        .map(|name| {
            let cur = current_by_category.get(name).copied().unwrap_or(0.0);
            let prev = previous_by_category.get(name).copied().unwrap_or(0.0);
            CategoryChange {
                category: name.to_string(),
                current: cur,
                previous: prev,
                change_pct: trend_pct(cur, prev),
            }
        })
        .collect();
    categories.sort_by(|a, b| {
        b.current
            .partial_cmp(&a.current)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let current = period_totals(&current, cur_from, cur_to);
    let previous = period_totals(&previous, prev_from, prev_to);

    ComparisonData {
        comparison: comparison.as_str().to_string(),
        change_amount: current.total - previous.total,
        change_pct: trend_pct(current.total, previous.total),
        current,
        previous,
        categories,
    }
}

#[derive(Default)]
struct YearAccumulator<'a> {
    total: f64,
    payments: usize,
    subscriptions: BTreeSet<&'a str>,
    categories: HashMap<&'a str, f64>,
}

/// Per-calendar-year totals, oldest year first
pub fn yearly_data(records: &[SpendingRecord], today: NaiveDate) -> Vec<YearlyData> {
    let mut years: BTreeMap<i32, YearAccumulator<'_>> = BTreeMap::new();
    for record in records {
        let acc = years.entry(record.date.year()).or_default();
        acc.total += record.amount;
        acc.payments += 1;
        if let Some(id) = &record.subscription_id {
            acc.subscriptions.insert(id.as_str());
        }
        *acc.categories.entry(record.category.as_str()).or_insert(0.0) += record.amount;
    }

    let mut previous_total: Option<f64> = None;
    years
        .into_iter()
        .map(|(year, acc)| {
            let months = if year == today.year() {
                today.month() as f64
            } else {
                12.0
            };
            let top_category = acc
                .categories
                .iter()
                .max_by(|a, b| {
                    a.1.partial_cmp(b.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.0.cmp(a.0))
                })
                .map(|(name, _)| name.to_string());

            let data = YearlyData {
                year,
                total: acc.total,
                monthly_average: acc.total / months,
                payment_count: acc.payments,
                subscription_count: acc.subscriptions.len(),
                change_pct: previous_total.map_or(0.0, |prev| trend_pct(acc.total, prev)),
                top_category,
            };
            previous_total = Some(acc.total);
            data
        })
        .collect()
}
