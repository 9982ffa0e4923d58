//! Budget evaluation
//!
//! Compares category spend against user ceilings. Tiers:
//! - under:   < 75%
//! - warning: 75% to < 90%
//! - over:    90% to < 100%
//! - danger:  ≥ 100%

use chrono::{Datelike, NaiveDate};

use crate::aggregate::trend_pct;
use crate::models::{BudgetStatus, BudgetSummary, BudgetTier, CategoryBreakdown, UserBudget};
use crate::period::days_in_month;

/// Spent as a percentage of budgeted
///
/// A zero ceiling reads 0% while nothing is spent and 100% once anything is.
pub fn spent_percentage(spent: f64, budgeted: f64) -> f64 {
    if budgeted > 0.0 {
        spent / budgeted * 100.0
    } else if spent > 0.0 {
        100.0
    } else {
        0.0
    }
}

fn spent_in(breakdown: &[CategoryBreakdown], category: &str) -> f64 {
    breakdown
        .iter()
        .filter(|c| c.category.eq_ignore_ascii_case(category))
        .map(|c| c.amount)
        .sum()
}

/// Evaluate every budget against the period's breakdown
///
/// `previous` is the breakdown of the equivalent prior period, or None when
/// there is no such period. Results are ordered most at-risk first.
pub fn evaluate(
    budgets: &[UserBudget],
    current: &[CategoryBreakdown],
    previous: Option<&[CategoryBreakdown]>,
) -> Vec<BudgetStatus> {
    let mut statuses: Vec<BudgetStatus> = budgets
        .iter()
        .map(|budget| {
            let spent = spent_in(current, &budget.category);
            let previous_spent = previous.map(|p| spent_in(p, &budget.category));

            let budgeted = match previous_spent {
                Some(prev) if budget.rollover => budget.amount + (budget.amount - prev).max(0.0),
                _ => budget.amount,
            };

            let percentage = spent_percentage(spent, budgeted);
            BudgetStatus {
                category: budget.category.clone(),
                budgeted,
                spent,
                remaining: budgeted - spent,
                percentage,
                status: BudgetTier::from_percentage(percentage),
                trend_pct: trend_pct(spent, previous_spent.unwrap_or(0.0)),
            }
        })
        .collect();

    statuses.sort_by(|a, b| {
        b.status.cmp(&a.status).then_with(|| {
            b.percentage
                .partial_cmp(&a.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    statuses
}

/// Aggregate statuses with a month-end projection as of `today`
///
/// `statuses` covers the requested period and drives the totals and the
/// as-of-today status. `month` covers the calendar month containing
/// `today` and drives the daily rates and the projection, so a quarter or
/// year of spend is never divided by the day of the month.
///
/// Returns None when there are no budgets.
pub fn summarize(
    statuses: &[BudgetStatus],
    month: &[BudgetStatus],
    today: NaiveDate,
) -> Option<BudgetSummary> {
    if statuses.is_empty() {
        return None;
    }

    let total_budgeted: f64 = statuses.iter().map(|s| s.budgeted).sum();
    let total_spent: f64 = statuses.iter().map(|s| s.spent).sum();
    let month_budgeted: f64 = month.iter().map(|s| s.budgeted).sum();
    let month_spent: f64 = month.iter().map(|s| s.spent).sum();

    let days_in_month = days_in_month(today);
    let day_of_month = today.day();

    let daily_budget = month_budgeted / days_in_month as f64;
    let daily_average = month_spent / day_of_month as f64;
    let projected_total = daily_average * days_in_month as f64;

    let percentage = spent_percentage(total_spent, total_budgeted);
    let projected_percentage = spent_percentage(projected_total, month_budgeted);

    Some(BudgetSummary {
        total_budgeted,
        total_spent,
        remaining: total_budgeted - total_spent,
        percentage,
        status: BudgetTier::from_percentage(percentage),
        days_in_month,
        day_of_month,
        days_remaining: days_in_month.saturating_sub(day_of_month),
        daily_budget,
        daily_average,
        projected_total,
        projected_percentage,
        projected_status: BudgetTier::from_percentage(projected_percentage),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(category: &str, amount: f64, rollover: bool) -> UserBudget {
        UserBudget {
            category: category.to_string(),
            amount,
            rollover,
        }
    }

    fn spend(category: &str, amount: f64) -> CategoryBreakdown {
        CategoryBreakdown {
            category: category.to_string(),
            amount,
            percentage: 0.0,
            trend_pct: 0.0,
            previous_amount: 0.0,
            subscription_count: 1,
        }
    }

    #[test]
    fn test_status_boundaries() {
        let budgets = vec![
            budget("A", 1000.0, false),
            budget("B", 1000.0, false),
            budget("C", 1000.0, false),
            budget("D", 1000.0, false),
        ];
        let current = vec![
            spend("A", 749.0),
            spend("B", 750.0),
            spend("C", 900.0),
            spend("D", 1000.0),
        ];

        let statuses = evaluate(&budgets, &current, None);
        let tier = |c: &str| statuses.iter().find(|s| s.category == c).unwrap().status;

        assert_eq!(tier("A"), BudgetTier::Under);
        assert_eq!(tier("B"), BudgetTier::Warning);
        assert_eq!(tier("C"), BudgetTier::Over);
        assert_eq!(tier("D"), BudgetTier::Danger);
        assert_eq!(statuses[0].category, "D");
    }

    #[test]
    fn test_remaining_goes_negative_when_over() {
        let statuses = evaluate(&[budget("Streaming", 40.0, false)], &[spend("streaming", 55.0)], None);
        assert_eq!(statuses[0].spent, 55.0);
        assert_eq!(statuses[0].remaining, -15.0);
        assert_eq!(statuses[0].status, BudgetTier::Danger);
    }

    #[test]
    fn test_trend_vs_previous_period() {
        let previous = vec![spend("Streaming", 40.0)];
        let statuses = evaluate(
            &[budget("Streaming", 100.0, false), budget("Music", 20.0, false)],
            &[spend("Streaming", 50.0), spend("Music", 10.0)],
            Some(&previous),
        );

        let streaming = statuses.iter().find(|s| s.category == "Streaming").unwrap();
        assert_eq!(streaming.trend_pct, 25.0);
        let music = statuses.iter().find(|s| s.category == "Music").unwrap();
        assert_eq!(music.trend_pct, 0.0);
    }

    #[test]
    fn test_rollover_adds_unspent_remainder() {
        let previous = vec![spend("Streaming", 30.0)];
        let statuses = evaluate(
            &[budget("Streaming", 50.0, true)],
            &[spend("Streaming", 60.0)],
            Some(&previous),
        );
        assert_eq!(statuses[0].budgeted, 70.0);

        // Overspending last period never shrinks the ceiling
        let previous = vec![spend("Streaming", 80.0)];
        let statuses = evaluate(&[budget("Streaming", 50.0, true)], &[], Some(&previous));
        assert_eq!(statuses[0].budgeted, 50.0);
    }

    #[test]
    fn test_zero_ceiling() {
        assert_eq!(spent_percentage(0.0, 0.0), 0.0);
        assert_eq!(spent_percentage(5.0, 0.0), 100.0);
    }

    #[test]
    fn test_summary_projection() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let statuses = evaluate(
            &[budget("Streaming", 60.0, false), budget("Music", 30.0, false)],
            &[spend("Streaming", 20.0), spend("Music", 10.0)],
            None,
        );

        let summary = summarize(&statuses, &statuses, today).unwrap();
        assert_eq!(summary.total_budgeted, 90.0);
        assert_eq!(summary.total_spent, 30.0);
        assert_eq!(summary.days_in_month, 30);
        assert_eq!(summary.day_of_month, 10);
        assert_eq!(summary.days_remaining, 20);
        assert_eq!(summary.daily_budget, 3.0);
        assert_eq!(summary.daily_average, 3.0);
        assert_eq!(summary.projected_total, 90.0);

        // A third spent today, but on pace to hit the ceiling
        assert_eq!(summary.status, BudgetTier::Under);
        assert_eq!(summary.projected_status, BudgetTier::Danger);
    }

    #[test]
    fn test_summary_without_budgets() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert!(summarize(&[], &[], today).is_none());
    }

    #[test]
    fn test_summary_projects_from_current_month_only() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let budgets = [budget("Streaming", 60.0, false)];
        let year = evaluate(&budgets, &[spend("Streaming", 720.0)], None);
        let month = evaluate(&budgets, &[spend("Streaming", 6.0)], None);

        let summary = summarize(&year, &month, today).unwrap();
        assert_eq!(summary.total_spent, 720.0);
        assert_eq!(summary.status, BudgetTier::Danger);

        // 6 spent in 3 days: 2/day against a 2/day budget
        assert_eq!(summary.daily_average, 2.0);
        assert_eq!(summary.daily_budget, 2.0);
        assert_eq!(summary.projected_total, 60.0);
        assert_eq!(summary.projected_status, BudgetTier::Danger);

        let month = evaluate(&budgets, &[spend("Streaming", 3.0)], None);
        let summary = summarize(&year, &month, today).unwrap();
        assert_eq!(summary.projected_total, 30.0);
        assert_eq!(summary.projected_status, BudgetTier::Under);
    }
}
