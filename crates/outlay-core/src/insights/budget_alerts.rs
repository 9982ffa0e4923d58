//! Budget alerts for categories near or past their ceiling

use async_trait::async_trait;

use crate::models::BudgetTier;
use crate::Result;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{AnalyzerKind, Impact, Insight, InsightType};

pub struct BudgetAnalyzer;

impl BudgetAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BudgetAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for BudgetAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Budget
    }

    fn name(&self) -> &'static str {
        "Budget Alerts"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let insights = ctx
            .budgets
            .iter()
            .filter_map(|status| {
                let id = format!("budget:{}", status.category.to_lowercase());
                match status.status {
                    BudgetTier::Danger => Some(
                        Insight::new(
                            id,
                            InsightType::Warning,
                            Impact::High,
                            format!("{} budget exceeded", status.category),
                            format!(
                                "Spent ${:.2} of ${:.2} ({:.0}%) on {}.",
                                status.spent, status.budgeted, status.percentage, status.category
                            ),
                        )
                        .with_value(status.spent - status.budgeted)
                        .with_action("Reduce spending or raise the budget")
                        .with_category(status.category.clone()),
                    ),
                    BudgetTier::Over => Some(
                        Insight::new(
                            id,
                            InsightType::Warning,
                            Impact::High,
                            format!("{} budget nearly used up", status.category),
                            format!(
                                "Spent ${:.2} of ${:.2} ({:.0}%) on {}, ${:.2} left.",
                                status.spent,
                                status.budgeted,
                                status.percentage,
                                status.category,
                                status.remaining
                            ),
                        )
                        .with_value(status.remaining.max(0.0))
                        .with_action("Hold off on new spending in this category")
                        .with_category(status.category.clone()),
                    ),
                    BudgetTier::Warning => Some(
                        Insight::new(
                            id,
                            InsightType::Info,
                            Impact::Low,
                            format!("{} budget almost used", status.category),
                            format!(
                                "{:.0}% of the {} budget is spent, ${:.2} left.",
                                status.percentage, status.category, status.remaining
                            ),
                        )
                        .with_value(status.remaining)
                        .with_category(status.category.clone()),
                    ),
                    BudgetTier::Under => None,
                }
            })
            .collect();

        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::evaluate;
    use crate::config::InsightConfig;
    use crate::models::{BudgetStatus, CategoryBreakdown, UserBudget};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn statuses() -> Vec<BudgetStatus> {
        let budgets: Vec<UserBudget> = [
            ("Streaming", 50.0),
            ("Music", 20.0),
            ("News", 100.0),
            ("Games", 100.0),
        ]
        .iter()
        .map(|(c, a)| UserBudget {
            category: c.to_string(),
            amount: *a,
            rollover: false,
        })
        .collect();
        let spend: Vec<CategoryBreakdown> = [
            ("Streaming", 55.0),
            ("Music", 16.0),
            ("News", 10.0),
            ("Games", 92.0),
        ]
        .iter()
        .map(|(c, a)| CategoryBreakdown {
            category: c.to_string(),
            amount: *a,
            percentage: 0.0,
            trend_pct: 0.0,
            previous_amount: 0.0,
            subscription_count: 1,
        })
        .collect();
        evaluate(&budgets, &spend, None)
    }

    #[tokio::test]
    async fn test_alerts_by_tier() {
        let budgets = statuses();
        let payments = HashMap::new();
        let config = InsightConfig::default();
        let ctx = AnalysisContext {
            today: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            subscriptions: &[],
            payments: &payments,
            monthly: &[],
            budgets: &budgets,
            config: &config,
        };

        let insights = BudgetAnalyzer::new().analyze(&ctx).await.unwrap();
        assert_eq!(insights.len(), 3);

        let streaming = insights.iter().find(|i| i.id == "budget:streaming").unwrap();
        assert_eq!(streaming.insight_type, InsightType::Warning);
        assert_eq!(streaming.impact, Impact::High);
        assert_eq!(streaming.value, Some(5.0));

        let music = insights.iter().find(|i| i.id == "budget:music").unwrap();
        assert_eq!(music.insight_type, InsightType::Info);
        assert_eq!(music.impact, Impact::Low);
    }

    #[tokio::test]
    async fn test_over_tier_is_not_reported_as_exceeded() {
        let budgets = statuses();
        let payments = HashMap::new();
        let config = InsightConfig::default();
        let ctx = AnalysisContext {
            today: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            subscriptions: &[],
            payments: &payments,
            monthly: &[],
            budgets: &budgets,
            config: &config,
        };

        let insights = BudgetAnalyzer::new().analyze(&ctx).await.unwrap();
        let games = insights.iter().find(|i| i.id == "budget:games").unwrap();
        assert_eq!(games.title, "Games budget nearly used up");
        assert_eq!(games.impact, Impact::High);
        assert_eq!(games.value, Some(8.0));

        let streaming = insights.iter().find(|i| i.id == "budget:streaming").unwrap();
        assert_eq!(streaming.title, "Streaming budget exceeded");
    }
}
