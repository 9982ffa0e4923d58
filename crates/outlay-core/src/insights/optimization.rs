//! Optimization opportunities
//!
//! Two kinds of findings:
//! - monthly subscriptions that would be cheaper billed annually
//! - subscriptions whose latest charge went up noticeably

use async_trait::async_trait;

use crate::models::BillingCycle;
use crate::reports::latest_price_change;
use crate::Result;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{AnalyzerKind, Impact, Insight, InsightType};

/// Annual saving above which the switch becomes medium impact
const MEDIUM_IMPACT_SAVING: f64 = 50.0;

pub struct OptimizationAnalyzer;

impl OptimizationAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OptimizationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationAnalyzer {
    fn annual_billing(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        ctx.active_subscriptions()
            .filter(|s| s.billing_cycle == BillingCycle::Monthly)
            .filter_map(|sub| {
                let saving = sub.amount * 12.0 * ctx.config.annual_discount;
                if saving <= ctx.config.annual_savings_floor {
                    return None;
                }

                let impact = if saving > MEDIUM_IMPACT_SAVING {
                    Impact::Medium
                } else {
                    Impact::Low
                };

                Some(
                    Insight::new(
                        format!("annual:{}", sub.id),
                        InsightType::Opportunity,
                        impact,
                        format!("Switch {} to annual billing", sub.name),
                        format!(
                            "Paying ${:.2} monthly for {}. Annual plans are typically {:.0}% cheaper, about ${:.2} a year.",
                            sub.amount,
                            sub.name,
                            ctx.config.annual_discount * 100.0,
                            saving
                        ),
                    )
                    .with_value(saving)
                    .with_action("Check whether an annual plan is offered")
                    .with_category(sub.category.clone())
                    .with_subscription(sub.id.clone()),
                )
            })
            .collect()
    }

    fn price_increases(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        ctx.active_subscriptions()
            .filter_map(|sub| {
                let change = latest_price_change(ctx.payments_for(&sub.id))?;
                let increase = change.new_amount - change.old_amount;

                if increase <= ctx.config.price_increase_absolute
                    || change.change_pct <= ctx.config.price_increase_percent
                {
                    return None;
                }

                tracing::debug!(
                    subscription = %sub.id,
                    old = change.old_amount,
                    new = change.new_amount,
                    "Price increase detected"
                );

                Some(
                    Insight::new(
                        format!("price:{}", sub.id),
                        InsightType::Warning,
                        Impact::Medium,
                        format!("{} raised its price", sub.name),
                        format!(
                            "{} went from ${:.2} to ${:.2} (+{:.1}%) on {}.",
                            sub.name,
                            change.old_amount,
                            change.new_amount,
                            change.change_pct,
                            change.date
                        ),
                    )
                    .with_value(increase * 12.0)
                    .with_action("Look for a cheaper plan or alternative")
                    .with_category(sub.category.clone())
                    .with_subscription(sub.id.clone()),
                )
            })
            .collect()
    }
}

#[async_trait]
impl Analyzer for OptimizationAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Optimization
    }

    fn name(&self) -> &'static str {
        "Optimization"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let mut insights = self.annual_billing(ctx);
        insights.extend(self.price_increases(ctx));
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::models::{PaymentRecord, Subscription};
    use crate::test_utils::{completed_payment, subscription};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn run(
        subs: &[Subscription],
        payments: &HashMap<String, Vec<PaymentRecord>>,
    ) -> Vec<Insight> {
        let config = InsightConfig::default();
        let ctx = AnalysisContext {
            today: date(2025, 6, 15),
            subscriptions: subs,
            payments,
            monthly: &[],
            budgets: &[],
            config: &config,
        };
        OptimizationAnalyzer::new().analyze(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_annual_switch_above_floor() {
        // 15.99 * 12 * 0.15 = 28.78
        let subs = vec![
            subscription("netflix", "Netflix", "Streaming", 15.99),
            subscription("icloud", "iCloud", "Storage", 2.99),
        ];

        let insights = run(&subs, &HashMap::new()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "annual:netflix");
        assert_eq!(insights[0].impact, Impact::Low);
        assert!((insights[0].value.unwrap() - 28.782).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_large_annual_saving_is_medium() {
        let subs = vec![subscription("adobe", "Adobe", "Software", 54.99)];
        let insights = run(&subs, &HashMap::new()).await;
        assert_eq!(insights[0].impact, Impact::Medium);
    }

    #[tokio::test]
    async fn test_non_monthly_skipped_for_annual_switch() {
        let mut sub = subscription("adobe", "Adobe", "Software", 54.99);
        sub.billing_cycle = BillingCycle::Quarterly;
        assert!(run(&[sub], &HashMap::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_price_increase_needs_both_thresholds() {
        let subs = vec![
            subscription("a", "Music", "Music", 5.0),
            subscription("b", "News", "News", 5.0),
            subscription("c", "Video", "Streaming", 5.0),
        ];
        let mut payments = HashMap::new();
        // +$2.00, +20%: flagged
        payments.insert(
            "a".to_string(),
            vec![
                completed_payment("a1", date(2025, 4, 1), 10.0),
                completed_payment("a2", date(2025, 5, 1), 12.0),
            ],
        );
        // +$0.50, +10%: absolute too small
        payments.insert(
            "b".to_string(),
            vec![
                completed_payment("b1", date(2025, 4, 1), 5.0),
                completed_payment("b2", date(2025, 5, 1), 5.5),
            ],
        );
        // +$2.00, +2%: percentage too small
        payments.insert(
            "c".to_string(),
            vec![
                completed_payment("c1", date(2025, 4, 1), 100.0),
                completed_payment("c2", date(2025, 5, 1), 102.0),
            ],
        );

        let insights = run(&subs, &payments).await;
        let prices: Vec<_> = insights
            .iter()
            .filter(|i| i.id.starts_with("price:"))
            .collect();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].id, "price:a");
        assert_eq!(prices[0].impact, Impact::Medium);
        assert_eq!(prices[0].value, Some(24.0));
    }

    #[tokio::test]
    async fn test_price_drop_is_not_reported() {
        let subs = vec![subscription("a", "Music", "Music", 5.0)];
        let mut payments = HashMap::new();
        payments.insert(
            "a".to_string(),
            vec![
                completed_payment("a1", date(2025, 4, 1), 12.0),
                completed_payment("a2", date(2025, 5, 1), 10.0),
            ],
        );
        assert!(run(&subs, &payments).await.is_empty());
    }
}
