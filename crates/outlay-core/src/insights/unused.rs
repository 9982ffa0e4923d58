//! Unused subscription detector
//!
//! A subscription is considered unused when nothing has been paid for it
//! in longer than the configured window. Subscriptions billed less often
//! than the window get one full billing interval of grace.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{PaymentRecord, Subscription};
use crate::Result;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{AnalyzerKind, Impact, Insight, InsightType};

/// Annual value at which an unused subscription becomes high impact
const HIGH_IMPACT_ANNUAL: f64 = 100.0;

pub struct UnusedDetector;

impl UnusedDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnusedDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Most recent sign of activity for a subscription
pub fn last_activity(sub: &Subscription, payments: &[PaymentRecord]) -> NaiveDate {
    let newest_payment = payments.iter().map(|p| p.date).max();
    match (sub.last_paid_date, newest_payment) {
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => sub.created_at,
    }
}

#[async_trait]
impl Analyzer for UnusedDetector {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Unused
    }

    fn name(&self) -> &'static str {
        "Unused Subscriptions"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let mut insights = Vec::new();

        for sub in ctx.active_subscriptions() {
            let last = last_activity(sub, ctx.payments_for(&sub.id));
            let idle_days = (ctx.today - last).num_days();
            let threshold = ctx.config.unused_days.max(sub.billing_cycle.interval_days());

            if idle_days <= threshold {
                continue;
            }

            let annual_value = sub.monthly_cost() * 12.0;
            let impact = if annual_value >= HIGH_IMPACT_ANNUAL {
                Impact::High
            } else {
                Impact::Medium
            };

            insights.push(
                Insight::new(
                    format!("unused:{}", sub.id),
                    InsightType::Warning,
                    impact,
                    format!("{} may be unused", sub.name),
                    format!(
                        "No payment for {} in {} days. Cancelling would save ${:.2} a year.",
                        sub.name, idle_days, annual_value
                    ),
                )
                .with_value(annual_value)
                .with_action("Review whether you still use this subscription")
                .with_category(sub.category.clone())
                .with_subscription(sub.id.clone()),
            );
        }

        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::models::BillingCycle;
    use crate::test_utils::{completed_payment, subscription};
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn run(
        subs: &[Subscription],
        payments: &HashMap<String, Vec<PaymentRecord>>,
        today: NaiveDate,
    ) -> Vec<Insight> {
        let config = InsightConfig::default();
        let ctx = AnalysisContext {
            today,
            subscriptions: subs,
            payments,
            monthly: &[],
            budgets: &[],
            config: &config,
        };
        UnusedDetector::new().analyze(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_flags_stale_monthly_subscription() {
        let subs = vec![subscription("gym", "Gym", "Fitness", 40.0)];
        let mut payments = HashMap::new();
        payments.insert(
            "gym".to_string(),
            vec![completed_payment("p1", date(2025, 4, 1), 40.0)],
        );

        let insights = run(&subs, &payments, date(2025, 6, 15)).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "unused:gym");
        assert_eq!(insights[0].value, Some(480.0));
        assert_eq!(insights[0].impact, Impact::High);
        assert_eq!(insights[0].subscription_id.as_deref(), Some("gym"));
    }

    #[tokio::test]
    async fn test_recent_payment_not_flagged() {
        let subs = vec![subscription("gym", "Gym", "Fitness", 40.0)];
        let mut payments = HashMap::new();
        payments.insert(
            "gym".to_string(),
            vec![completed_payment("p1", date(2025, 5, 16), 40.0)],
        );

        // Exactly 30 days idle is still within the window
        assert!(run(&subs, &payments, date(2025, 6, 15)).await.is_empty());
    }

    #[tokio::test]
    async fn test_last_paid_date_counts_as_activity() {
        let mut sub = subscription("gym", "Gym", "Fitness", 40.0);
        sub.last_paid_date = Some(date(2025, 6, 1));
        assert!(run(&[sub], &HashMap::new(), date(2025, 6, 15)).await.is_empty());
    }

    #[tokio::test]
    async fn test_yearly_billing_gets_full_interval() {
        let mut sub = subscription("domain", "Domain", "Web", 12.0);
        sub.billing_cycle = BillingCycle::Yearly;
        sub.last_paid_date = Some(date(2025, 1, 10));

        // Five months since the yearly charge is normal
        assert!(run(&[sub.clone()], &HashMap::new(), date(2025, 6, 15)).await.is_empty());

        let insights = run(&[sub], &HashMap::new(), date(2026, 2, 1)).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].impact, Impact::Medium);
        assert_eq!(insights[0].value, Some(12.0));
    }

    #[test]
    fn test_last_activity_falls_back_to_created_at() {
        let sub = subscription("x", "X", "Misc", 5.0);
        assert_eq!(last_activity(&sub, &[]), sub.created_at);
    }
}
