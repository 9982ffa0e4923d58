//! Duplicate subscription detector
//!
//! Active subscriptions with the same name are treated as paying twice for
//! one service. The saving is what remains after keeping only the cheapest.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::models::Subscription;
use crate::Result;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{AnalyzerKind, Impact, Insight, InsightType};

pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Savings from keeping one unit of the cheapest price
pub fn duplicate_savings(amounts: &[f64]) -> f64 {
    if amounts.len() < 2 {
        return 0.0;
    }
    let cheapest = amounts.iter().copied().fold(f64::INFINITY, f64::min);
    cheapest * (amounts.len() - 1) as f64
}

#[async_trait]
impl Analyzer for DuplicateDetector {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Duplicates
    }

    fn name(&self) -> &'static str {
        "Duplicate Subscriptions"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let mut groups: BTreeMap<&str, Vec<&Subscription>> = BTreeMap::new();
        for sub in ctx.active_subscriptions() {
            groups.entry(sub.name.as_str()).or_default().push(sub);
        }

        let insights = groups
            .into_iter()
            .filter(|(_, subs)| subs.len() > 1)
            .map(|(name, subs)| {
                let amounts: Vec<f64> = subs.iter().map(|s| s.amount).collect();
                let savings = duplicate_savings(&amounts);

                let mut insight = Insight::new(
                    format!("duplicate:{}", name.to_lowercase()),
                    InsightType::Savings,
                    Impact::High,
                    format!("Duplicate {} subscriptions", name),
                    format!(
                        "You have {} active subscriptions named {}. Keeping only the cheapest saves ${:.2} per billing period.",
                        subs.len(),
                        name,
                        savings
                    ),
                )
                .with_value(savings)
                .with_action(format!("Cancel the extra {} subscriptions", name));

                if let Some(first) = subs.first() {
                    insight = insight.with_category(first.category.clone());
                }
                insight
            })
            .collect();

        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::test_utils::subscription;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    async fn run(subs: &[Subscription]) -> Vec<Insight> {
        let payments = HashMap::new();
        let config = InsightConfig::default();
        let ctx = AnalysisContext {
            today: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            subscriptions: subs,
            payments: &payments,
            monthly: &[],
            budgets: &[],
            config: &config,
        };
        DuplicateDetector::new().analyze(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_two_netflix_saves_cheaper_price() {
        let subs = vec![
            subscription("n1", "Netflix", "Streaming", 15.0),
            subscription("n2", "Netflix", "Streaming", 18.0),
            subscription("s1", "Spotify", "Music", 10.0),
        ];

        let insights = run(&subs).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "duplicate:netflix");
        assert_eq!(insights[0].value, Some(15.0));
        assert_eq!(insights[0].insight_type, InsightType::Savings);
        assert_eq!(insights[0].impact, Impact::High);
    }

    #[tokio::test]
    async fn test_name_match_is_exact() {
        let subs = vec![
            subscription("n1", "Netflix", "Streaming", 15.0),
            subscription("n2", "netflix", "Streaming", 18.0),
        ];
        assert!(run(&subs).await.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_subscriptions_ignored() {
        let mut cancelled = subscription("n2", "Netflix", "Streaming", 18.0);
        cancelled.is_active = false;
        let subs = vec![subscription("n1", "Netflix", "Streaming", 15.0), cancelled.clone()];
        assert!(run(&subs).await.is_empty());

        // A cancelled pair costs nothing either
        let mut also_cancelled = subscription("n1", "Netflix", "Streaming", 15.0);
        also_cancelled.is_active = false;
        assert!(run(&[also_cancelled, cancelled]).await.is_empty());
    }

    #[test]
    fn test_duplicate_savings_three_copies() {
        assert_eq!(duplicate_savings(&[9.0, 12.0, 10.0]), 18.0);
        assert_eq!(duplicate_savings(&[9.0]), 0.0);
    }
}
