//! Yearly spending trend
//!
//! Compares the oldest and newest of the trailing monthly buckets and
//! reports when the change is large.

use async_trait::async_trait;

use crate::aggregate::trend_pct;
use crate::Result;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{AnalyzerKind, Impact, Insight, InsightType};

const HIGH_IMPACT_PCT: f64 = 50.0;

pub struct TrendAnalyzer;

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for TrendAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Trend
    }

    fn name(&self) -> &'static str {
        "Spending Trend"
    }

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let actual: Vec<_> = ctx.monthly.iter().filter(|b| !b.is_forecast).collect();
        let (Some(first), Some(last)) = (actual.first(), actual.last()) else {
            return Ok(vec![]);
        };
        if actual.len() < 2 {
            return Ok(vec![]);
        }

        let change = trend_pct(last.total, first.total);
        if change.abs() <= ctx.config.trend_threshold_pct {
            return Ok(vec![]);
        }

        let impact = if change.abs() > HIGH_IMPACT_PCT {
            Impact::High
        } else {
            Impact::Medium
        };
        let direction = if change > 0.0 { "up" } else { "down" };

        Ok(vec![Insight::new(
            "trend:yearly",
            InsightType::Trend,
            impact,
            format!("Spending is {} {:.0}% this year", direction, change.abs()),
            format!(
                "Monthly spending went from ${:.2} in {} to ${:.2} in {}.",
                first.total, first.month, last.total, last.month
            ),
        )
        .with_value(last.total - first.total)])
    }
}
