//! Insight generator - runs analyzers and ranks their output

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;

use crate::config::InsightConfig;
use crate::models::{BudgetStatus, MonthlyBucket, PaymentRecord, Subscription};
use crate::Result;

use super::types::{AnalyzerKind, Insight};
use super::{
    BudgetAnalyzer, DuplicateDetector, OptimizationAnalyzer, TrendAnalyzer, UnusedDetector,
};

/// Snapshot handed to every analyzer
pub struct AnalysisContext<'a> {
    /// Reference date for "days since" style rules
    pub today: NaiveDate,
    pub subscriptions: &'a [Subscription],
    /// Completed payments per subscription id, oldest first
    pub payments: &'a HashMap<String, Vec<PaymentRecord>>,
    /// The last twelve complete months, oldest first
    pub monthly: &'a [MonthlyBucket],
    /// Budget statuses for the current month
    pub budgets: &'a [BudgetStatus],
    pub config: &'a InsightConfig,
}

impl<'a> AnalysisContext<'a> {
    /// Completed payments for one subscription
    pub fn payments_for(&self, subscription_id: &str) -> &'a [PaymentRecord] {
        self.payments
            .get(subscription_id)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    pub fn active_subscriptions(&self) -> impl Iterator<Item = &'a Subscription> {
        self.subscriptions.iter().filter(|s| s.is_active)
    }
}

/// Trait for insight analyzers
///
/// Analyzers are side-effect free given their context.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalyzerKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    async fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>>;
}

/// Runs every registered analyzer and merges the results
pub struct InsightGenerator {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightGenerator {
    /// Create a generator with the built-in analyzers
    pub fn new() -> Self {
        let mut generator = Self { analyzers: vec![] };

        generator.register(Box::new(DuplicateDetector::new()));
        generator.register(Box::new(UnusedDetector::new()));
        generator.register(Box::new(TrendAnalyzer::new()));
        generator.register(Box::new(OptimizationAnalyzer::new()));
        generator.register(Box::new(BudgetAnalyzer::new()));

        generator
    }

    /// Create a generator with no analyzers registered
    pub fn empty() -> Self {
        Self { analyzers: vec![] }
    }

    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    /// Run all analyzers concurrently and rank the merged findings
    ///
    /// Findings keep registration order among equal impact. A failing
    /// analyzer is logged and skipped.
    pub async fn analyze_all(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let results = join_all(self.analyzers.iter().map(|a| a.analyze(ctx))).await;

        let mut all_insights = vec![];
        for (analyzer, result) in self.analyzers.iter().zip(results) {
            match result {
                Ok(insights) => {
                    tracing::debug!(
                        analyzer = analyzer.kind().as_str(),
                        count = insights.len(),
                        "Insight analysis complete"
                    );
                    all_insights.extend(insights);
                }
                Err(e) => {
                    tracing::warn!(
                        analyzer = analyzer.kind().as_str(),
                        error = %e,
                        "Insight analysis failed"
                    );
                }
            }
        }

        // Stable: equal weights keep emission order
        all_insights.sort_by(|a, b| b.impact.weight().cmp(&a.impact.weight()));

        all_insights
    }

    pub fn analyzer_kinds(&self) -> Vec<AnalyzerKind> {
        self.analyzers.iter().map(|a| a.kind()).collect()
    }
}
