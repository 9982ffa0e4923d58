//! Insight generator - ranked observations about spending
//!
//! A set of rule-based analyzers each look at the same snapshot and emit
//! zero or more [`Insight`]s. The generator merges them and orders the
//! result by impact.
//!
//! ## Built-in analyzers
//!
//! - **Duplicates** - subscriptions sharing a name
//! - **Unused** - subscriptions with no recent payment
//! - **Trend** - large year-over-year change in monthly spend
//! - **Optimization** - annual billing savings and price increases
//! - **Budget** - categories at or near their ceiling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use outlay_core::insights::{AnalysisContext, InsightGenerator};
//!
//! let generator = InsightGenerator::new();
//! let insights = generator.analyze_all(&ctx).await;
//! ```

pub mod budget_alerts;
pub mod duplicates;
pub mod engine;
pub mod optimization;
pub mod trend;
pub mod types;
pub mod unused;

pub use budget_alerts::BudgetAnalyzer;
pub use duplicates::DuplicateDetector;
pub use engine::{AnalysisContext, Analyzer, InsightGenerator};
pub use optimization::OptimizationAnalyzer;
pub use trend::TrendAnalyzer;
pub use types::{AnalyzerKind, Impact, Insight, InsightType};
pub use unused::UnusedDetector;
