//! Core types for the insight generator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of observation an insight makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    /// Money that can be saved right away
    Savings,
    /// Something that needs attention
    Warning,
    /// Informational, no action needed
    Info,
    /// Change in spending over time
    Trend,
    /// Optional improvement worth considering
    Opportunity,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Savings => "savings",
            InsightType::Warning => "warning",
            InsightType::Info => "info",
            InsightType::Trend => "trend",
            InsightType::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "savings" => Ok(InsightType::Savings),
            "warning" => Ok(InsightType::Warning),
            "info" => Ok(InsightType::Info),
            "trend" => Ok(InsightType::Trend),
            "opportunity" => Ok(InsightType::Opportunity),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// How much an insight matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }

    /// Ranking weight (higher = shown first)
    pub fn weight(&self) -> u8 {
        match self {
            Impact::Low => 1,
            Impact::Medium => 2,
            Impact::High => 3,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The analyzers the generator knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    Duplicates,
    Unused,
    Trend,
    Optimization,
    Budget,
}

impl AnalyzerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerKind::Duplicates => "duplicates",
            AnalyzerKind::Unused => "unused",
            AnalyzerKind::Trend => "trend",
            AnalyzerKind::Optimization => "optimization",
            AnalyzerKind::Budget => "budget",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ranked, human-readable observation about spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Stable key (e.g., "duplicate:netflix")
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    /// Monetary value, when the insight has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub impact: Impact,
    /// Suggested next step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

impl Insight {
    pub fn new(
        id: impl Into<String>,
        insight_type: InsightType,
        impact: Impact,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            insight_type,
            title: title.into(),
            description: description.into(),
            value: None,
            impact,
            action: None,
            category: None,
            subscription_id: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subscription(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = Some(subscription_id.into());
        self
    }
}
