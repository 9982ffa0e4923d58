//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Session setup (snapshot + config loading) and shared parsing
//! - `import` - Payment CSV import into the snapshot file
//! - `insights` - Insights, forecasts, anomalies, and budgets
//! - `reports` - Spending, monthly, category, subscription, and yearly reports
//! - `watch` - Background refresh loop

pub mod core;
pub mod import;
pub mod insights;
pub mod reports;
pub mod watch;

// Re-export command functions for main.rs
pub use core::*;
pub use import::*;
pub use insights::*;
pub use reports::*;
pub use watch::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
