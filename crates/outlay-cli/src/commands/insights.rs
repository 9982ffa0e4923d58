//! Insight, forecast, anomaly, and budget commands

use anyhow::Result;
use outlay_core::{AnomalySeverity, BudgetTier, Impact, Period};

use super::{truncate, Session};

fn impact_icon(impact: Impact) -> &'static str {
    match impact {
        Impact::High => "🔴",
        Impact::Medium => "🟡",
        Impact::Low => "🔵",
    }
}

fn tier_icon(tier: BudgetTier) -> &'static str {
    match tier {
        BudgetTier::Under => "✅",
        BudgetTier::Warning => "⚠️ ",
        BudgetTier::Over => "🟠",
        BudgetTier::Danger => "🔴",
    }
}

pub async fn cmd_insights(session: &Session) -> Result<()> {
    let insights = session.service.insights().await;

    session.output(&insights, |insights| {
        println!();
        println!("💡 Insights");
        println!("   ─────────────────────────────────────────────────────────────");

        if insights.is_empty() {
            println!("   Nothing to report. Your subscriptions look healthy.");
            return;
        }

        for insight in insights {
            println!(
                "   {} [{}] {}",
                impact_icon(insight.impact),
                insight.insight_type,
                insight.title
            );
            println!("      {}", insight.description);
            if let Some(action) = &insight.action {
                println!("      → {}", action);
            }
        }

        let savings: f64 = insights.iter().filter_map(|i| i.value).filter(|v| *v > 0.0).sum();
        println!();
        println!("   {} insights, ${:.2} of value identified", insights.len(), savings);
    })
}

pub async fn cmd_predict(session: &Session, months: Option<usize>) -> Result<()> {
    let horizon = months.unwrap_or(session.service.config().forecast.default_horizon);
    let forecasts = session.service.predictions(horizon).await;

    session.output(&forecasts, |forecasts| {
        println!();
        println!("🔮 Spending Forecast");
        println!("   ─────────────────────────────────────────────────────────────");

        if forecasts.is_empty() {
            println!(
                "   Not enough history (need {} complete months).",
                session.service.config().forecast.min_months
            );
            return;
        }

        println!(
            "   {:8} │ {:>10} │ {:>21} │ {:>10}",
            "Month", "Predicted", "Range", "Confidence"
        );
        println!("   ─────────┼────────────┼───────────────────────┼────────────");
        for f in forecasts {
            println!(
                "   {:8} │ {:>10.2} │ {:>10.2} - {:<8.2} │ {:>9.0}%",
                f.period,
                f.predicted_amount,
                f.lower_bound,
                f.upper_bound,
                f.confidence * 100.0
            );
        }
    })
}

pub async fn cmd_anomalies(session: &Session, period: Option<Period>) -> Result<()> {
    let anomalies = session.service.anomalies(period).await;

    session.output(&anomalies, |anomalies| {
        println!();
        println!("🚨 Unusual Charges");
        println!("   ─────────────────────────────────────────────────────────────");

        if anomalies.is_empty() {
            println!("   No unusual charges found.");
            return;
        }

        for a in anomalies {
            let icon = match a.severity {
                AnomalySeverity::High => "🔴",
                AnomalySeverity::Medium => "🟡",
            };
            println!(
                "   {} {}  ${:.2} (expected ~${:.2}) {}",
                icon,
                a.date,
                a.amount,
                a.expected_amount,
                truncate(&a.reason, 40)
            );
        }
    })
}

pub async fn cmd_budget(session: &Session, period: Period) -> Result<()> {
    let statuses = session.service.budget_data(period).await;
    let summary = session.service.budget_summary(period).await;

    if session.json {
        let value = serde_json::json!({ "budgets": statuses, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("💰 Budgets ({})", period);
    println!("   ─────────────────────────────────────────────────────────────");

    if statuses.is_empty() {
        println!("   No budgets defined.");
        return Ok(());
    }

    println!(
        "   {:3}{:18} │ {:>9} │ {:>9} │ {:>9} │ {:>6}",
        "", "Category", "Budget", "Spent", "Left", "Used"
    );
    println!("   ─────────────────────┼───────────┼───────────┼───────────┼───────");
    for s in &statuses {
        println!(
            "   {} {:18} │ {:>9.2} │ {:>9.2} │ {:>9.2} │ {:>5.0}%",
            tier_icon(s.status),
            truncate(&s.category, 18),
            s.budgeted,
            s.spent,
            s.remaining,
            s.percentage
        );
    }

    if let Some(summary) = summary {
        println!();
        println!(
            "   Total: ${:.2} of ${:.2} ({:.0}%, {})",
            summary.total_spent, summary.total_budgeted, summary.percentage, summary.status
        );
        println!(
            "   Day {} of {}: averaging ${:.2}/day against ${:.2}/day budgeted",
            summary.day_of_month, summary.days_in_month, summary.daily_average, summary.daily_budget
        );
        println!(
            "   Projected month end: ${:.2} ({:.0}%, {})",
            summary.projected_total, summary.projected_percentage, summary.projected_status
        );
    }

    Ok(())
}
