//! Report command implementations

use anyhow::Result;
use outlay_core::{Period, PeriodComparison};

use super::{format_change, truncate, Session};

pub async fn cmd_spending(session: &Session, period: Period, category: Option<&str>) -> Result<()> {
    let records = session.service.spending_data(period, category).await;

    session.output(&records, |records| {
        println!();
        println!("💳 Spending ({})", period);
        println!("   ─────────────────────────────────────────────────────────────");

        if records.is_empty() {
            println!("   No spending found in this period.");
            return;
        }

        println!(
            "   {:10} │ {:25} │ {:15} │ {:>10}",
            "Date", "Subscription", "Category", "Amount"
        );
        println!("   ───────────┼───────────────────────────┼─────────────────┼───────────");
        for r in records {
            println!(
                "   {:10} │ {:25} │ {:15} │ {:>10.2}",
                r.date,
                truncate(r.subscription_name.as_deref().unwrap_or("-"), 25),
                truncate(&r.category, 15),
                r.amount
            );
        }

        let total: f64 = records.iter().map(|r| r.amount).sum();
        println!();
        println!("   Total: ${:.2} across {} payments", total, records.len());
    })
}

pub async fn cmd_monthly(session: &Session, months: usize, forecast: bool) -> Result<()> {
    let buckets = session.service.monthly_data(months, forecast).await;

    session.output(&buckets, |buckets| {
        println!();
        println!("📅 Monthly Spending");
        println!("   ─────────────────────────────────────────────────────────────");

        if buckets.is_empty() {
            println!("   No data.");
            return;
        }

        println!(
            "   {:8} │ {:>10} │ {:>8} │ {:>5}",
            "Month", "Total", "Change", "Count"
        );
        println!("   ─────────┼────────────┼──────────┼───────");
        for b in buckets {
            println!(
                "   {:8} │ {:>10.2} │ {:>8} │ {:>5}{}",
                b.month,
                b.total,
                format_change(b.trend_pct),
                b.count,
                if b.is_forecast { "  (forecast)" } else { "" }
            );
        }
    })
}

pub async fn cmd_categories(session: &Session, period: Period) -> Result<()> {
    let breakdown = session.service.category_breakdown(period).await;

    session.output(&breakdown, |breakdown| {
        println!();
        println!("📊 Spending by Category ({})", period);
        println!("   ─────────────────────────────────────────────────────────────");

        if breakdown.is_empty() {
            println!("   No spending found in this period.");
            return;
        }

        println!(
            "   {:20} │ {:>10} │ {:>6} │ {:>8} │ {:>4}",
            "Category", "Amount", "%", "Trend", "Subs"
        );
        println!("   ─────────────────────┼────────────┼────────┼──────────┼─────");
        for c in breakdown {
            println!(
                "   {:20} │ {:>10.2} │ {:>5.1}% │ {:>8} │ {:>4}",
                truncate(&c.category, 20),
                c.amount,
                c.percentage,
                format_change(c.trend_pct),
                c.subscription_count
            );
        }
    })
}

pub async fn cmd_subscription(session: &Session, id: &str) -> Result<()> {
    let Some(report) = session.service.subscription_analytics(id).await else {
        anyhow::bail!("Subscription not found: {}", id);
    };

    session.output(&report, |r| {
        println!();
        println!("🔎 {} ({})", r.name, r.subscription_id);
        println!("   ─────────────────────────────────────────────────────────────");
        println!("   Category:      {}", r.category);
        println!("   Billing:       {}", r.billing_cycle);
        println!("   Monthly cost:  ${:.2}", r.monthly_cost);
        println!("   Annual cost:   ${:.2}", r.annual_cost);
        println!(
            "   Total spent:   ${:.2} over {} payments (avg ${:.2})",
            r.total_spent, r.payment_count, r.average_payment
        );
        if let (Some(first), Some(last)) = (r.first_payment, r.last_payment) {
            println!("   Payments:      {} to {}", first, last);
        }
        println!("   Share:         {:.1}% of all spending", r.share_of_spending);

        if !r.price_changes.is_empty() {
            println!();
            println!("   Price changes:");
            for change in &r.price_changes {
                println!(
                    "     {}  ${:.2} → ${:.2} ({})",
                    change.date,
                    change.old_amount,
                    change.new_amount,
                    format_change(change.change_pct)
                );
            }
        }
    })
}

pub async fn cmd_compare(session: &Session, window: PeriodComparison) -> Result<()> {
    let data = session.service.comparison_data(window).await?;

    session.output(&data, |d| {
        println!();
        println!("⚖️  Comparison ({})", d.comparison);
        println!("   ─────────────────────────────────────────────────────────────");
        println!(
            "   Current:  {} to {}  ${:.2} ({} payments)",
            d.current.from, d.current.to, d.current.total, d.current.count
        );
        println!(
            "   Previous: {} to {}  ${:.2} ({} payments)",
            d.previous.from, d.previous.to, d.previous.total, d.previous.count
        );
        println!(
            "   Change:   ${:+.2} ({})",
            d.change_amount,
            format_change(d.change_pct)
        );

        if !d.categories.is_empty() {
            println!();
            println!(
                "   {:20} │ {:>10} │ {:>10} │ {:>8}",
                "Category", "Current", "Previous", "Change"
            );
            println!("   ─────────────────────┼────────────┼────────────┼──────────");
            for c in &d.categories {
                println!(
                    "   {:20} │ {:>10.2} │ {:>10.2} │ {:>8}",
                    truncate(&c.category, 20),
                    c.current,
                    c.previous,
                    format_change(c.change_pct)
                );
            }
        }
    })
}

pub async fn cmd_yearly(session: &Session) -> Result<()> {
    let years = session.service.year_over_year().await;

    session.output(&years, |years| {
        println!();
        println!("📆 Year over Year");
        println!("   ─────────────────────────────────────────────────────────────");

        if years.is_empty() {
            println!("   No data.");
            return;
        }

        println!(
            "   {:4} │ {:>10} │ {:>9} │ {:>8} │ {}",
            "Year", "Total", "Per month", "Change", "Top category"
        );
        println!("   ─────┼────────────┼───────────┼──────────┼──────────────");
        for y in years {
            println!(
                "   {:4} │ {:>10.2} │ {:>9.2} │ {:>8} │ {}",
                y.year,
                y.total,
                y.monthly_average,
                format_change(y.change_pct),
                y.top_category.as_deref().unwrap_or("-")
            );
        }
    })
}
