//! Subscription health command

use anyhow::Result;
use subtrack_core::db::Database;
use subtrack_core::health::{calculate_health_score, calculate_portfolio_health, HealthStatus};
use subtrack_core::models::SubscriptionStatus;

use super::truncate;

fn status_icon(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "💚",
        HealthStatus::Warning => "🟡",
        HealthStatus::Unhealthy => "🔴",
    }
}

pub fn cmd_health(db: &Database, user_id: &str) -> Result<()> {
    let subscriptions = db.list_subscriptions(user_id)?;
    let portfolio = calculate_portfolio_health(&subscriptions);

    println!();
    println!("🩺 Subscription Health");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {} Overall: {}/100 ({})",
        status_icon(portfolio.status),
        portfolio.score,
        portfolio.status
    );
    println!(
        "   Healthy: {}  Warning: {}  Unhealthy: {}",
        portfolio.healthy_count, portfolio.warning_count, portfolio.unhealthy_count
    );
    if portfolio.total_savings_potential > 0.0 {
        println!(
            "   💰 Potential savings: ${:.2}/month",
            portfolio.total_savings_potential
        );
    }

    let active: Vec<_> = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .collect();
    if active.is_empty() {
        return Ok(());
    }

    println!();
    for sub in active {
        let result = calculate_health_score(sub, &subscriptions);
        println!(
            "   {} {:20} {:>3}  usage {:>3} · value {:>3} · age {:>3}",
            status_icon(result.status),
            truncate(&sub.name, 20),
            result.score,
            result.breakdown.usage_score,
            result.breakdown.value_score,
            result.breakdown.age_score
        );
        println!("      {}", result.recommendation);
    }

    Ok(())
}
