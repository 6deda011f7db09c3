//! Cancellation commands

use anyhow::Result;
use subtrack_core::cancellation::{cancellation_email, graveyard};
use subtrack_core::db::Database;
use subtrack_core::models::SubscriptionStatus;

use super::{resolve_subscription, truncate};

pub fn cmd_cancellation(db: &Database, user_id: &str, name_or_id: &str) -> Result<()> {
    let sub = resolve_subscription(db, user_id, name_or_id)?;
    let email = cancellation_email(&sub);

    println!();
    println!("✂️  Cancelling {} (difficulty: {})", sub.name, email.difficulty.as_str());
    if let Some(ref link) = email.cancellation_link {
        println!("   Cancel online: {}", link);
    }
    if sub.status == SubscriptionStatus::Cancelled {
        println!("   Already marked cancelled");
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!();
    println!("{}", email.to_text());
    println!();
    println!("When done: subtrack subscriptions cancel {}", sub.id);

    Ok(())
}

pub fn cmd_graveyard(db: &Database, user_id: &str) -> Result<()> {
    let yard = graveyard(&db.list_subscriptions(user_id)?);

    if yard.subscriptions.is_empty() {
        println!("No cancelled subscriptions yet.");
        return Ok(());
    }

    println!();
    println!("🪦 Subscription Graveyard");
    println!("   ─────────────────────────────────────────────────────────────");

    for entry in &yard.subscriptions {
        println!(
            "   {:>4} {:20} │ {:>9}/mo │ {:>4} days ago │ saved ${:.2}",
            entry.id,
            truncate(&entry.name, 20),
            format!("${:.2}", entry.monthly_cost),
            entry.days_since_cancelled,
            entry.savings
        );
    }

    println!();
    println!("   💰 Total saved: ${:.2}", yard.total_savings);

    Ok(())
}
