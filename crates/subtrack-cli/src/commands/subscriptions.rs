//! Subscription command implementations

use anyhow::{bail, Context, Result};
use chrono::{Months, NaiveDate, Utc};
use subtrack_core::db::Database;
use subtrack_core::models::{
    BillingCycle, CancellationDifficulty, NewSubscription, Subscription, SubscriptionStatus,
    SubscriptionUpdate,
};

use super::truncate;

/// Arguments for `subscriptions add`
pub struct AddSubscription {
    pub name: String,
    pub cost: f64,
    pub category: String,
    pub cycle: BillingCycle,
    pub renewal: Option<NaiveDate>,
    pub status: SubscriptionStatus,
    pub trial_end: Option<NaiveDate>,
    pub difficulty: CancellationDifficulty,
    pub cancel_link: Option<String>,
}

/// Look a subscription up by ID, then by name
pub fn resolve_subscription(db: &Database, user_id: &str, name_or_id: &str) -> Result<Subscription> {
    match name_or_id.parse::<i64>() {
        Ok(id) => db.get_subscription(user_id, id)?,
        Err(_) => db.find_subscription_by_name(user_id, name_or_id)?,
    }
    .ok_or_else(|| anyhow::anyhow!("Subscription not found: {}", name_or_id))
}

pub fn cmd_subscriptions_list(db: &Database, user_id: &str) -> Result<()> {
    let subscriptions = db.list_subscriptions(user_id)?;

    if subscriptions.is_empty() {
        println!("No subscriptions tracked yet. Run:");
        println!("  subtrack scan receipt.txt --import {}", user_id);
        return Ok(());
    }

    println!();
    println!("📋 Subscriptions for {}", user_id);
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in subscriptions {
        let status_icon = match sub.status {
            SubscriptionStatus::Active => "✅",
            SubscriptionStatus::Trial => "🧪",
            SubscriptionStatus::Cancelled => "❌",
        };

        println!(
            "   {} {:>4} {:20} │ {:>9}/{:<7} │ {:12} │ renews {}",
            status_icon,
            sub.id,
            truncate(&sub.name, 20),
            format!("${:.2}", sub.cost),
            sub.billing_cycle.as_str(),
            truncate(&sub.category, 12),
            sub.renewal_date
        );
    }

    Ok(())
}

pub fn cmd_subscriptions_add(db: &Database, user_id: &str, args: AddSubscription) -> Result<()> {
    let now = Utc::now();
    let renewal_date = match args.renewal {
        Some(date) => date,
        None => now
            .date_naive()
            .checked_add_months(Months::new(1))
            .context("Renewal date out of range")?,
    };

    if args.status == SubscriptionStatus::Trial && args.trial_end.is_none() {
        println!("   💡 Tip: pass --trial-end to get a reminder before the trial ends");
    }

    let new = NewSubscription {
        name: args.name,
        category: args.category,
        cost: args.cost,
        billing_cycle: args.cycle,
        renewal_date,
        status: args.status,
        trial_end_date: args.trial_end,
        cancellation_difficulty: args.difficulty,
        notes: None,
        logo_identifier: None,
        cancellation_link: args.cancel_link,
    };

    let sub = db
        .create_subscription(user_id, &new, now)
        .context("Failed to add subscription")?;

    println!(
        "✅ Added {} (ID: {}) at ${:.2}/{}, renews {}",
        sub.name,
        sub.id,
        sub.cost,
        sub.billing_cycle.as_str(),
        sub.renewal_date
    );

    Ok(())
}

pub fn cmd_subscriptions_used(db: &Database, user_id: &str, id: i64) -> Result<()> {
    if !db.mark_subscription_used(user_id, id, Utc::now())? {
        bail!("Subscription not found: {}", id);
    }

    println!("✅ Marked subscription {} as used today", id);
    Ok(())
}

pub fn cmd_subscriptions_cancel(db: &Database, user_id: &str, name_or_id: &str) -> Result<()> {
    let sub = resolve_subscription(db, user_id, name_or_id)?;

    let update = SubscriptionUpdate {
        status: Some(SubscriptionStatus::Cancelled),
        ..Default::default()
    };
    db.update_subscription(user_id, sub.id, &update, Utc::now())?;

    println!("✅ Subscription cancelled: {} (ID: {})", sub.name, sub.id);
    println!(
        "   Saving ${:.2}/month",
        sub.monthly_cost()
    );
    println!("   Draft the request with: subtrack cancellation {}", sub.id);

    Ok(())
}

pub fn cmd_subscriptions_revive(db: &Database, user_id: &str, name_or_id: &str) -> Result<()> {
    let sub = resolve_subscription(db, user_id, name_or_id)?;
    if sub.status != SubscriptionStatus::Cancelled {
        bail!("{} is not cancelled", sub.name);
    }

    let update = SubscriptionUpdate {
        status: Some(SubscriptionStatus::Active),
        ..Default::default()
    };
    db.update_subscription(user_id, sub.id, &update, Utc::now())?;

    println!("✅ Revived {} (ID: {})", sub.name, sub.id);
    Ok(())
}

pub fn cmd_subscriptions_delete(db: &Database, user_id: &str, id: i64) -> Result<()> {
    if !db.delete_subscription(user_id, id)? {
        bail!("Subscription not found: {}", id);
    }

    println!("🗑️  Deleted subscription {}", id);
    Ok(())
}
