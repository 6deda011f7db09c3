//! Reminder command

use anyhow::Result;
use chrono::Utc;
use subtrack_core::db::Database;
use subtrack_core::models::ReminderType;

pub fn cmd_reminders(db: &Database, user_id: &str, upcoming: bool) -> Result<()> {
    let reminders = if upcoming {
        db.upcoming_reminders(user_id, Utc::now())?
    } else {
        db.list_reminders(user_id)?
    };

    if reminders.is_empty() {
        println!("No reminders scheduled.");
        return Ok(());
    }

    println!();
    println!("⏰ Reminders");
    println!("   ─────────────────────────────────────────────────────────────");

    for reminder in reminders {
        let what = match reminder.reminder_type {
            ReminderType::Renewal => "renews soon",
            ReminderType::TrialEnding => "trial ends soon",
        };
        let sent = if reminder.is_sent { " (sent)" } else { "" };
        println!(
            "   {} │ {} {}{}",
            reminder.reminder_date.format("%Y-%m-%d"),
            reminder.subscription_name,
            what,
            sent
        );
    }

    Ok(())
}
