//! Reminder operations

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::{Reminder, ReminderType};

/// How long before a charge the user is reminded
pub const REMINDER_LEAD_DAYS: i64 = 2;

/// Window for `upcoming_reminders`
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

const REMINDER_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.subscription_id, s.name, r.reminder_type, r.reminder_date,
           r.is_sent, r.created_at
    FROM reminders r
    JOIN subscriptions s ON s.id = r.subscription_id
"#;

/// When to fire a reminder for a charge on `date` (midnight UTC, minus the lead time)
pub(crate) fn reminder_instant_for(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() - Duration::days(REMINDER_LEAD_DAYS)
}

pub(crate) fn insert_reminder(
    conn: &Connection,
    user_id: &str,
    subscription_id: i64,
    reminder_type: ReminderType,
    reminder_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO reminders (user_id, subscription_id, reminder_type, reminder_date, is_sent, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
        params![
            user_id,
            subscription_id,
            reminder_type.as_str(),
            format_datetime(reminder_date),
            format_datetime(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_reminder(row: &Row) -> rusqlite::Result<Reminder> {
    let reminder_type: String = row.get(4)?;
    let reminder_date: String = row.get(5)?;
    let created_at: String = row.get(7)?;

    Ok(Reminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subscription_id: row.get(2)?,
        subscription_name: row.get(3)?,
        reminder_type: reminder_type.parse().unwrap_or(ReminderType::Renewal),
        reminder_date: parse_datetime(&reminder_date),
        is_sent: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// All of a user's reminders, soonest first
    pub fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE r.user_id = ? ORDER BY r.reminder_date ASC, r.id ASC",
            REMINDER_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let reminders = stmt
            .query_map(params![user_id], row_to_reminder)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    /// Unsent reminders due between now and a week from now, soonest first
    pub fn upcoming_reminders(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE r.user_id = ? AND r.is_sent = 0 AND r.reminder_date >= ? AND r.reminder_date <= ? \
             ORDER BY r.reminder_date ASC, r.id ASC",
            REMINDER_SELECT
        );
        let until = now + Duration::days(UPCOMING_WINDOW_DAYS);
        let mut stmt = conn.prepare(&sql)?;
        let reminders = stmt
            .query_map(
                params![user_id, format_datetime(now), format_datetime(until)],
                row_to_reminder,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    /// Mark a reminder as delivered
    ///
    /// Returns false if the reminder does not exist.
    pub fn mark_reminder_sent(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE reminders SET is_sent = 1 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(updated > 0)
    }
}
