//! Subscription operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::reminders::{insert_reminder, reminder_instant_for};
use super::{format_date, format_datetime, parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    NewSubscription, ReminderType, Subscription, SubscriptionStatus, SubscriptionUpdate,
};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, name, category, cost, billing_cycle, renewal_date, \
     status, trial_end_date, last_used, cancellation_difficulty, notes, logo_identifier, \
     cancellation_link, created_at, updated_at";

fn row_to_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    let billing_cycle: String = row.get(5)?;
    let renewal_date: String = row.get(6)?;
    let status: String = row.get(7)?;
    let trial_end_date: Option<String> = row.get(8)?;
    let last_used: Option<String> = row.get(9)?;
    let difficulty: String = row.get(10)?;
    let created_at: String = row.get(14)?;
    let updated_at: String = row.get(15)?;

    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        cost: row.get(4)?,
        billing_cycle: billing_cycle.parse().unwrap_or_default(),
        renewal_date: parse_date(&renewal_date)?,
        status: status.parse().unwrap_or_default(),
        trial_end_date: trial_end_date.as_deref().map(parse_date).transpose()?,
        last_used: last_used.as_deref().map(parse_datetime),
        cancellation_difficulty: difficulty.parse().unwrap_or_default(),
        notes: row.get(11)?,
        logo_identifier: row.get(12)?,
        cancellation_link: row.get(13)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

fn validate_fields(name: &str, cost: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidData("Subscription name is required".into()));
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(Error::InvalidData(format!(
            "Cost must be a non-negative number, got {}",
            cost
        )));
    }
    Ok(())
}

fn select_subscription(conn: &Connection, user_id: &str, id: i64) -> Result<Option<Subscription>> {
    let sql = format!(
        "SELECT {} FROM subscriptions WHERE id = ? AND user_id = ?",
        SUBSCRIPTION_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![id, user_id], row_to_subscription)
        .optional()?)
}

impl Database {
    /// Create a subscription and schedule its reminders
    ///
    /// A renewal reminder is scheduled two days before the renewal date, and a
    /// trial-ending reminder two days before the trial end for trials. Reminders
    /// whose time has already passed are not created.
    pub fn create_subscription(
        &self,
        user_id: &str,
        new: &NewSubscription,
        now: DateTime<Utc>,
    ) -> Result<Subscription> {
        validate_fields(&new.name, new.cost)?;

        let name = new.name.trim();
        let logo = new
            .logo_identifier
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| name.to_lowercase());
        let category = if new.category.trim().is_empty() {
            crate::models::default_category()
        } else {
            new.category.trim().to_string()
        };
        let cancellation_link = new
            .cancellation_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let stamp = format_datetime(now);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO subscriptions (user_id, name, category, cost, billing_cycle, renewal_date,
                status, trial_end_date, cancellation_difficulty, notes, logo_identifier,
                cancellation_link, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                category,
                new.cost,
                new.billing_cycle.as_str(),
                format_date(new.renewal_date),
                new.status.as_str(),
                new.trial_end_date.map(format_date),
                new.cancellation_difficulty.as_str(),
                new.notes,
                logo,
                cancellation_link,
                stamp,
                stamp,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let renewal_at = reminder_instant_for(new.renewal_date);
        if renewal_at > now {
            insert_reminder(&tx, user_id, id, ReminderType::Renewal, renewal_at, now)?;
        }

        if new.status == SubscriptionStatus::Trial {
            if let Some(trial_end) = new.trial_end_date {
                let trial_at = reminder_instant_for(trial_end);
                if trial_at > now {
                    insert_reminder(&tx, user_id, id, ReminderType::TrialEnding, trial_at, now)?;
                }
            }
        }

        let created = select_subscription(&tx, user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("subscription {}", id)))?;
        tx.commit()?;

        debug!(user = %user_id, id, name = %created.name, "Created subscription");
        Ok(created)
    }

    /// List a user's subscriptions, newest first
    pub fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            SUBSCRIPTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let subscriptions = stmt
            .query_map(params![user_id], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(subscriptions)
    }

    /// Get one of a user's subscriptions by ID
    pub fn get_subscription(&self, user_id: &str, id: i64) -> Result<Option<Subscription>> {
        let conn = self.conn()?;
        select_subscription(&conn, user_id, id)
    }

    /// Apply a partial update
    ///
    /// Moving the renewal date replaces any unsent renewal reminder with one
    /// for the new date. Returns `None` if the subscription does not exist.
    pub fn update_subscription(
        &self,
        user_id: &str,
        id: i64,
        update: &SubscriptionUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut sub) = select_subscription(&tx, user_id, id)? else {
            return Ok(None);
        };
        let renewal_changed = update
            .renewal_date
            .is_some_and(|date| date != sub.renewal_date);

        if let Some(ref name) = update.name {
            sub.name = name.trim().to_string();
        }
        if let Some(ref category) = update.category {
            sub.category = category.trim().to_string();
        }
        if let Some(cost) = update.cost {
            sub.cost = cost;
        }
        if let Some(cycle) = update.billing_cycle {
            sub.billing_cycle = cycle;
        }
        if let Some(date) = update.renewal_date {
            sub.renewal_date = date;
        }
        if let Some(status) = update.status {
            sub.status = status;
        }
        if let Some(date) = update.trial_end_date {
            sub.trial_end_date = Some(date);
        }
        if let Some(difficulty) = update.cancellation_difficulty {
            sub.cancellation_difficulty = difficulty;
        }
        if let Some(ref notes) = update.notes {
            sub.notes = Some(notes.clone());
        }
        if let Some(ref link) = update.cancellation_link {
            // An empty link clears it
            let link = link.trim();
            sub.cancellation_link = (!link.is_empty()).then(|| link.to_string());
        }
        validate_fields(&sub.name, sub.cost)?;

        tx.execute(
            r#"
            UPDATE subscriptions
            SET name = ?, category = ?, cost = ?, billing_cycle = ?, renewal_date = ?, status = ?,
                trial_end_date = ?, cancellation_difficulty = ?, notes = ?, cancellation_link = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                sub.name,
                sub.category,
                sub.cost,
                sub.billing_cycle.as_str(),
                format_date(sub.renewal_date),
                sub.status.as_str(),
                sub.trial_end_date.map(format_date),
                sub.cancellation_difficulty.as_str(),
                sub.notes,
                sub.cancellation_link,
                format_datetime(now),
                id,
                user_id,
            ],
        )?;

        if renewal_changed {
            tx.execute(
                "DELETE FROM reminders WHERE subscription_id = ? AND user_id = ? AND reminder_type = ? AND is_sent = 0",
                params![id, user_id, ReminderType::Renewal.as_str()],
            )?;
            let renewal_at = reminder_instant_for(sub.renewal_date);
            if renewal_at > now {
                insert_reminder(&tx, user_id, id, ReminderType::Renewal, renewal_at, now)?;
            }
            debug!(user = %user_id, id, renewal = %sub.renewal_date, "Rescheduled renewal reminder");
        }

        let updated = select_subscription(&tx, user_id, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a subscription and its reminders
    ///
    /// Returns false if the subscription does not exist.
    pub fn delete_subscription(&self, user_id: &str, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM reminders WHERE subscription_id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM subscriptions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        tx.commit()?;

        Ok(deleted > 0)
    }

    /// Record that the user just used the service
    pub fn mark_subscription_used(&self, user_id: &str, id: i64, now: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn()?;
        let stamp = format_datetime(now);
        let updated = conn.execute(
            "UPDATE subscriptions SET last_used = ?, updated_at = ? WHERE id = ? AND user_id = ?",
            params![stamp, stamp, id, user_id],
        )?;
        Ok(updated > 0)
    }

    /// Find a subscription whose name contains `name`, ignoring case
    ///
    /// Used to avoid importing a service the user already tracks.
    pub fn find_subscription_by_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Subscription>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE user_id = ? AND instr(lower(name), lower(?)) > 0 \
             ORDER BY id LIMIT 1",
            SUBSCRIPTION_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![user_id, name], row_to_subscription)
            .optional()?)
    }
}
