//! Help with leaving a subscription, and credit for having left
//!
//! `cancellation_email` drafts the request a user sends to the provider.
//! The graveyard lists cancelled subscriptions with what they have saved
//! since they were cancelled. A subscription's `updated_at` stands in for
//! its cancellation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BillingCycle, CancellationDifficulty, Subscription, SubscriptionStatus};

/// Savings accrue per started 30-day period
const SAVINGS_PERIOD_DAYS: i64 = 30;

/// A drafted cancellation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationEmail {
    pub subject: String,
    pub body: String,
    pub cancellation_link: Option<String>,
    pub difficulty: CancellationDifficulty,
}

impl CancellationEmail {
    /// Subject and body as one pasteable message
    pub fn to_text(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}

/// Draft a cancellation request for a subscription
pub fn cancellation_email(subscription: &Subscription) -> CancellationEmail {
    let name = &subscription.name;
    let (cycle, period) = match subscription.billing_cycle {
        BillingCycle::Monthly => ("Monthly", "month"),
        BillingCycle::Yearly => ("Yearly", "year"),
    };

    let body = format!(
        "Dear {name} Support Team,

I am writing to request the cancellation of my {name} subscription effective immediately.

Account Details:
- Service: {name}
- Billing Cycle: {cycle}
- Current Cost: ${cost:.2}/{period}

Please process this cancellation and confirm the following:
1. The exact date my subscription will end
2. Whether I will receive a prorated refund for the remaining period
3. Confirmation that no further charges will be made

Please send written confirmation of this cancellation to this email address.

Thank you for your prompt attention to this matter.

Best regards",
        cost = subscription.cost,
    );

    CancellationEmail {
        subject: format!("Cancellation Request - {}", name),
        body,
        cancellation_link: subscription.cancellation_link.clone(),
        difficulty: subscription.cancellation_difficulty,
    }
}

/// One cancelled subscription and what it has saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraveyardEntry {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub monthly_cost: f64,
    pub cancelled_at: DateTime<Utc>,
    pub days_since_cancelled: i64,
    pub savings: f64,
}

/// All cancelled subscriptions with their combined savings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graveyard {
    pub subscriptions: Vec<GraveyardEntry>,
    pub total_savings: f64,
}

/// Money not spent since cancelling
///
/// Counts whole 30-day periods since cancellation, at least one.
pub fn savings_since_cancelled(subscription: &Subscription, now: DateTime<Utc>) -> f64 {
    let periods = (days_since(subscription.updated_at, now) / SAVINGS_PERIOD_DAYS).max(1);
    subscription.monthly_cost() * periods as f64
}

/// The graveyard as of now
pub fn graveyard(subscriptions: &[Subscription]) -> Graveyard {
    graveyard_at(subscriptions, Utc::now())
}

/// The graveyard at a fixed instant, most recently cancelled first
pub fn graveyard_at(subscriptions: &[Subscription], now: DateTime<Utc>) -> Graveyard {
    let mut entries: Vec<GraveyardEntry> = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Cancelled)
        .map(|s| GraveyardEntry {
            id: s.id,
            name: s.name.clone(),
            category: s.category.clone(),
            monthly_cost: round_cents(s.monthly_cost()),
            cancelled_at: s.updated_at,
            days_since_cancelled: days_since(s.updated_at, now),
            savings: round_cents(savings_since_cancelled(s, now)),
        })
        .collect();
    entries.sort_by(|a, b| b.cancelled_at.cmp(&a.cancelled_at));

    let total = entries.iter().map(|e| e.savings).sum::<f64>();
    Graveyard {
        subscriptions: entries,
        total_savings: round_cents(total),
    }
}

fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_days().max(0)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn sub(id: i64, name: &str, cost: f64, cycle: BillingCycle) -> Subscription {
        Subscription {
            id,
            user_id: "user-1".to_string(),
            name: name.to_string(),
            category: "streaming".to_string(),
            cost,
            billing_cycle: cycle,
            renewal_date: now().date_naive() + Duration::days(10),
            status: SubscriptionStatus::Active,
            trial_end_date: None,
            last_used: None,
            cancellation_difficulty: CancellationDifficulty::Hard,
            notes: None,
            logo_identifier: None,
            cancellation_link: None,
            created_at: now() - Duration::days(400),
            updated_at: now(),
        }
    }

    fn cancelled(id: i64, name: &str, cost: f64, days_ago: i64) -> Subscription {
        let mut s = sub(id, name, cost, BillingCycle::Monthly);
        s.status = SubscriptionStatus::Cancelled;
        s.updated_at = now() - Duration::days(days_ago);
        s
    }

    #[test]
    fn test_cancellation_email_monthly() {
        let mut s = sub(1, "Netflix", 15.49, BillingCycle::Monthly);
        s.cancellation_link = Some("https://www.netflix.com/cancelplan".to_string());

        let email = cancellation_email(&s);
        assert_eq!(email.subject, "Cancellation Request - Netflix");
        assert!(email.body.starts_with("Dear Netflix Support Team,"));
        assert!(email.body.contains("cancellation of my Netflix subscription"));
        assert!(email.body.contains("- Billing Cycle: Monthly"));
        assert!(email.body.contains("- Current Cost: $15.49/month"));
        assert!(email.body.ends_with("Best regards"));
        assert_eq!(
            email.cancellation_link.as_deref(),
            Some("https://www.netflix.com/cancelplan")
        );
        assert_eq!(email.difficulty, CancellationDifficulty::Hard);
    }

    #[test]
    fn test_cancellation_email_yearly() {
        let email = cancellation_email(&sub(1, "Adobe", 599.9, BillingCycle::Yearly));
        assert!(email.body.contains("- Billing Cycle: Yearly"));
        assert!(email.body.contains("- Current Cost: $599.90/year"));
        assert_eq!(email.cancellation_link, None);
    }

    #[test]
    fn test_cancellation_email_text() {
        let email = cancellation_email(&sub(1, "Hulu", 7.99, BillingCycle::Monthly));
        let text = email.to_text();
        assert!(text.starts_with("Subject: Cancellation Request - Hulu\n\nDear Hulu"));
    }

    #[test]
    fn test_cancellation_email_json_shape() {
        let json = serde_json::to_value(cancellation_email(&sub(
            1,
            "Hulu",
            7.99,
            BillingCycle::Monthly,
        )))
        .unwrap();
        assert_eq!(json["subject"], "Cancellation Request - Hulu");
        assert!(json["cancellationLink"].is_null());
        assert_eq!(json["difficulty"], "hard");
    }

    #[test]
    fn test_savings_counts_whole_periods_with_minimum_of_one() {
        assert_eq!(savings_since_cancelled(&cancelled(1, "A", 10.0, 0), now()), 10.0);
        assert_eq!(savings_since_cancelled(&cancelled(1, "A", 10.0, 29), now()), 10.0);
        assert_eq!(savings_since_cancelled(&cancelled(1, "A", 10.0, 30), now()), 10.0);
        assert_eq!(savings_since_cancelled(&cancelled(1, "A", 10.0, 95), now()), 30.0);
    }

    #[test]
    fn test_savings_uses_monthly_equivalent() {
        let mut yearly = sub(1, "Adobe", 120.0, BillingCycle::Yearly);
        yearly.status = SubscriptionStatus::Cancelled;
        yearly.updated_at = now() - Duration::days(60);
        assert_eq!(savings_since_cancelled(&yearly, now()), 20.0);
    }

    #[test]
    fn test_graveyard_only_cancelled_newest_first() {
        let subs = vec![
            sub(1, "Active", 50.0, BillingCycle::Monthly),
            cancelled(2, "Old", 10.0, 90),
            cancelled(3, "Recent", 5.5, 3),
        ];

        let yard = graveyard_at(&subs, now());
        let names: Vec<_> = yard.subscriptions.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Recent", "Old"]);
        assert_eq!(yard.subscriptions[0].days_since_cancelled, 3);
        assert_eq!(yard.subscriptions[0].savings, 5.5);
        assert_eq!(yard.subscriptions[1].savings, 30.0);
        assert_eq!(yard.total_savings, 35.5);
    }

    #[test]
    fn test_graveyard_empty() {
        let yard = graveyard_at(&[sub(1, "Active", 50.0, BillingCycle::Monthly)], now());
        assert!(yard.subscriptions.is_empty());
        assert_eq!(yard.total_savings, 0.0);
    }
}
