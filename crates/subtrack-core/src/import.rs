//! Turning scanned receipts into tracked subscriptions

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    default_category, BillingCycle, CancellationDifficulty, NewSubscription, SubscriptionStatus,
};
use crate::receipt::{catalog_category, ParsedReceipt};

/// Note attached to subscriptions created from receipts
pub const RECEIPT_IMPORT_NOTE: &str = "Added via Email Receipt Scanner";

/// A receipt the user chose to import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReceipt {
    pub service_name: String,
    pub amount: f64,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<&ParsedReceipt> for ImportReceipt {
    fn from(parsed: &ParsedReceipt) -> Self {
        Self {
            service_name: parsed.service_name.clone(),
            amount: parsed.amount,
            billing_cycle: Some(parsed.billing_cycle),
            category: catalog_category(&parsed.service_name).map(str::to_string),
        }
    }
}

/// Outcome of an import, by service name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
}

/// Create subscriptions for receipts the user does not already track
///
/// A receipt is skipped when an existing subscription's name contains its
/// service name (ignoring case), or when its fields are invalid. New
/// subscriptions renew one calendar month after `now`.
pub fn import_receipts(
    db: &Database,
    user_id: &str,
    receipts: &[ImportReceipt],
    now: DateTime<Utc>,
) -> Result<ImportResult> {
    let mut result = ImportResult::default();
    let renewal_date = now
        .date_naive()
        .checked_add_months(Months::new(1))
        .ok_or_else(|| Error::InvalidData("Renewal date out of range".into()))?;

    for receipt in receipts {
        if db
            .find_subscription_by_name(user_id, &receipt.service_name)?
            .is_some()
        {
            debug!(user = %user_id, service = %receipt.service_name, "Already tracked, skipping");
            result.skipped.push(receipt.service_name.clone());
            continue;
        }

        let category = receipt
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| catalog_category(&receipt.service_name).map(str::to_string))
            .unwrap_or_else(default_category);

        let new = NewSubscription {
            name: receipt.service_name.clone(),
            category,
            cost: receipt.amount,
            billing_cycle: receipt.billing_cycle.unwrap_or_default(),
            renewal_date,
            status: SubscriptionStatus::Active,
            trial_end_date: None,
            cancellation_difficulty: CancellationDifficulty::Medium,
            notes: Some(RECEIPT_IMPORT_NOTE.to_string()),
            logo_identifier: None,
            cancellation_link: None,
        };

        match db.create_subscription(user_id, &new, now) {
            Ok(_) => result.imported.push(receipt.service_name.clone()),
            Err(Error::InvalidData(reason)) => {
                warn!(user = %user_id, service = %receipt.service_name, %reason, "Skipping invalid receipt");
                result.skipped.push(receipt.service_name.clone());
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        user = %user_id,
        imported = result.imported.len(),
        skipped = result.skipped.len(),
        "Receipt import complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 8, 0, 0).unwrap()
    }

    fn receipt(name: &str, amount: f64) -> ImportReceipt {
        ImportReceipt {
            service_name: name.to_string(),
            amount,
            billing_cycle: None,
            category: None,
        }
    }

    #[test]
    fn test_import_creates_subscriptions() {
        let db = Database::in_memory().unwrap();
        let result = import_receipts(
            &db,
            "alice",
            &[receipt("Netflix", 15.49), receipt("Some Gym", 30.0)],
            now(),
        )
        .unwrap();

        assert_eq!(result.imported, vec!["Netflix", "Some Gym"]);
        assert!(result.skipped.is_empty());

        let subs = db.list_subscriptions("alice").unwrap();
        let netflix = subs.iter().find(|s| s.name == "Netflix").unwrap();
        assert_eq!(netflix.category, "streaming");
        assert_eq!(netflix.cost, 15.49);
        assert_eq!(netflix.billing_cycle, BillingCycle::Monthly);
        assert_eq!(netflix.status, SubscriptionStatus::Active);
        assert_eq!(netflix.cancellation_difficulty, CancellationDifficulty::Medium);
        assert_eq!(netflix.notes.as_deref(), Some(RECEIPT_IMPORT_NOTE));
        // Month-end clamps to the last day of February
        assert_eq!(netflix.renewal_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());

        let gym = subs.iter().find(|s| s.name == "Some Gym").unwrap();
        assert_eq!(gym.category, "other");
    }

    #[test]
    fn test_import_skips_existing() {
        let db = Database::in_memory().unwrap();
        import_receipts(&db, "alice", &[receipt("Spotify Premium", 11.99)], now()).unwrap();

        let result = import_receipts(
            &db,
            "alice",
            &[receipt("spotify", 11.99), receipt("Hulu", 17.99)],
            now(),
        )
        .unwrap();
        assert_eq!(result.imported, vec!["Hulu"]);
        assert_eq!(result.skipped, vec!["spotify"]);

        // Another user is unaffected
        let result = import_receipts(&db, "bob", &[receipt("Spotify", 11.99)], now()).unwrap();
        assert_eq!(result.imported, vec!["Spotify"]);
    }

    #[test]
    fn test_import_respects_explicit_fields() {
        let db = Database::in_memory().unwrap();
        let mut r = receipt("Adobe Creative Cloud", 599.88);
        r.billing_cycle = Some(BillingCycle::Yearly);
        r.category = Some("work".to_string());

        import_receipts(&db, "alice", &[r], now()).unwrap();
        let sub = &db.list_subscriptions("alice").unwrap()[0];
        assert_eq!(sub.billing_cycle, BillingCycle::Yearly);
        assert_eq!(sub.category, "work");
    }

    #[test]
    fn test_import_skips_invalid() {
        let db = Database::in_memory().unwrap();
        let result = import_receipts(
            &db,
            "alice",
            &[receipt("", 10.0), receipt("Broken", -5.0)],
            now(),
        )
        .unwrap();
        assert!(result.imported.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }

    #[test]
    fn test_import_duplicate_within_batch() {
        let db = Database::in_memory().unwrap();
        let result = import_receipts(
            &db,
            "alice",
            &[receipt("Netflix", 15.49), receipt("Netflix", 15.49)],
            now(),
        )
        .unwrap();
        assert_eq!(result.imported, vec!["Netflix"]);
        assert_eq!(result.skipped, vec!["Netflix"]);
    }

    #[test]
    fn test_from_parsed_receipt() {
        let parsed = crate::receipt::parse_receipt_text("Your Spotify plan: $11.99");
        let import = ImportReceipt::from(&parsed[0]);
        assert_eq!(import.service_name, "Spotify");
        assert_eq!(import.category.as_deref(), Some("music"));
        assert_eq!(import.billing_cycle, Some(BillingCycle::Monthly));
    }
}
