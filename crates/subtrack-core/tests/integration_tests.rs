//! Integration tests for subtrack-core
//!
//! These tests exercise the scan → import → score → analyze workflow.

use chrono::{DateTime, Duration, TimeZone, Utc};
use subtrack_core::{
    analytics::{generate_insights, monthly_total, spending_by_category, InsightKind},
    db::Database,
    health::{calculate_health_score_at, calculate_portfolio_health_at, HealthStatus},
    import::{import_receipts, ImportReceipt},
    models::{BillingCycle, SubscriptionStatus, SubscriptionUpdate},
    receipt::{parse_multiple_receipts_on, SAMPLE_RECEIPTS},
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

// =============================================================================
// Receipt Workflow
// =============================================================================

#[test]
fn test_scan_and_import_sample_receipts() {
    let db = Database::in_memory().expect("Failed to create in-memory database");

    let parsed = parse_multiple_receipts_on(&SAMPLE_RECEIPTS, now().date_naive());
    let names: Vec<_> = parsed.iter().map(|r| r.service_name.as_str()).collect();
    assert_eq!(names, vec!["Netflix", "Spotify", "Adobe Creative Cloud", "GitHub Pro"]);

    let to_import: Vec<ImportReceipt> = parsed.iter().map(ImportReceipt::from).collect();
    let result = import_receipts(&db, "alice", &to_import, now()).expect("Import failed");
    assert_eq!(result.imported.len(), 4);
    assert!(result.skipped.is_empty());

    // Scanning the same mailbox again imports nothing new
    let result = import_receipts(&db, "alice", &to_import, now()).expect("Import failed");
    assert!(result.imported.is_empty());
    assert_eq!(result.skipped.len(), 4);

    let subs = db.list_subscriptions("alice").unwrap();
    assert_eq!(subs.len(), 4);

    let adobe = subs
        .iter()
        .find(|s| s.name == "Adobe Creative Cloud")
        .unwrap();
    assert_eq!(adobe.billing_cycle, BillingCycle::Monthly);
    assert_eq!(adobe.cost, 59.99);
    assert_eq!(adobe.category, "productivity");

    // Every imported subscription renews in a month, so each got a reminder
    assert_eq!(db.list_reminders("alice").unwrap().len(), 4);
}

// =============================================================================
// Health Workflow
// =============================================================================

#[test]
fn test_usage_tracking_improves_health() {
    let db = Database::in_memory().unwrap();
    let receipts = vec![ImportReceipt {
        service_name: "Netflix".to_string(),
        amount: 15.49,
        billing_cycle: None,
        category: None,
    }];
    import_receipts(&db, "alice", &receipts, now()).unwrap();

    let later = now() + Duration::days(100);
    let subs = db.list_subscriptions("alice").unwrap();
    let before = calculate_health_score_at(&subs[0], &subs, later);
    // Never used: usage 60, value 70, age 90 -> 24 + 21 + 27 = 72
    assert_eq!(before.score, 72);
    assert_eq!(before.status, HealthStatus::Warning);

    assert!(db.mark_subscription_used("alice", subs[0].id, later).unwrap());
    let subs = db.list_subscriptions("alice").unwrap();
    let after = calculate_health_score_at(&subs[0], &subs, later);
    // Used today: usage 100 -> 40 + 21 + 27 = 88
    assert_eq!(after.score, 88);
    assert_eq!(after.status, HealthStatus::Healthy);
}

#[test]
fn test_portfolio_ignores_cancelled() {
    let db = Database::in_memory().unwrap();
    let receipts: Vec<ImportReceipt> = ["Netflix", "Hulu"]
        .iter()
        .map(|name| ImportReceipt {
            service_name: name.to_string(),
            amount: 10.0,
            billing_cycle: None,
            category: None,
        })
        .collect();
    import_receipts(&db, "alice", &receipts, now()).unwrap();

    let hulu = db
        .find_subscription_by_name("alice", "hulu")
        .unwrap()
        .unwrap();
    let cancel = SubscriptionUpdate {
        status: Some(SubscriptionStatus::Cancelled),
        ..Default::default()
    };
    db.update_subscription("alice", hulu.id, &cancel, now())
        .unwrap();

    let subs = db.list_subscriptions("alice").unwrap();
    let portfolio = calculate_portfolio_health_at(&subs, now());
    assert_eq!(
        portfolio.healthy_count + portfolio.warning_count + portfolio.unhealthy_count,
        1
    );
}

// =============================================================================
// Analytics Workflow
// =============================================================================

#[test]
fn test_analytics_over_imported_samples() {
    let db = Database::in_memory().unwrap();
    let parsed = parse_multiple_receipts_on(&SAMPLE_RECEIPTS, now().date_naive());
    let to_import: Vec<ImportReceipt> = parsed.iter().map(ImportReceipt::from).collect();
    import_receipts(&db, "alice", &to_import, now()).unwrap();

    let subs = db.list_subscriptions("alice").unwrap();
    let spend = spending_by_category(&subs);
    assert!(!spend.is_empty());
    let total: f64 = spend.iter().map(|c| c.monthly).sum();
    assert!((total - monthly_total(&subs)).abs() < 0.05);

    let insights = generate_insights(&subs, now());
    // Nothing has been marked used yet
    assert!(insights
        .iter()
        .any(|i| i.kind == InsightKind::UnusedSubscriptions));
    assert!(insights.iter().any(|i| i.kind == InsightKind::AnnualSavings));
}
