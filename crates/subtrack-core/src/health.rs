//! Subscription health scoring
//!
//! Scores each subscription 0-100 from three weighted signals:
//! - Usage recency (40%): days since the user last used the service
//! - Value (30%): monthly cost relative to active peers in the same category
//! - Age (30%): months since the subscription was added
//!
//! The portfolio score averages individual scores over active subscriptions
//! and estimates how much monthly spend could be recovered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Subscription, SubscriptionStatus};

const USAGE_WEIGHT: f64 = 0.4;
const VALUE_WEIGHT: f64 = 0.3;
const AGE_WEIGHT: f64 = 0.3;

/// Usage score when the user never recorded a use
const UNKNOWN_USAGE_SCORE: u32 = 60;

/// Value score when fewer than two active peers share the category
const DEFAULT_VALUE_SCORE: u32 = 70;

/// Score bands
const HEALTHY_MIN: u32 = 80;
const WARNING_MIN: u32 = 50;

/// Sub-score below which a signal is called out in a recommendation
const SIGNAL_FLOOR: u32 = 50;

/// Share of monthly cost counted as recoverable per status
const WARNING_SAVINGS_SHARE: f64 = 0.5;
const UNHEALTHY_SAVINGS_SHARE: f64 = 1.0;

/// Health classification of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
}

impl HealthStatus {
    pub fn from_score(score: u32) -> Self {
        if score >= HEALTHY_MIN {
            Self::Healthy
        } else if score >= WARNING_MIN {
            Self::Warning
        } else {
            Self::Unhealthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three component scores, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBreakdown {
    pub usage_score: u32,
    pub value_score: u32,
    pub age_score: u32,
}

/// Health of a single subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreResult {
    pub score: u32,
    pub breakdown: HealthBreakdown,
    pub status: HealthStatus,
    pub recommendation: String,
}

/// Aggregate health over all active subscriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHealth {
    pub score: u32,
    pub status: HealthStatus,
    pub healthy_count: usize,
    pub warning_count: usize,
    pub unhealthy_count: usize,
    /// Estimated recoverable monthly spend, rounded to cents
    pub total_savings_potential: f64,
}

impl PortfolioHealth {
    /// An empty portfolio is perfectly healthy
    fn empty() -> Self {
        Self {
            score: 100,
            status: HealthStatus::Healthy,
            healthy_count: 0,
            warning_count: 0,
            unhealthy_count: 0,
            total_savings_potential: 0.0,
        }
    }
}

/// Score a subscription against its peers as of now
pub fn calculate_health_score(
    subscription: &Subscription,
    all_subscriptions: &[Subscription],
) -> HealthScoreResult {
    calculate_health_score_at(subscription, all_subscriptions, Utc::now())
}

/// Score a subscription against its peers at a fixed instant
///
/// `all_subscriptions` is the peer set for the value comparison. The target
/// counts toward its own category average when it is in the set and active.
pub fn calculate_health_score_at(
    subscription: &Subscription,
    all_subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> HealthScoreResult {
    let breakdown = HealthBreakdown {
        usage_score: usage_score(subscription.last_used, now),
        value_score: value_score(subscription, all_subscriptions),
        age_score: age_score(subscription.created_at, now),
    };

    let weighted = breakdown.usage_score as f64 * USAGE_WEIGHT
        + breakdown.value_score as f64 * VALUE_WEIGHT
        + breakdown.age_score as f64 * AGE_WEIGHT;
    let score = weighted.round() as u32;
    let status = HealthStatus::from_score(score);

    HealthScoreResult {
        score,
        breakdown,
        status,
        recommendation: recommendation(status, &breakdown).to_string(),
    }
}

/// Aggregate health of the active subscriptions as of now
pub fn calculate_portfolio_health(subscriptions: &[Subscription]) -> PortfolioHealth {
    calculate_portfolio_health_at(subscriptions, Utc::now())
}

/// Aggregate health of the active subscriptions at a fixed instant
pub fn calculate_portfolio_health_at(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> PortfolioHealth {
    let active: Vec<&Subscription> = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .collect();

    if active.is_empty() {
        return PortfolioHealth::empty();
    }

    let mut portfolio = PortfolioHealth::empty();
    let mut total_score = 0u32;
    let mut savings = 0.0;

    for sub in &active {
        let result = calculate_health_score_at(sub, subscriptions, now);
        total_score += result.score;

        match result.status {
            HealthStatus::Healthy => portfolio.healthy_count += 1,
            HealthStatus::Warning => {
                portfolio.warning_count += 1;
                savings += sub.monthly_cost() * WARNING_SAVINGS_SHARE;
            }
            HealthStatus::Unhealthy => {
                portfolio.unhealthy_count += 1;
                savings += sub.monthly_cost() * UNHEALTHY_SAVINGS_SHARE;
            }
        }
    }

    portfolio.score = (total_score as f64 / active.len() as f64).round() as u32;
    portfolio.status = HealthStatus::from_score(portfolio.score);
    portfolio.total_savings_potential = round_cents(savings);
    portfolio
}

fn usage_score(last_used: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(last_used) = last_used else {
        return UNKNOWN_USAGE_SCORE;
    };

    match (now - last_used).num_days() {
        d if d <= 7 => 100,
        d if d <= 14 => 85,
        d if d <= 30 => 70,
        d if d <= 60 => 50,
        d if d <= 90 => 30,
        _ => 10,
    }
}

fn value_score(subscription: &Subscription, all_subscriptions: &[Subscription]) -> u32 {
    let peers: Vec<f64> = all_subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active && s.category == subscription.category)
        .map(Subscription::monthly_cost)
        .collect();

    if peers.len() < 2 {
        return DEFAULT_VALUE_SCORE;
    }

    let average = peers.iter().sum::<f64>() / peers.len() as f64;
    // All-free categories have nothing to compare against
    if average <= 0.0 {
        return DEFAULT_VALUE_SCORE;
    }

    match subscription.monthly_cost() / average {
        r if r <= 0.5 => 100,
        r if r <= 0.75 => 90,
        r if r <= 1.0 => 80,
        r if r <= 1.25 => 65,
        r if r <= 1.5 => 50,
        r if r <= 2.0 => 30,
        _ => 15,
    }
}

fn age_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    match (now - created_at).num_days() / 30 {
        m if m <= 1 => 100,
        m if m <= 3 => 90,
        m if m <= 6 => 80,
        m if m <= 12 => 70,
        m if m <= 24 => 60,
        _ => 50,
    }
}

/// Advice for a status, pointing at the weakest signal when there is one
///
/// Warning and unhealthy share one rule: low usage that is also below the
/// value score wins, then low value, then generic advice.
fn recommendation(status: HealthStatus, breakdown: &HealthBreakdown) -> &'static str {
    let low_usage = breakdown.usage_score < SIGNAL_FLOOR
        && breakdown.usage_score < breakdown.value_score;
    let low_value = breakdown.value_score < SIGNAL_FLOOR;

    match status {
        HealthStatus::Healthy => "This subscription is providing good value. Keep it!",
        HealthStatus::Warning => {
            if low_usage {
                "Consider if you still need this - low usage detected."
            } else if low_value {
                "This seems expensive compared to similar subscriptions."
            } else {
                "Review this subscription to ensure it still meets your needs."
            }
        }
        HealthStatus::Unhealthy => {
            if low_usage {
                "You rarely use this. Consider cancelling to save money."
            } else if low_value {
                "This is significantly overpriced. Look for alternatives."
            } else {
                "This subscription may not be worth keeping. Review it soon."
            }
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingCycle, CancellationDifficulty};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn sub(id: i64, category: &str, cost: f64) -> Subscription {
        Subscription {
            id,
            user_id: "user-1".to_string(),
            name: format!("Sub {}", id),
            category: category.to_string(),
            cost,
            billing_cycle: BillingCycle::Monthly,
            renewal_date: now().date_naive() + Duration::days(10),
            status: SubscriptionStatus::Active,
            trial_end_date: None,
            last_used: Some(now()),
            cancellation_difficulty: CancellationDifficulty::Medium,
            notes: None,
            logo_identifier: None,
            cancellation_link: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_fresh_average_subscription_scores_94() {
        let a = sub(1, "streaming", 10.0);
        let b = sub(2, "streaming", 10.0);
        let all = vec![a.clone(), b];

        let result = calculate_health_score_at(&a, &all, now());

        assert_eq!(result.breakdown.usage_score, 100);
        assert_eq!(result.breakdown.value_score, 80);
        assert_eq!(result.breakdown.age_score, 100);
        assert_eq!(result.score, 94);
        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(
            result.recommendation,
            "This subscription is providing good value. Keep it!"
        );
    }

    #[test]
    fn test_usage_buckets() {
        let cases = [
            (0, 100),
            (7, 100),
            (8, 85),
            (14, 85),
            (30, 70),
            (60, 50),
            (90, 30),
            (91, 10),
        ];
        for (days, expected) in cases {
            assert_eq!(
                usage_score(Some(now() - Duration::days(days)), now()),
                expected,
                "days={}",
                days
            );
        }
        assert_eq!(usage_score(None, now()), 60);
    }

    #[test]
    fn test_age_buckets() {
        let cases = [
            (0, 100),
            (59, 100),
            (60, 90),
            (119, 90),
            (180, 80),
            (390, 70),
            (749, 60),
            (750, 50),
        ];
        for (days, expected) in cases {
            assert_eq!(
                age_score(now() - Duration::days(days), now()),
                expected,
                "days={}",
                days
            );
        }
    }

    #[test]
    fn test_value_default_without_peers() {
        let a = sub(1, "music", 10.0);
        let other = sub(2, "streaming", 50.0);
        assert_eq!(value_score(&a, &[a.clone(), other]), 70);
        assert_eq!(value_score(&a, &[]), 70);
    }

    #[test]
    fn test_value_ignores_inactive_peers() {
        let a = sub(1, "music", 10.0);
        let mut cancelled = sub(2, "music", 100.0);
        cancelled.status = SubscriptionStatus::Cancelled;
        assert_eq!(value_score(&a, &[a.clone(), cancelled]), 70);
    }

    #[test]
    fn test_value_includes_target_in_average() {
        // Average of 10 and 30 is 20
        let cheap = sub(1, "design", 10.0);
        let pricey = sub(2, "design", 30.0);
        let all = vec![cheap.clone(), pricey.clone()];

        assert_eq!(value_score(&cheap, &all), 100); // ratio 0.5
        assert_eq!(value_score(&pricey, &all), 50); // ratio 1.5
    }

    #[test]
    fn test_value_normalizes_yearly_cost() {
        // $120/yr is $10/mo, same as the monthly peer
        let mut yearly = sub(1, "ai", 120.0);
        yearly.billing_cycle = BillingCycle::Yearly;
        let monthly = sub(2, "ai", 10.0);

        assert_eq!(value_score(&yearly, &[yearly.clone(), monthly]), 80);
    }

    #[test]
    fn test_value_ratio_buckets() {
        // Peer costs chosen so the average lands on a round number
        let target = |cost: f64| sub(1, "x", cost);
        let check = |cost: f64, expected: u32| {
            let t = target(cost);
            let peer = sub(2, "x", 200.0 - cost);
            // average is always 100
            assert_eq!(value_score(&t, &[t.clone(), peer]), expected, "cost={}", cost);
        };
        check(75.0, 90);
        check(100.0, 80);
        check(125.0, 65);
        check(150.0, 50);
        check(190.0, 30);
    }

    #[test]
    fn test_value_extremely_expensive() {
        let t = sub(1, "x", 100.0);
        let peers = vec![t.clone(), sub(2, "x", 1.0), sub(3, "x", 1.0)];
        assert_eq!(value_score(&t, &peers), 15);
    }

    #[test]
    fn test_value_all_free_category() {
        let a = sub(1, "free", 0.0);
        let b = sub(2, "free", 0.0);
        assert_eq!(value_score(&a, &[a.clone(), b]), 70);
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(HealthStatus::from_score(100), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(80), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(79), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(50), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(49), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::from_score(0), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_warning_low_usage_recommendation() {
        // usage 30, value 70 (no peers), age 100 -> 12 + 21 + 30 = 63
        let mut s = sub(1, "solo", 10.0);
        s.last_used = Some(now() - Duration::days(80));

        let result = calculate_health_score_at(&s, &[s.clone()], now());
        assert_eq!(result.score, 63);
        assert_eq!(result.status, HealthStatus::Warning);
        assert!(result.recommendation.contains("low usage"));
    }

    #[test]
    fn test_warning_expensive_recommendation() {
        // usage 100, value 30, age 50 -> 40 + 9 + 15 = 64
        let mut s = sub(1, "x", 190.0);
        s.created_at = now() - Duration::days(800);
        let all = vec![s.clone(), sub(2, "x", 10.0)];

        let result = calculate_health_score_at(&s, &all, now());
        assert_eq!(result.score, 64);
        assert_eq!(result.status, HealthStatus::Warning);
        assert!(result.recommendation.contains("expensive"));
    }

    #[test]
    fn test_warning_usage_tied_with_value_prefers_value() {
        // usage 30 and value 30: usage is low but not strictly the weakest
        let mut s = sub(1, "x", 190.0);
        s.last_used = Some(now() - Duration::days(75));
        let all = vec![s.clone(), sub(2, "x", 10.0)];

        let result = calculate_health_score_at(&s, &all, now());
        // 12 + 9 + 30 = 51
        assert_eq!(result.score, 51);
        assert_eq!(result.status, HealthStatus::Warning);
        assert!(result.recommendation.contains("expensive"));
    }

    #[test]
    fn test_unhealthy_rarely_used() {
        // usage 10, value 70, age 50 -> 4 + 21 + 15 = 40
        let mut s = sub(1, "solo", 10.0);
        s.last_used = Some(now() - Duration::days(200));
        s.created_at = now() - Duration::days(900);

        let result = calculate_health_score_at(&s, &[s.clone()], now());
        assert_eq!(result.score, 40);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert!(result.recommendation.contains("rarely use"));
    }

    #[test]
    fn test_unhealthy_moderately_low_usage() {
        // usage 30, value 70 (no peers), age 50 -> 12 + 21 + 15 = 48
        let mut s = sub(1, "solo", 10.0);
        s.last_used = Some(now() - Duration::days(80));
        s.created_at = now() - Duration::days(900);

        let result = calculate_health_score_at(&s, &[s.clone()], now());
        assert_eq!(result.breakdown.usage_score, 30);
        assert_eq!(result.breakdown.value_score, 70);
        assert_eq!(result.score, 48);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(
            result.recommendation,
            "You rarely use this. Consider cancelling to save money."
        );
    }

    #[test]
    fn test_unhealthy_overpriced() {
        // usage 50, value 30, age 50 -> 20 + 9 + 15 = 44
        let mut s = sub(1, "x", 190.0);
        s.last_used = Some(now() - Duration::days(45));
        s.created_at = now() - Duration::days(900);
        let all = vec![s.clone(), sub(2, "x", 10.0)];

        let result = calculate_health_score_at(&s, &all, now());
        assert_eq!(result.breakdown.value_score, 30);
        assert_eq!(result.score, 44);
        assert_eq!(
            result.recommendation,
            "This is significantly overpriced. Look for alternatives."
        );
    }

    #[test]
    fn test_unhealthy_tie_falls_through_to_value() {
        // usage 30 and value 30: usage is not strictly the weakest
        let mut s = sub(1, "x", 190.0);
        s.last_used = Some(now() - Duration::days(75));
        s.created_at = now() - Duration::days(900);
        let all = vec![s.clone(), sub(2, "x", 10.0)];

        let result = calculate_health_score_at(&s, &all, now());
        // 12 + 9 + 15 = 36
        assert_eq!(result.score, 36);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert!(result.recommendation.contains("overpriced"));
    }

    #[test]
    fn test_health_score_idempotent() {
        let mut s = sub(1, "x", 12.0);
        s.last_used = Some(now() - Duration::days(20));
        let all = vec![s.clone(), sub(2, "x", 8.0)];

        let first = calculate_health_score_at(&s, &all, now());
        let second = calculate_health_score_at(&s, &all, now());
        assert_eq!(first, second);
        assert_eq!(all[0].cost, 12.0);
    }

    #[test]
    fn test_portfolio_empty() {
        let portfolio = calculate_portfolio_health_at(&[], now());
        assert_eq!(portfolio.score, 100);
        assert_eq!(portfolio.status, HealthStatus::Healthy);
        assert_eq!(portfolio.healthy_count, 0);
        assert_eq!(portfolio.warning_count, 0);
        assert_eq!(portfolio.unhealthy_count, 0);
        assert_eq!(portfolio.total_savings_potential, 0.0);
    }

    #[test]
    fn test_portfolio_only_cancelled_is_empty() {
        let mut s = sub(1, "x", 10.0);
        s.status = SubscriptionStatus::Cancelled;
        assert_eq!(calculate_portfolio_health_at(&[s], now()).score, 100);
    }

    #[test]
    fn test_portfolio_counts_and_savings() {
        let healthy = sub(1, "a", 10.0);

        // warning (63): half of $12/mo
        let mut warning = sub(2, "b", 12.0);
        warning.last_used = Some(now() - Duration::days(80));

        // unhealthy (40): all of $120/yr = $10/mo
        let mut unhealthy = sub(3, "c", 120.0);
        unhealthy.billing_cycle = BillingCycle::Yearly;
        unhealthy.last_used = Some(now() - Duration::days(200));
        unhealthy.created_at = now() - Duration::days(900);

        // trials are not part of the portfolio
        let mut trial = sub(4, "d", 99.0);
        trial.status = SubscriptionStatus::Trial;

        let portfolio =
            calculate_portfolio_health_at(&[healthy, warning, unhealthy, trial], now());

        assert_eq!(portfolio.healthy_count, 1);
        assert_eq!(portfolio.warning_count, 1);
        assert_eq!(portfolio.unhealthy_count, 1);
        // healthy scores 91 (usage 100, value 70, age 100)
        // (91 + 63 + 40) / 3 = 64.67 -> 65
        assert_eq!(portfolio.score, 65);
        assert_eq!(portfolio.status, HealthStatus::Warning);
        assert_eq!(portfolio.total_savings_potential, 16.0);
    }

    #[test]
    fn test_portfolio_json_shape() {
        let json = serde_json::to_value(calculate_portfolio_health_at(&[], now())).unwrap();
        assert_eq!(json["healthyCount"], 0);
        assert_eq!(json["totalSavingsPotential"], 0.0);
        assert_eq!(json["status"], "healthy");
    }
}
