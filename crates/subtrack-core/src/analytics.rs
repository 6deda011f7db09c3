//! Spending analytics over a user's subscriptions
//!
//! Everything here works on monthly-equivalent costs of billable (active or
//! trial) subscriptions. Cancelled subscriptions never contribute.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BillingCycle, Subscription};

/// A subscription unused for longer than this is flagged
const UNUSED_AFTER_DAYS: i64 = 30;

/// Typical discount for paying yearly instead of monthly
const ANNUAL_DISCOUNT_RATE: f64 = 0.17;

/// Normalize a cost on the given cycle to a per-month amount
pub fn monthly_equivalent(cost: f64, cycle: BillingCycle) -> f64 {
    match cycle {
        BillingCycle::Monthly => cost,
        BillingCycle::Yearly => cost / 12.0,
    }
}

/// Monthly spend for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category: String,
    pub monthly: f64,
}

/// What an insight is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    CategoryComparison,
    UnusedSubscriptions,
    AnnualSavings,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryComparison => "category_comparison",
            Self::UnusedSubscriptions => "unused_subscriptions",
            Self::AnnualSavings => "annual_savings",
        }
    }
}

impl std::fmt::Display for InsightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A human-readable observation about spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// Dollar amount behind the insight, if it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

fn billable(subscriptions: &[Subscription]) -> impl Iterator<Item = &Subscription> {
    subscriptions.iter().filter(|s| s.status.is_billable())
}

/// Total monthly-equivalent spend of billable subscriptions
pub fn monthly_total(subscriptions: &[Subscription]) -> f64 {
    billable(subscriptions).map(Subscription::monthly_cost).sum()
}

/// Unrounded category totals, largest first; ties keep first-seen order
fn category_totals(subscriptions: &[Subscription]) -> Vec<(String, f64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(String, f64)> = Vec::new();

    for sub in billable(subscriptions) {
        match index.get(sub.category.as_str()) {
            Some(&i) => totals[i].1 += sub.monthly_cost(),
            None => {
                index.insert(sub.category.as_str(), totals.len());
                totals.push((sub.category.clone(), sub.monthly_cost()));
            }
        }
    }

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

/// Monthly spend per category, largest first, rounded to cents
pub fn spending_by_category(subscriptions: &[Subscription]) -> Vec<CategorySpend> {
    category_totals(subscriptions)
        .into_iter()
        .map(|(category, monthly)| CategorySpend {
            category,
            monthly: round_cents(monthly),
        })
        .collect()
}

/// Observations about category skew, idle subscriptions and annual billing
pub fn generate_insights(subscriptions: &[Subscription], now: DateTime<Utc>) -> Vec<Insight> {
    let mut insights = Vec::new();

    let totals = category_totals(subscriptions);
    if let [top, .., bottom] = totals.as_slice() {
        if bottom.1 > 0.0 {
            let percent = (top.1 / bottom.1 * 100.0 - 100.0).round() as i64;
            if percent > 0 {
                insights.push(Insight {
                    kind: InsightKind::CategoryComparison,
                    title: "Category Insight".to_string(),
                    description: format!(
                        "You spend {}% more on {} than {}",
                        percent, top.0, bottom.0
                    ),
                    amount: None,
                });
            }
        }
    }

    let cutoff = now - Duration::days(UNUSED_AFTER_DAYS);
    let unused = billable(subscriptions)
        .filter(|s| s.last_used.map_or(true, |used| used < cutoff))
        .count();
    if unused > 0 {
        insights.push(Insight {
            kind: InsightKind::UnusedSubscriptions,
            title: "Unused Subscriptions".to_string(),
            description: format!(
                "{} subscription{} unused in the last {} days",
                unused,
                plural(unused),
                UNUSED_AFTER_DAYS
            ),
            amount: None,
        });
    }

    let monthly: Vec<&Subscription> = billable(subscriptions)
        .filter(|s| s.billing_cycle == BillingCycle::Monthly)
        .collect();
    if !monthly.is_empty() {
        let savings: f64 = monthly
            .iter()
            .map(|s| s.cost * 12.0 * ANNUAL_DISCOUNT_RATE)
            .sum();
        insights.push(Insight {
            kind: InsightKind::AnnualSavings,
            title: "Potential Savings".to_string(),
            description: format!(
                "Save up to {}/yr by switching {} subscription{} to annual plans",
                format_currency(savings),
                monthly.len(),
                plural(monthly.len())
            ),
            amount: Some(round_cents(savings)),
        });
    }

    insights
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format as US dollars with thousands separators, e.g. `$1,234.50`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
