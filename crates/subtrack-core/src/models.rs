//! Domain models for SubTrack

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How often a subscription bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "annual" | "year" => Ok(Self::Yearly),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    /// Free trial that converts to a paid plan at `trial_end_date`
    Trial,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trial => "trial",
            Self::Cancelled => "cancelled",
        }
    }

    /// Active and trial subscriptions still cost money
    pub fn is_billable(&self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "trial" => Ok(Self::Trial),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown subscription status: {}", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How painful the provider makes cancelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CancellationDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl CancellationDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::str::FromStr for CancellationDifficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(format!("Unknown cancellation difficulty: {}", s)),
        }
    }
}

/// A tracked recurring subscription owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub cost: f64,
    pub billing_cycle: BillingCycle,
    pub renewal_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub trial_end_date: Option<NaiveDate>,
    /// Last time the user reported using the service
    pub last_used: Option<DateTime<Utc>>,
    pub cancellation_difficulty: CancellationDifficulty,
    pub notes: Option<String>,
    pub logo_identifier: Option<String>,
    /// Where the provider lets you cancel online
    pub cancellation_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Cost normalized to one month
    pub fn monthly_cost(&self) -> f64 {
        crate::analytics::monthly_equivalent(self.cost, self.billing_cycle)
    }
}

/// Fields for creating a subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub cost: f64,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    pub renewal_date: NaiveDate,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub trial_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub cancellation_difficulty: CancellationDifficulty,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub logo_identifier: Option<String>,
    #[serde(default)]
    pub cancellation_link: Option<String>,
}

/// Category assigned when none is given
pub fn default_category() -> String {
    "other".to_string()
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub cost: Option<f64>,
    pub billing_cycle: Option<BillingCycle>,
    pub renewal_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub trial_end_date: Option<NaiveDate>,
    pub cancellation_difficulty: Option<CancellationDifficulty>,
    pub notes: Option<String>,
    pub cancellation_link: Option<String>,
}

/// Why a reminder exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Renewal,
    TrialEnding,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Renewal => "renewal",
            Self::TrialEnding => "trial_ending",
        }
    }
}

impl std::str::FromStr for ReminderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "renewal" => Ok(Self::Renewal),
            "trial_ending" => Ok(Self::TrialEnding),
            _ => Err(format!("Unknown reminder type: {}", s)),
        }
    }
}

/// A scheduled notification about an upcoming charge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub user_id: String,
    pub subscription_id: i64,
    /// Joined from the subscription for display
    pub subscription_name: String,
    pub reminder_type: ReminderType,
    pub reminder_date: DateTime<Utc>,
    pub is_sent: bool,
    pub created_at: DateTime<Utc>,
}
