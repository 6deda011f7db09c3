//! SubTrack Core Library
//!
//! Shared functionality for the SubTrack subscription tracker:
//! - Receipt email parsing into candidate subscriptions
//! - Subscription health scoring (single and portfolio)
//! - Spending analytics and insights
//! - Cancellation request drafts and savings from cancelled subscriptions
//! - Known service domains for the browser extension
//! - Database access and migrations (SQLCipher-encrypted SQLite)
//! - Bearer token verification against pluggable auth providers

pub mod analytics;
pub mod auth;
pub mod cancellation;
pub mod db;
pub mod domains;
pub mod error;
pub mod health;
pub mod import;
pub mod models;
pub mod receipt;

/// Test utilities including mock auth server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analytics::{CategorySpend, Insight, InsightKind};
pub use auth::{AuthClient, AuthProvider, AuthUser, HostedAuthProvider, StaticTokenProvider};
pub use cancellation::{cancellation_email, graveyard, CancellationEmail, Graveyard, GraveyardEntry};
pub use db::Database;
pub use domains::{match_domain, DomainMatch, ServiceDomainInfo};
pub use error::{Error, Result};
pub use health::{
    calculate_health_score, calculate_portfolio_health, HealthBreakdown, HealthScoreResult,
    HealthStatus, PortfolioHealth,
};
pub use import::{import_receipts, ImportReceipt, ImportResult};
pub use receipt::{parse_multiple_receipts, parse_receipt_text, Confidence, ParsedReceipt};
