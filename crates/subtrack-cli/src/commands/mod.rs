//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `cancellation` - Cancellation request drafts and the graveyard
//! - `core` - Init command and shared utilities (open_db)
//! - `domain` - Service lookup for a URL
//! - `health` - Subscription health scores
//! - `reminders` - Renewal and trial reminders
//! - `scan` - Receipt scanning (files and built-in samples)
//! - `serve` - Web server command
//! - `subscriptions` - Subscription management commands

pub mod cancellation;
pub mod core;
pub mod domain;
pub mod health;
pub mod reminders;
pub mod scan;
pub mod serve;
pub mod subscriptions;

// Re-export command functions for main.rs
pub use cancellation::*;
pub use core::*;
pub use domain::*;
pub use health::*;
pub use reminders::*;
pub use scan::*;
pub use serve::*;
pub use subscriptions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
