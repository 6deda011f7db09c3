//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use subtrack_core::models::{BillingCycle, CancellationDifficulty, SubscriptionStatus};
use subtrack_server::LOCAL_DEV_USER;

/// SubTrack - Keep recurring subscriptions under control
#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "Self-hosted subscription tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "subtrack.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SUBTRACK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// Every request is treated as the "local-dev" user.
        #[arg(long)]
        no_auth: bool,
    },

    /// Scan receipt email text files for subscriptions
    Scan {
        /// Text files, one receipt email each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print detected receipts as JSON
        #[arg(long)]
        json: bool,

        /// Import the detected subscriptions for this user
        #[arg(long, value_name = "USER")]
        import: Option<String>,
    },

    /// Parse the built-in sample receipts
    Samples {
        /// Print detected receipts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage subscriptions (list, add, used, cancel, revive, delete)
    Subscriptions {
        /// User whose subscriptions to manage
        #[arg(short, long, default_value = LOCAL_DEV_USER)]
        user: String,

        #[command(subcommand)]
        action: Option<SubscriptionsAction>,
    },

    /// Show subscription health scores
    Health {
        /// User whose subscriptions to score
        #[arg(short, long, default_value = LOCAL_DEV_USER)]
        user: String,
    },

    /// List renewal and trial reminders
    Reminders {
        /// User whose reminders to list
        #[arg(short, long, default_value = LOCAL_DEV_USER)]
        user: String,

        /// Only unsent reminders due within the next week
        #[arg(long)]
        upcoming: bool,
    },

    /// Draft a cancellation request email for a subscription
    Cancellation {
        /// User who owns the subscription
        #[arg(short, long, default_value = LOCAL_DEV_USER)]
        user: String,

        /// Subscription ID or name
        name_or_id: String,
    },

    /// Show cancelled subscriptions and the money they have saved
    Graveyard {
        /// User whose cancelled subscriptions to show
        #[arg(short, long, default_value = LOCAL_DEV_USER)]
        user: String,
    },

    /// Identify the subscription service behind a URL
    Domain {
        /// URL to look up (e.g., https://www.netflix.com/browse)
        url: String,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionsAction {
    /// List subscriptions
    List,

    /// Add a subscription
    Add {
        /// Service name
        name: String,

        /// Cost per billing cycle
        cost: f64,

        /// Category (e.g., streaming, music, productivity)
        #[arg(short, long, default_value = "other")]
        category: String,

        /// Billing cycle: monthly or yearly
        #[arg(long, default_value = "monthly")]
        cycle: BillingCycle,

        /// Next renewal date (YYYY-MM-DD, defaults to one month from today)
        #[arg(long)]
        renewal: Option<NaiveDate>,

        /// Status: active, trial or cancelled
        #[arg(long, default_value = "active")]
        status: SubscriptionStatus,

        /// Trial end date (YYYY-MM-DD)
        #[arg(long)]
        trial_end: Option<NaiveDate>,

        /// How hard the provider makes cancelling: easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: CancellationDifficulty,

        /// Page where the subscription can be cancelled online
        #[arg(long)]
        cancel_link: Option<String>,
    },

    /// Record that you used a subscription today
    Used {
        /// Subscription ID
        id: i64,
    },

    /// Mark a subscription as cancelled
    Cancel {
        /// Subscription ID or name
        name_or_id: String,
    },

    /// Reactivate a cancelled subscription
    Revive {
        /// Subscription ID or name
        name_or_id: String,
    },

    /// Delete a subscription and its reminders
    Delete {
        /// Subscription ID
        id: i64,
    },
}
