//! SubTrack CLI - Subscription tracker
//!
//! Usage:
//!   subtrack init                       Initialize database
//!   subtrack scan receipt.txt --json    Find subscriptions in receipt emails
//!   subtrack subscriptions list         List tracked subscriptions
//!   subtrack health                     Score subscription health
//!   subtrack cancellation Netflix       Draft a cancellation request
//!   subtrack serve --port 3000          Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt).await,
        Commands::Scan {
            files,
            json,
            import,
        } => match import {
            Some(user) => {
                let db = commands::open_db(&cli.db, cli.no_encrypt)?;
                commands::cmd_scan_import(&db, &user, &files)
            }
            None => commands::cmd_scan(&files, json),
        },
        Commands::Samples { json } => commands::cmd_samples(json),
        Commands::Subscriptions { user, action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(SubscriptionsAction::List) => {
                    commands::cmd_subscriptions_list(&db, &user)
                }
                Some(SubscriptionsAction::Add {
                    name,
                    cost,
                    category,
                    cycle,
                    renewal,
                    status,
                    trial_end,
                    difficulty,
                    cancel_link,
                }) => commands::cmd_subscriptions_add(
                    &db,
                    &user,
                    commands::AddSubscription {
                        name,
                        cost,
                        category,
                        cycle,
                        renewal,
                        status,
                        trial_end,
                        difficulty,
                        cancel_link,
                    },
                ),
                Some(SubscriptionsAction::Used { id }) => {
                    commands::cmd_subscriptions_used(&db, &user, id)
                }
                Some(SubscriptionsAction::Cancel { name_or_id }) => {
                    commands::cmd_subscriptions_cancel(&db, &user, &name_or_id)
                }
                Some(SubscriptionsAction::Revive { name_or_id }) => {
                    commands::cmd_subscriptions_revive(&db, &user, &name_or_id)
                }
                Some(SubscriptionsAction::Delete { id }) => {
                    commands::cmd_subscriptions_delete(&db, &user, id)
                }
            }
        }
        Commands::Health { user } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_health(&db, &user)
        }
        Commands::Reminders { user, upcoming } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_reminders(&db, &user, upcoming)
        }
        Commands::Cancellation { user, name_or_id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_cancellation(&db, &user, &name_or_id)
        }
        Commands::Graveyard { user } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_graveyard(&db, &user)
        }
        Commands::Domain { url } => commands::cmd_domain(&url),
    }
}
