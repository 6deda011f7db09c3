//! Web server command

use std::path::Path;

use anyhow::Result;
use subtrack_core::auth::{AuthClient, AuthProvider, StaticTokenProvider};
use subtrack_server::{parse_allowed_origins, ServerConfig};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
) -> Result<()> {
    println!("🚀 Starting SubTrack web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let api_tokens = StaticTokenProvider::from_env().unwrap_or_default();
    let auth_provider = AuthClient::from_env();
    let allowed_origins =
        parse_allowed_origins(&std::env::var("SUBTRACK_ALLOWED_ORIGINS").unwrap_or_default());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        match auth_provider {
            Some(ref provider) => {
                println!("   🔐 Authentication: {} provider (SUBTRACK_AUTH_URL)", provider.name());
            }
            None => {
                println!("   🔒 Authentication: no hosted provider");
                println!("      Set SUBTRACK_AUTH_URL to validate user tokens");
            }
        }
        if !api_tokens.is_empty() {
            println!(
                "   🔑 API tokens: {} configured (SUBTRACK_API_TOKENS)",
                api_tokens.len()
            );
        }
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_tokens,
        auth_provider,
    };

    subtrack_server::serve_with_config(db, host, port, config).await?;

    Ok(())
}
