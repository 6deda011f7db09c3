//! Bearer token verification
//!
//! The HTTP API identifies users by validating their bearer token with an
//! authentication provider. Two providers exist:
//!
//! - `HostedAuthProvider`: asks a hosted auth service (`GET /auth/v1/user`)
//!   who the token belongs to
//! - `StaticTokenProvider`: fixed `token=user_id` pairs for service accounts
//!   and local automation
//!
//! # Configuration
//!
//! Environment variables:
//! - `SUBTRACK_AUTH_URL`: base URL of the hosted auth service
//! - `SUBTRACK_AUTH_API_KEY`: project API key sent as the `apikey` header (optional)
//! - `SUBTRACK_API_TOKENS`: comma-separated `token=user_id` pairs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Timeout for a single token lookup against the hosted provider
const AUTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity behind a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Something that can turn a bearer token into a user
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the token's owner, or `Error::Auth` if the token is not valid
    async fn verify_token(&self, token: &str) -> Result<AuthUser>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Hosted authentication service client
#[derive(Clone)]
pub struct HostedAuthProvider {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HostedAuthProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Create from `SUBTRACK_AUTH_URL` / `SUBTRACK_AUTH_API_KEY`
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUBTRACK_AUTH_URL").ok()?;
        let api_key = std::env::var("SUBTRACK_AUTH_API_KEY").ok();
        Some(Self::new(&url, api_key))
    }
}

#[async_trait]
impl AuthProvider for HostedAuthProvider {
    async fn verify_token(&self, token: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .timeout(AUTH_REQUEST_TIMEOUT);
        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(status = %status, "Auth provider rejected token");
            return Err(Error::Auth("Invalid token".into()));
        }
        if !status.is_success() {
            warn!(status = %status, "Auth provider returned unexpected status");
        }

        let user: AuthUser = response.error_for_status()?.json().await?;
        if user.id.is_empty() {
            return Err(Error::Auth("Invalid token".into()));
        }
        Ok(user)
    }

    fn name(&self) -> &'static str {
        "hosted"
    }
}

/// Fixed bearer tokens mapped to user ids
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    tokens: Vec<(String, String)>,
}

impl StaticTokenProvider {
    pub fn new(tokens: Vec<(String, String)>) -> Self {
        Self { tokens }
    }

    /// Parse `token=user_id` pairs separated by commas
    ///
    /// Entries without `=` or with an empty side are skipped with a warning.
    pub fn parse(input: &str) -> Self {
        let tokens = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|entry| match entry.split_once('=') {
                Some((token, user)) if !token.trim().is_empty() && !user.trim().is_empty() => {
                    Some((token.trim().to_string(), user.trim().to_string()))
                }
                _ => {
                    warn!("Ignoring malformed API token entry (expected token=user_id)");
                    None
                }
            })
            .collect();
        Self { tokens }
    }

    /// Create from `SUBTRACK_API_TOKENS`
    pub fn from_env() -> Option<Self> {
        let raw = std::env::var("SUBTRACK_API_TOKENS").ok()?;
        let provider = Self::parse(&raw);
        (!provider.is_empty()).then_some(provider)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Constant-time lookup of the user owning `provided`
    fn lookup(&self, provided: &str) -> Option<&str> {
        let provided = provided.as_bytes();
        let mut found = None;
        // Check every entry so timing does not reveal which one matched
        for (token, user) in &self.tokens {
            let token = token.as_bytes();
            if token.len() == provided.len() && bool::from(token.ct_eq(provided)) {
                found = Some(user.as_str());
            }
        }
        found
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn verify_token(&self, token: &str) -> Result<AuthUser> {
        self.lookup(token)
            .map(|user| AuthUser {
                id: user.to_string(),
                email: None,
            })
            .ok_or_else(|| Error::Auth("Invalid token".into()))
    }

    fn name(&self) -> &'static str {
        "api-token"
    }
}

/// Concrete auth client
///
/// Provides Clone and static dispatch over the provider implementations.
#[derive(Clone)]
pub enum AuthClient {
    Hosted(HostedAuthProvider),
    Static(StaticTokenProvider),
}

impl AuthClient {
    /// Create the hosted provider client from the environment, if configured
    pub fn from_env() -> Option<Self> {
        HostedAuthProvider::from_env().map(AuthClient::Hosted)
    }

    pub fn hosted(base_url: &str, api_key: Option<String>) -> Self {
        AuthClient::Hosted(HostedAuthProvider::new(base_url, api_key))
    }
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn verify_token(&self, token: &str) -> Result<AuthUser> {
        match self {
            AuthClient::Hosted(p) => p.verify_token(token).await,
            AuthClient::Static(p) => p.verify_token(token).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AuthClient::Hosted(p) => p.name(),
            AuthClient::Static(p) => p.name(),
        }
    }
}
