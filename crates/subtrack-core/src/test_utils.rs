//! Test utilities for subtrack-core
//!
//! Provides a mock hosted auth service so the real HTTP auth client can be
//! exercised in integration tests without network access.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::sync::oneshot;

/// Token the mock answers with a 500, for exercising provider failures
pub const MOCK_SERVER_ERROR_TOKEN: &str = "server-error";

#[derive(Clone, Default)]
struct MockAuthState {
    /// token -> (user id, email)
    users: HashMap<String, (String, Option<String>)>,
    /// Required `apikey` header value, if any
    api_key: Option<String>,
}

/// Mock hosted auth server for testing
pub struct MockAuthServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAuthServer {
    /// Start the mock server on an available port
    ///
    /// `users` maps bearer tokens to `(user_id, email)`.
    pub async fn start(users: &[(&str, &str, Option<&str>)]) -> Self {
        Self::start_with_api_key(users, None).await
    }

    /// Start a mock that also requires a matching `apikey` header
    pub async fn start_with_api_key(
        users: &[(&str, &str, Option<&str>)],
        api_key: Option<&str>,
    ) -> Self {
        let state = MockAuthState {
            users: users
                .iter()
                .map(|(token, id, email)| {
                    (
                        token.to_string(),
                        (id.to_string(), email.map(str::to_string)),
                    )
                })
                .collect(),
            api_key: api_key.map(str::to_string),
        };

        let app = Router::new()
            .route("/auth/v1/user", get(handle_user))
            .with_state(Arc::new(state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAuthServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Hosted auth "who am I" endpoint
async fn handle_user(State(state): State<Arc<MockAuthState>>, headers: HeaderMap) -> Response {
    if let Some(ref expected) = state.api_key {
        let provided = headers.get("apikey").and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid API key" })),
            )
                .into_response();
        }
    }

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    match token {
        Some(MOCK_SERVER_ERROR_TOKEN) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "unavailable" })),
        )
            .into_response(),
        Some(token) => match state.users.get(token) {
            Some((id, email)) => Json(json!({
                "id": id,
                "email": email,
                "aud": "authenticated",
                "role": "authenticated"
            }))
            .into_response(),
            None => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "invalid JWT" })),
            )
                .into_response(),
        },
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "missing token" })),
        )
            .into_response(),
    }
}
