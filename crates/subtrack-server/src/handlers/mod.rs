//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod auth;
pub mod cancellation;
pub mod extension;
pub mod health;
pub mod receipts;
pub mod reminders;
pub mod subscriptions;

// Re-export all handlers for use in router
pub use analytics::*;
pub use auth::*;
pub use cancellation::*;
pub use extension::*;
pub use health::*;
pub use receipts::*;
pub use reminders::*;
pub use subscriptions::*;

use axum::extract::Request;
use serde::de::DeserializeOwned;

use crate::{AppError, MAX_BODY_SIZE};

/// Read and deserialize a JSON request body
///
/// Oversized or unreadable bodies and malformed JSON are 400s.
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}
