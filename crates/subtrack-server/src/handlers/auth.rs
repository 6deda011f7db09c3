//! Authentication-related handlers

use axum::{Extension, Json};
use serde::Serialize;

use crate::CurrentUser;

/// Response for the /api/me endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    /// The authenticated user's id
    pub id: String,
    pub email: Option<String>,
    /// How the user was authenticated
    pub auth_method: &'static str,
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        id: user.id,
        email: user.email,
        auth_method: user.method,
    })
}
