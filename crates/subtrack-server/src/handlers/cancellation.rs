//! Cancellation help and cancelled-subscription handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::{AppError, AppState, CurrentUser};
use subtrack_core::cancellation::{cancellation_email, graveyard, CancellationEmail, Graveyard};

/// Response for a drafted cancellation request
#[derive(Serialize)]
pub struct CancellationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub email: CancellationEmail,
}

/// GET /api/subscriptions/:id/cancellation - Draft a cancellation request email
pub async fn get_cancellation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<CancellationResponse>, AppError> {
    let subscription = state
        .db
        .get_subscription(&user.id, id)?
        .ok_or_else(|| AppError::not_found("Subscription not found"))?;

    Ok(Json(CancellationResponse {
        success: true,
        email: cancellation_email(&subscription),
    }))
}

/// Response for the graveyard
#[derive(Serialize)]
pub struct GraveyardResponse {
    pub success: bool,
    #[serde(flatten)]
    pub graveyard: Graveyard,
}

/// GET /api/graveyard - Cancelled subscriptions and what they have saved
pub async fn get_graveyard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<GraveyardResponse>, AppError> {
    let subscriptions = state.db.list_subscriptions(&user.id)?;

    Ok(Json(GraveyardResponse {
        success: true,
        graveyard: graveyard(&subscriptions),
    }))
}
