//! Renewal and trial reminder handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;

use crate::{AppError, AppState, CurrentUser, SuccessResponse};
use subtrack_core::models::Reminder;

/// GET /api/reminders - All reminders, soonest first
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Reminder>>, AppError> {
    Ok(Json(state.db.list_reminders(&user.id)?))
}

/// GET /api/reminders/upcoming - Unsent reminders due within the next week
pub async fn upcoming_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Reminder>>, AppError> {
    Ok(Json(state.db.upcoming_reminders(&user.id, Utc::now())?))
}

/// POST /api/reminders/:id/sent - Mark a reminder as delivered
pub async fn mark_reminder_sent(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.mark_reminder_sent(&user.id, id)? {
        return Err(AppError::not_found("Reminder not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}
