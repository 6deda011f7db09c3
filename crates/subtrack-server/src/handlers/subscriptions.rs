//! Subscription management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Extension, Json,
};
use chrono::Utc;
use tracing::info;

use super::read_json;
use crate::{AppError, AppState, CurrentUser, SuccessResponse};
use subtrack_core::models::{NewSubscription, Subscription, SubscriptionUpdate};

/// GET /api/subscriptions - List the user's subscriptions, newest first
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Subscription>>, AppError> {
    let subscriptions = state.db.list_subscriptions(&user.id)?;
    Ok(Json(subscriptions))
}

/// POST /api/subscriptions - Create a subscription
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<Subscription>, AppError> {
    let req: NewSubscription = read_json(request).await?;

    let subscription = state
        .db
        .create_subscription(&user.id, &req, Utc::now())
        .map_err(AppError::from_core)?;

    info!(user = %user.id, id = subscription.id, name = %subscription.name, "Created subscription");

    Ok(Json(subscription))
}

/// GET /api/subscriptions/:id - Get a specific subscription
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Subscription>, AppError> {
    let subscription = state
        .db
        .get_subscription(&user.id, id)?
        .ok_or_else(|| AppError::not_found("Subscription not found"))?;

    Ok(Json(subscription))
}

/// PATCH /api/subscriptions/:id - Update selected fields
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Subscription>, AppError> {
    let update: SubscriptionUpdate = read_json(request).await?;

    let subscription = state
        .db
        .update_subscription(&user.id, id, &update, Utc::now())
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Subscription not found"))?;

    info!(user = %user.id, id, "Updated subscription");

    Ok(Json(subscription))
}

/// DELETE /api/subscriptions/:id - Delete a subscription and its reminders
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_subscription(&user.id, id)? {
        return Err(AppError::not_found("Subscription not found"));
    }

    info!(user = %user.id, id, "Deleted subscription");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/subscriptions/:id/used - Record that the user just used the service
pub async fn mark_used(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Subscription>, AppError> {
    if !state.db.mark_subscription_used(&user.id, id, Utc::now())? {
        return Err(AppError::not_found("Subscription not found"));
    }

    let subscription = state
        .db
        .get_subscription(&user.id, id)?
        .ok_or_else(|| AppError::internal("Subscription not found after update"))?;

    Ok(Json(subscription))
}
