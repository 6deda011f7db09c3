//! Subscription health handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::{AppError, AppState, CurrentUser};
use subtrack_core::health::{
    calculate_health_score, calculate_portfolio_health, HealthScoreResult, PortfolioHealth,
};

/// GET /api/subscriptions/:id/health - Score one subscription against the user's others
pub async fn subscription_health(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<HealthScoreResult>, AppError> {
    let all = state.db.list_subscriptions(&user.id)?;
    let subscription = all
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::not_found("Subscription not found"))?;

    Ok(Json(calculate_health_score(subscription, &all)))
}

/// GET /api/health - Aggregate health of the user's active subscriptions
pub async fn portfolio_health(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<PortfolioHealth>, AppError> {
    let all = state.db.list_subscriptions(&user.id)?;
    Ok(Json(calculate_portfolio_health(&all)))
}
