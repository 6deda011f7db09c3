//! Spending analytics handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::{AppError, AppState, CurrentUser};
use subtrack_core::analytics::{
    generate_insights, monthly_total, spending_by_category, CategorySpend, Insight,
};

/// Spending summary response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingResponse {
    pub success: bool,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub categories: Vec<CategorySpend>,
}

/// GET /api/analytics/spending - Monthly spend overall and per category
pub async fn spending(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<SpendingResponse>, AppError> {
    let subscriptions = state.db.list_subscriptions(&user.id)?;
    let monthly = monthly_total(&subscriptions);

    Ok(Json(SpendingResponse {
        success: true,
        monthly_total: round_cents(monthly),
        yearly_total: round_cents(monthly * 12.0),
        categories: spending_by_category(&subscriptions),
    }))
}

/// Insights response
#[derive(Serialize)]
pub struct InsightsResponse {
    pub success: bool,
    pub insights: Vec<Insight>,
}

/// GET /api/analytics/insights - Observations about the user's spending
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<InsightsResponse>, AppError> {
    let subscriptions = state.db.list_subscriptions(&user.id)?;

    Ok(Json(InsightsResponse {
        success: true,
        insights: generate_insights(&subscriptions, Utc::now()),
    }))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
