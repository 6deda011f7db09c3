//! Browser extension handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Extension, Json,
};
use chrono::{Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::read_json;
use crate::{AppError, AppState, CurrentUser};
use subtrack_core::domains::{extension_note, DomainMatch};
use subtrack_core::models::{
    default_category, BillingCycle, CancellationDifficulty, NewSubscription, Subscription,
    SubscriptionStatus,
};

/// Request body for adding a subscription detected by the extension
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionAddRequest {
    pub service_name: Option<String>,
    pub domain: Option<String>,
    pub category: Option<String>,
    pub default_cost: Option<f64>,
    pub billing_cycle: Option<BillingCycle>,
}

/// Response for adding from the extension
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionAddResponse {
    pub success: bool,
    pub already_exists: bool,
    pub subscription: Subscription,
    pub message: String,
}

/// POST /api/extension - Add a subscription detected on a service's website
pub async fn add_from_extension(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<ExtensionAddResponse>, AppError> {
    let req: ExtensionAddRequest = read_json(request).await?;

    let service_name = req.service_name.as_deref().map(str::trim).unwrap_or("");
    let domain = req.domain.as_deref().map(str::trim).unwrap_or("");
    if service_name.is_empty() || domain.is_empty() {
        return Err(AppError::bad_request("Missing required fields"));
    }

    if let Some(existing) = state.db.find_subscription_by_name(&user.id, service_name)? {
        return Ok(Json(ExtensionAddResponse {
            success: true,
            already_exists: true,
            subscription: existing,
            message: format!("{} is already in your subscriptions", service_name),
        }));
    }

    let now = Utc::now();
    let renewal_date = now
        .date_naive()
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::internal("Renewal date out of range"))?;

    let new = NewSubscription {
        name: service_name.to_string(),
        category: req
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(default_category),
        cost: req.default_cost.unwrap_or(0.0),
        billing_cycle: req.billing_cycle.unwrap_or_default(),
        renewal_date,
        status: SubscriptionStatus::Active,
        trial_end_date: None,
        cancellation_difficulty: CancellationDifficulty::Medium,
        notes: Some(extension_note(domain)),
        logo_identifier: None,
        cancellation_link: None,
    };

    let subscription = state
        .db
        .create_subscription(&user.id, &new, now)
        .map_err(AppError::from_core)?;

    info!(user = %user.id, service = %service_name, domain = %domain, "Added subscription from extension");

    Ok(Json(ExtensionAddResponse {
        success: true,
        already_exists: false,
        subscription,
        message: format!("{} added to your subscriptions", service_name),
    }))
}

/// Subscription summary shown in the extension popup
#[derive(Serialize)]
pub struct ExtensionSubscription {
    pub name: String,
    pub category: String,
    pub cost: f64,
}

/// Response for the extension status endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionStatusResponse {
    pub success: bool,
    pub subscription_count: usize,
    pub subscriptions: Vec<ExtensionSubscription>,
}

/// GET /api/extension - Active and trial subscriptions for the extension popup
pub async fn extension_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ExtensionStatusResponse>, AppError> {
    let subscriptions: Vec<ExtensionSubscription> = state
        .db
        .list_subscriptions(&user.id)?
        .into_iter()
        .filter(|s| s.status.is_billable())
        .map(|s| ExtensionSubscription {
            name: s.name,
            category: s.category,
            cost: s.cost,
        })
        .collect();

    Ok(Json(ExtensionStatusResponse {
        success: true,
        subscription_count: subscriptions.len(),
        subscriptions,
    }))
}

/// Request body for domain matching
#[derive(Debug, Deserialize)]
pub struct DomainMatchRequest {
    pub url: Option<String>,
}

/// Response for domain matching
#[derive(Serialize)]
pub struct DomainMatchResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub matched: Option<DomainMatch>,
}

/// POST /api/domains/match - Identify the subscription service behind a URL
pub async fn match_domain(request: Request) -> Result<Json<DomainMatchResponse>, AppError> {
    let req: DomainMatchRequest = read_json(request).await?;
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("URL is required"))?;

    Ok(Json(DomainMatchResponse {
        success: true,
        matched: subtrack_core::domains::match_domain(url.trim()),
    }))
}
