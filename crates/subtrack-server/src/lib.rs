//! SubTrack Web Server
//!
//! Axum-based REST API for the SubTrack subscription tracker.
//!
//! Security features:
//! - Bearer token authentication (secure by default, use --no-auth for local dev)
//! - Static service tokens compared in constant time, or a hosted auth provider
//! - Restrictive CORS policy
//! - Every query scoped to the authenticated user
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use subtrack_core::auth::{AuthClient, AuthProvider, StaticTokenProvider};
use subtrack_core::db::Database;

mod handlers;

/// Maximum accepted JSON request body (1 MB)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// User id assigned to every request when authentication is disabled
pub const LOCAL_DEV_USER: &str = "local-dev";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Static bearer tokens for service accounts, checked before the provider
    pub api_tokens: StaticTokenProvider,
    /// Hosted provider that resolves user tokens
    pub auth_provider: Option<AuthClient>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_tokens: StaticTokenProvider::default(),
            auth_provider: None,
        }
    }
}

/// Parse a comma-separated list of CORS origins
pub fn parse_allowed_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// The authenticated caller, inserted into request extensions by `auth_middleware`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
    /// How the caller authenticated: "none", "api-token" or "hosted"
    pub method: &'static str,
}

impl CurrentUser {
    fn local_dev() -> Self {
        Self {
            id: LOCAL_DEV_USER.to_string(),
            email: None,
            method: "none",
        }
    }
}

/// Authentication middleware - resolves the bearer token to a user
///
/// # Security Notes
///
/// **Static tokens**: `SUBTRACK_API_TOKENS` entries are compared using
/// constant-time comparison and checked first.
///
/// **Hosted provider**: Any other token is sent to the configured auth service.
/// A rejection becomes 401 "Invalid token". When the provider cannot be reached
/// the request is also rejected, and the underlying error is logged.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        request.extensions_mut().insert(CurrentUser::local_dev());
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let Some(token) = token else {
        warn!(path = %request.uri().path(), "Unauthorized request - no bearer token");
        return AppError::unauthorized("Unauthorized").into_response();
    };

    match authenticate(&state.config, &token).await {
        Ok(user) => {
            debug!(user = %user.id, method = user.method, path = %request.uri().path(), "Authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            warn!(path = %request.uri().path(), "Unauthorized request - invalid token");
            err.into_response()
        }
    }
}

/// Try the static tokens, then the hosted provider
async fn authenticate(config: &ServerConfig, token: &str) -> Result<CurrentUser, AppError> {
    if let Ok(user) = config.api_tokens.verify_token(token).await {
        return Ok(CurrentUser {
            id: user.id,
            email: user.email,
            method: config.api_tokens.name(),
        });
    }

    let Some(ref provider) = config.auth_provider else {
        return Err(AppError::unauthorized("Invalid token"));
    };

    match provider.verify_token(token).await {
        Ok(user) => Ok(CurrentUser {
            id: user.id,
            email: user.email,
            method: provider.name(),
        }),
        Err(subtrack_core::Error::Auth(_)) => Err(AppError::unauthorized("Invalid token")),
        Err(e) => Err(AppError::unauthorized("Invalid token").with_internal(e)),
    }
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    if let Some(ref provider) = config.auth_provider {
        info!("Auth provider configured: {}", provider.name());
    }
    if !config.api_tokens.is_empty() {
        info!("{} static API token(s) configured", config.api_tokens.len());
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Receipt scanner
        .route("/receipt-scanner", post(handlers::receipt_scanner))
        // Browser extension
        .route(
            "/extension",
            get(handlers::extension_status).post(handlers::add_from_extension),
        )
        .route("/domains/match", post(handlers::match_domain))
        // Subscriptions
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route(
            "/subscriptions/:id",
            get(handlers::get_subscription)
                .patch(handlers::update_subscription)
                .delete(handlers::delete_subscription),
        )
        .route("/subscriptions/:id/used", post(handlers::mark_used))
        .route(
            "/subscriptions/:id/health",
            get(handlers::subscription_health),
        )
        .route(
            "/subscriptions/:id/cancellation",
            get(handlers::get_cancellation),
        )
        .route("/graveyard", get(handlers::get_graveyard))
        // Health
        .route("/health", get(handlers::portfolio_health))
        // Analytics
        .route("/analytics/spending", get(handlers::spending))
        .route("/analytics/insights", get(handlers::insights))
        // Reminders
        .route("/reminders", get(handlers::list_reminders))
        .route("/reminders/upcoming", get(handlers::upcoming_reminders))
        .route("/reminders/:id/sent", post(handlers::mark_reminder_sent));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server with the default (authenticated) configuration
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.auth_provider.is_none() && config.api_tokens.is_empty() {
        warn!("⚠️  No auth provider or API tokens configured - every request will be rejected");
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Attach an underlying error to be logged but not returned
    pub fn with_internal(mut self, err: impl Into<anyhow::Error>) -> Self {
        self.internal = Some(err.into());
        self
    }

    /// Map a core error, exposing validation messages to the client
    pub fn from_core(err: subtrack_core::Error) -> Self {
        match err {
            subtrack_core::Error::InvalidData(msg) => Self::bad_request(&msg),
            subtrack_core::Error::NotFound(msg) => Self::not_found(&msg),
            subtrack_core::Error::Auth(msg) => Self::unauthorized(&msg),
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
