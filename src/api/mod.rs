//! API handlers for the Feedboard REST endpoints

pub mod activity;
pub mod auth;
pub mod filters;
pub mod health;
pub mod logs;
pub mod notifications;
pub mod openapi;
pub mod sources;
pub mod stats;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::UserIdentity, AppState};

/// Extractor for the signed-in dashboard user, from the session bearer token
pub struct CurrentUser(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Sign in required".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Authentication("Invalid authorization header format".to_string())
        })?;

        state.services.auth.authenticate(token).map(CurrentUser)
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Sources
        .route("/sources", get(sources::list_sources).post(sources::create_source))
        .route("/sources/stats", get(sources::source_stats))
        .route(
            "/sources/:id",
            get(sources::get_source)
                .put(sources::update_source)
                .delete(sources::delete_source),
        )
        .route("/sources/:id/enabled", put(sources::set_enabled))
        // Filters
        .route("/filters", get(filters::get_filters).put(filters::set_filters))
        .route("/filters/reset", post(filters::reset_filters))
        // Activity & logs
        .route("/activity", get(activity::get_activity))
        .route("/logs", get(logs::list_logs))
        .route("/logs/export", get(logs::export_logs))
        // Notifications
        .route(
            "/notifications",
            get(notifications::list_notifications).delete(notifications::clear_notifications),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
