//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activity, auth, filters, health, logs, notifications, sources, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Feedboard API",
        version = "1.0.0",
        description = "Feed source administration dashboard REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        // Sources
        sources::list_sources,
        sources::create_source,
        sources::source_stats,
        sources::get_source,
        sources::update_source,
        sources::delete_source,
        sources::set_enabled,
        // Filters
        filters::get_filters,
        filters::set_filters,
        filters::reset_filters,
        // Activity & logs
        activity::get_activity,
        logs::list_logs,
        logs::export_logs,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::clear_notifications,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::UserIdentity,
            auth::UserInfo,
            auth::LoginResponse,
            // Sources
            crate::models::source::SourceRecord,
            crate::models::source::CreateSource,
            crate::models::source::UpdateSource,
            crate::models::source::SetEnabled,
            crate::models::source::SourceStats,
            sources::CreatedSource,
            // Filters
            crate::models::filter::FilterCriteria,
            crate::models::filter::CriteriaUpdate,
            crate::models::filter::FilterState,
            crate::models::filter::FilteredView,
            crate::models::filter::CountInfo,
            crate::models::filter::EmptyReason,
            crate::models::filter::StatusFilter,
            crate::models::filter::SortKey,
            // Activity & logs
            crate::models::activity::ActivityBucket,
            crate::models::activity::ActivitySummary,
            crate::models::activity::ActivityFeedItem,
            crate::models::activity::ActivityReport,
            crate::models::log::LogEntry,
            crate::models::log::LogType,
            crate::models::log::ActivityCategory,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationList,
            notifications::UnreadCount,
            // Stats
            crate::models::telemetry::DashboardStats,
            crate::models::telemetry::PerformanceSample,
            crate::models::telemetry::LoadLevel,
            crate::models::telemetry::ResourceLoad,
            crate::models::telemetry::TelemetryReport,
            stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "sources", description = "Feed source management"),
        (name = "filters", description = "Search, filter and sort criteria"),
        (name = "activity", description = "Activity chart"),
        (name = "logs", description = "Activity log"),
        (name = "notifications", description = "Notification feed"),
        (name = "stats", description = "Statistics and telemetry")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
