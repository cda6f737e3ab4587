//! Notification feed endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::NotificationList,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClearQuery {
    /// Must be `true` to clear the feed
    pub confirm: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: usize,
}

/// Notifications, most recent first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Notification feed", body = NotificationList)
    )
)]
pub async fn list_notifications(State(state): State<AppState>) -> Json<NotificationList> {
    Json(state.services.dashboard.notifications())
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(("id" = String, Path, description = "Log entry id")),
    responses(
        (status = 200, description = "Remaining unread count", body = UnreadCount)
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<UnreadCount> {
    Json(UnreadCount {
        unread_count: state.services.dashboard.mark_read(&id),
    })
}

/// Mark every notification as read
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 204, description = "All read")
    )
)]
pub async fn mark_all_read(State(state): State<AppState>) -> StatusCode {
    state.services.dashboard.mark_all_read();
    StatusCode::NO_CONTENT
}

/// Clear the feed; requires `confirm=true`
#[utoipa::path(
    delete,
    path = "/notifications",
    tag = "notifications",
    params(ClearQuery),
    responses(
        (status = 204, description = "Feed cleared"),
        (status = 400, description = "Confirmation missing", body = crate::error::ErrorResponse)
    )
)]
pub async fn clear_notifications(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> AppResult<StatusCode> {
    let confirmed = query.confirm.unwrap_or(false);
    if state
        .services
        .dashboard
        .clear_notifications(|_: &str| confirmed)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::BadRequest(
            "Clearing notifications requires confirm=true".to_string(),
        ))
    }
}
