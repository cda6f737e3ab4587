//! Sources API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        source::{CreateSource, SetEnabled, SourceRecord, SourceStats, UpdateSource},
        FilteredView,
    },
    AppState,
};

use super::CurrentUser;

#[derive(Serialize, ToSchema)]
pub struct CreatedSource {
    /// Id derived from the source name
    pub id: String,
}

/// Current filtered and sorted view of the sources
#[utoipa::path(
    get,
    path = "/sources",
    tag = "sources",
    responses(
        (status = 200, description = "Visible sources with counters", body = FilteredView)
    )
)]
pub async fn list_sources(State(state): State<AppState>) -> Json<FilteredView> {
    Json(state.services.dashboard.filtered_view())
}

/// Create a source
#[utoipa::path(
    post,
    path = "/sources",
    tag = "sources",
    request_body = CreateSource,
    responses(
        (status = 201, description = "Source created", body = CreatedSource),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 409, description = "A source with this id already exists", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_source(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(data): Json<CreateSource>,
) -> AppResult<(StatusCode, Json<CreatedSource>)> {
    let id = state.services.records.add_source(data).await?;
    Ok((StatusCode::CREATED, Json(CreatedSource { id })))
}

/// Source counters
#[utoipa::path(
    get,
    path = "/sources/stats",
    tag = "sources",
    responses(
        (status = 200, description = "Source statistics", body = SourceStats)
    )
)]
pub async fn source_stats(State(state): State<AppState>) -> Json<SourceStats> {
    Json(state.services.records.source_stats())
}

/// Get source by id
#[utoipa::path(
    get,
    path = "/sources/{id}",
    tag = "sources",
    params(("id" = String, Path, description = "Source id")),
    responses(
        (status = 200, description = "Source details", body = SourceRecord),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SourceRecord>> {
    Ok(Json(state.services.records.source(&id)?))
}

/// Update a source
#[utoipa::path(
    put,
    path = "/sources/{id}",
    tag = "sources",
    params(("id" = String, Path, description = "Source id")),
    request_body = UpdateSource,
    responses(
        (status = 204, description = "Source updated"),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_source(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateSource>,
) -> AppResult<StatusCode> {
    state.services.records.update_source(&id, data).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a source
#[utoipa::path(
    delete,
    path = "/sources/{id}",
    tag = "sources",
    params(("id" = String, Path, description = "Source id")),
    responses(
        (status = 204, description = "Source deleted"),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_source(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.records.delete_source(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enable or disable a source
#[utoipa::path(
    put,
    path = "/sources/{id}/enabled",
    tag = "sources",
    params(("id" = String, Path, description = "Source id")),
    request_body = SetEnabled,
    responses(
        (status = 204, description = "Source toggled"),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_enabled(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
    Json(data): Json<SetEnabled>,
) -> AppResult<StatusCode> {
    state.services.records.set_enabled(&id, data.enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}
