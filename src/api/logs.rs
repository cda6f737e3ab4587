//! Log listing and export endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::LogEntry,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogsQuery {
    /// Maximum number of entries (default: the whole cached window)
    pub limit: Option<usize>,
}

/// Cached log entries, newest first
#[utoipa::path(
    get,
    path = "/logs",
    tag = "logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Log entries", body = Vec<LogEntry>)
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<Vec<LogEntry>> {
    let mut logs = state.services.dashboard.logs();
    if let Some(limit) = query.limit {
        logs.truncate(limit);
    }
    Json(logs)
}

/// Download the cached log window as a JSON file
#[utoipa::path(
    get,
    path = "/logs/export",
    tag = "logs",
    responses(
        (status = 200, description = "JSON attachment", content_type = "application/json", body = Vec<LogEntry>)
    )
)]
pub async fn export_logs(State(state): State<AppState>) -> AppResult<Response> {
    let logs = state.services.dashboard.logs();
    let json = serde_json::to_string_pretty(&logs)
        .map_err(|e| AppError::Internal(format!("Failed to export logs: {}", e)))?;
    let filename = format!("server-logs-{}.json", state.services.clock.now_millis());
    tracing::info!(count = logs.len(), filename = %filename, "Logs exported");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        json,
    )
        .into_response())
}
