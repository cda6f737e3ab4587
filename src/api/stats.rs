//! Dashboard statistics endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::{DashboardStats, SourceStats, TelemetryReport},
    AppState,
};

/// Statistics response
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// Last values stored in the `stats` node
    pub stored: DashboardStats,
    /// Source counters
    pub sources: SourceStats,
    /// Local performance monitor
    pub telemetry: TelemetryReport,
}

/// Get dashboard statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stored: state.services.dashboard.stats(),
        sources: state.services.records.source_stats(),
        telemetry: state.services.monitor.report(),
    })
}
