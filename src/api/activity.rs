//! Activity chart endpoint

use axum::{extract::State, Json};

use crate::{models::ActivityReport, AppState};

/// Time buckets, totals, chart scale and recent entries
#[utoipa::path(
    get,
    path = "/activity",
    tag = "activity",
    responses(
        (status = 200, description = "Activity report", body = ActivityReport)
    )
)]
pub async fn get_activity(State(state): State<AppState>) -> Json<ActivityReport> {
    Json(state.services.dashboard.activity_report())
}
