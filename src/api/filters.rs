//! Search, filter and sort criteria endpoints

use axum::{extract::State, Json};

use crate::{
    models::{CriteriaUpdate, FilterCriteria, FilterState, FilteredView},
    AppState,
};

/// Current criteria and selectable regions
#[utoipa::path(
    get,
    path = "/filters",
    tag = "filters",
    responses(
        (status = 200, description = "Filter state", body = FilterState)
    )
)]
pub async fn get_filters(State(state): State<AppState>) -> Json<FilterState> {
    Json(state.services.dashboard.filter_state())
}

/// Change some criteria; omitted fields keep their value
#[utoipa::path(
    put,
    path = "/filters",
    tag = "filters",
    request_body = CriteriaUpdate,
    responses(
        (status = 200, description = "Recomputed view", body = FilteredView)
    )
)]
pub async fn set_filters(
    State(state): State<AppState>,
    Json(update): Json<CriteriaUpdate>,
) -> Json<FilteredView> {
    Json(state.services.dashboard.set_criteria(update))
}

/// Restore the default criteria
#[utoipa::path(
    post,
    path = "/filters/reset",
    tag = "filters",
    responses(
        (status = 200, description = "Default criteria", body = FilterCriteria)
    )
)]
pub async fn reset_filters(State(state): State<AppState>) -> Json<FilterCriteria> {
    Json(state.services.dashboard.reset_filters())
}
