//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, UserIdentity},
    AppState,
};

use super::CurrentUser;

/// Signed-in user with the label shown in the header
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(flatten)]
    pub user: UserIdentity,
    pub display_label: String,
}

/// Login response with the bearer token for later requests
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

impl From<UserIdentity> for UserInfo {
    fn from(user: UserIdentity) -> Self {
        Self {
            display_label: user.display_label(),
            user,
        }
    }
}

/// Sign in with e-mail and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Missing e-mail or password", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state.services.auth.sign_in(&request.email, &request.password)?;
    Ok(Json(LoginResponse {
        token: session.token,
        user: session.user.into(),
    }))
}

/// Sign out the current user
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(State(state): State<AppState>, _user: CurrentUser) -> StatusCode {
    state.services.auth.sign_out();
    StatusCode::NO_CONTENT
}

/// Current user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Signed-in user", body = UserInfo),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
    Json(user.into())
}
