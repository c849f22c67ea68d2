//! Per-user metadata source settings endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::settings::{ApiSettingsView, UpdateApiSettings},
    AppState,
};

use super::AuthenticatedUser;

/// The caller's metadata source settings, keys masked
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = ApiSettingsView)
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ApiSettingsView>> {
    let settings = state.services.settings.get_settings(claims.user_id).await?;
    Ok(Json(settings))
}

/// Update the caller's metadata source settings.
///
/// Omitted fields keep their stored value; empty strings clear them.
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = UpdateApiSettings,
    responses(
        (status = 200, description = "Updated settings", body = ApiSettingsView)
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateApiSettings>,
) -> AppResult<Json<ApiSettingsView>> {
    let settings = state
        .services
        .settings
        .update_settings(claims.user_id, request)
        .await?;
    Ok(Json(settings))
}
