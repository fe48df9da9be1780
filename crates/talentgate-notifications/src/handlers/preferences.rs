//! Handlers for per-user notification preferences.

use axum::{extract::State, Extension, Json};

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::models::{
    PreferencesResponse, UpdateCategoryPreferencesRequest, UpdatePreferencesRequest,
};
use crate::router::NotificationsState;

/// Get the caller's preferences, creating defaults on first access.
#[utoipa::path(
    get,
    path = "/notifications/preferences",
    tag = "Preferences",
    responses(
        (status = 200, description = "Current preferences", body = PreferencesResponse),
    )
)]
pub async fn get_preferences_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PreferencesResponse>> {
    let prefs = state.preferences.get_or_default(auth.user_id).await?;
    Ok(Json(prefs.into()))
}

/// Shallow-merge update to the caller's preferences.
#[utoipa::path(
    put,
    path = "/notifications/preferences",
    tag = "Preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Updated preferences", body = PreferencesResponse),
    )
)]
pub async fn update_preferences_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> ApiResult<Json<PreferencesResponse>> {
    let response = state.preferences.update(auth.user_id, request).await?;
    Ok(Json(response))
}

/// Replace the channel override for one category.
#[utoipa::path(
    put,
    path = "/notifications/preferences/categories",
    tag = "Preferences",
    request_body = UpdateCategoryPreferencesRequest,
    responses(
        (status = 200, description = "Updated preferences", body = PreferencesResponse),
        (status = 400, description = "Unknown category or channel"),
    )
)]
pub async fn update_category_preferences_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateCategoryPreferencesRequest>,
) -> ApiResult<Json<PreferencesResponse>> {
    let response = state
        .preferences
        .update_category(auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// Reset the caller's preferences to system defaults.
#[utoipa::path(
    post,
    path = "/notifications/preferences/reset",
    tag = "Preferences",
    responses(
        (status = 200, description = "Preferences reset", body = PreferencesResponse),
    )
)]
pub async fn reset_preferences_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PreferencesResponse>> {
    let response = state.preferences.reset(auth.user_id).await?;
    Ok(Json(response))
}
