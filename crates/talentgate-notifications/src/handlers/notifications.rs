//! Handlers for notification listing, state changes, and dispatch.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthContext;
use crate::error::{ApiResult, NotifyError};
use crate::models::{
    BulkActionResponse, BulkDeleteRequest, CreateNotification, ListNotificationsQuery,
    NotificationListResponse, NotificationResponse, NotificationSummary,
};
use crate::router::NotificationsState;

/// Dispatch a notification-worthy event.
///
/// Returns 201 with the created notification, or 204 when the recipient's
/// preferences route it to no channel at all.
#[utoipa::path(
    post,
    path = "/notifications",
    tag = "Notifications",
    request_body = CreateNotification,
    responses(
        (status = 201, description = "Notification created", body = NotificationResponse),
        (status = 204, description = "Recipient opted out of all channels"),
        (status = 400, description = "Validation error"),
    )
)]
pub async fn dispatch_handler(
    State(state): State<NotificationsState>,
    Json(request): Json<CreateNotification>,
) -> ApiResult<Response> {
    request
        .validate()
        .map_err(|e| NotifyError::Validation(e.to_string()))?;

    match state.dispatcher.dispatch(request).await? {
        Some(notification) => Ok((
            StatusCode::CREATED,
            Json(NotificationResponse::from(notification)),
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// List the caller's notifications.
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "Paginated notification list", body = NotificationListResponse),
    )
)]
pub async fn list_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<NotificationListResponse>> {
    let response = state.notifications.list(auth.user_id, query).await?;
    Ok(Json(response))
}

/// Badge counts for the caller.
#[utoipa::path(
    get,
    path = "/notifications/summary",
    tag = "Notifications",
    responses(
        (status = 200, description = "Unread/total counts and buckets", body = NotificationSummary),
    )
)]
pub async fn summary_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<NotificationSummary>> {
    let response = state.notifications.summary(auth.user_id).await?;
    Ok(Json(response))
}

/// Get a single notification.
#[utoipa::path(
    get,
    path = "/notifications/{id}",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification details", body = NotificationResponse),
        (status = 404, description = "Notification not found"),
    )
)]
pub async fn get_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let response = state.notifications.get(auth.user_id, id).await?;
    Ok(Json(response))
}

/// Mark one notification read. Idempotent.
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 404, description = "Notification not found"),
    )
)]
pub async fn mark_read_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let response = state.notifications.mark_read(auth.user_id, id).await?;
    Ok(Json(response))
}

/// Mark all of the caller's notifications read.
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number of notifications marked", body = BulkActionResponse),
    )
)]
pub async fn mark_all_read_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BulkActionResponse>> {
    let affected = state.notifications.mark_all_read(auth.user_id).await?;
    Ok(Json(BulkActionResponse { affected }))
}

/// Archive a notification.
#[utoipa::path(
    post,
    path = "/notifications/{id}/archive",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification archived", body = NotificationResponse),
        (status = 404, description = "Notification not found"),
    )
)]
pub async fn archive_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let response = state
        .notifications
        .set_archived(auth.user_id, id, true)
        .await?;
    Ok(Json(response))
}

/// Delete a notification.
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found"),
    )
)]
pub async fn delete_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.notifications.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk delete. Every id must belong to the caller.
#[utoipa::path(
    post,
    path = "/notifications/bulk-delete",
    tag = "Notifications",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Number of notifications deleted", body = BulkActionResponse),
        (status = 400, description = "Validation error"),
    )
)]
pub async fn bulk_delete_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkActionResponse>> {
    let affected = state
        .notifications
        .bulk_delete(auth.user_id, &request.ids)
        .await?;
    Ok(Json(BulkActionResponse { affected }))
}
