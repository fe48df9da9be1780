//! CRUD and operational handlers for webhook endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthContext;
use crate::error::{ApiResult, NotifyError};
use crate::models::{
    Channel, ChannelDelivery, CreateEndpointRequest, DeliveryAttempt, EndpointListResponse,
    EndpointResponse, EndpointStatistics, EventTypeInfo, Notification, NotificationEventType,
    ToggleEndpointRequest, UpdateEndpointRequest,
};
use crate::router::NotificationsState;

/// Register a webhook endpoint.
#[utoipa::path(
    post,
    path = "/webhooks/endpoints",
    tag = "Webhooks",
    request_body = CreateEndpointRequest,
    responses(
        (status = 201, description = "Endpoint created", body = EndpointResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Endpoint limit exceeded"),
    )
)]
pub async fn create_endpoint_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateEndpointRequest>,
) -> ApiResult<(StatusCode, Json<EndpointResponse>)> {
    request
        .validate()
        .map_err(|e| NotifyError::Validation(e.to_string()))?;

    let response = state.registry.create(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's webhook endpoints.
#[utoipa::path(
    get,
    path = "/webhooks/endpoints",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Endpoint list", body = EndpointListResponse),
    )
)]
pub async fn list_endpoints_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<EndpointListResponse>> {
    let items = state.registry.list(auth.user_id).await?;
    let total = items.len();
    Ok(Json(EndpointListResponse { items, total }))
}

/// Aggregated statistics across the caller's endpoints.
#[utoipa::path(
    get,
    path = "/webhooks/endpoints/statistics",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Aggregated endpoint statistics", body = EndpointStatistics),
    )
)]
pub async fn statistics_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<EndpointStatistics>> {
    let stats = state.registry.statistics(auth.user_id).await?;
    Ok(Json(stats))
}

/// Get a single webhook endpoint.
#[utoipa::path(
    get,
    path = "/webhooks/endpoints/{id}",
    tag = "Webhooks",
    params(("id" = Uuid, Path, description = "Endpoint ID")),
    responses(
        (status = 200, description = "Endpoint details", body = EndpointResponse),
        (status = 404, description = "Endpoint not found"),
    )
)]
pub async fn get_endpoint_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EndpointResponse>> {
    let response = state.registry.get(auth.user_id, id).await?;
    Ok(Json(response))
}

/// Update a webhook endpoint.
#[utoipa::path(
    patch,
    path = "/webhooks/endpoints/{id}",
    tag = "Webhooks",
    params(("id" = Uuid, Path, description = "Endpoint ID")),
    request_body = UpdateEndpointRequest,
    responses(
        (status = 200, description = "Endpoint updated", body = EndpointResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Endpoint not found"),
    )
)]
pub async fn update_endpoint_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEndpointRequest>,
) -> ApiResult<Json<EndpointResponse>> {
    request
        .validate()
        .map_err(|e| NotifyError::Validation(e.to_string()))?;

    let response = state.registry.update(auth.user_id, id, request).await?;
    Ok(Json(response))
}

/// Enable or pause a webhook endpoint.
#[utoipa::path(
    post,
    path = "/webhooks/endpoints/{id}/toggle",
    tag = "Webhooks",
    params(("id" = Uuid, Path, description = "Endpoint ID")),
    request_body = ToggleEndpointRequest,
    responses(
        (status = 200, description = "Endpoint toggled", body = EndpointResponse),
        (status = 404, description = "Endpoint not found"),
    )
)]
pub async fn toggle_endpoint_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<ToggleEndpointRequest>,
) -> ApiResult<Json<EndpointResponse>> {
    let response = state
        .registry
        .toggle_active(auth.user_id, id, request.is_active)
        .await?;
    Ok(Json(response))
}

/// Delete a webhook endpoint.
#[utoipa::path(
    delete,
    path = "/webhooks/endpoints/{id}",
    tag = "Webhooks",
    params(("id" = Uuid, Path, description = "Endpoint ID")),
    responses(
        (status = 204, description = "Endpoint deleted"),
        (status = 404, description = "Endpoint not found"),
    )
)]
pub async fn delete_endpoint_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.registry.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fire a synthetic event at one endpoint and return the outcome.
#[utoipa::path(
    post,
    path = "/webhooks/endpoints/{id}/test",
    tag = "Webhooks",
    params(("id" = Uuid, Path, description = "Endpoint ID")),
    responses(
        (status = 200, description = "Delivery outcome", body = DeliveryAttempt),
        (status = 404, description = "Endpoint not found"),
    )
)]
pub async fn test_endpoint_handler(
    State(state): State<NotificationsState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeliveryAttempt>> {
    let endpoint = state
        .registry
        .find(auth.user_id, id)
        .await?
        .ok_or(NotifyError::EndpointNotFound)?;

    let notification = test_notification(auth.user_id);
    let outcome = state.engine.deliver(&endpoint, &notification).await;
    Ok(Json(outcome.attempt))
}

/// List the event vocabulary endpoints can subscribe to.
#[utoipa::path(
    get,
    path = "/webhooks/event-types",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Known event types", body = [EventTypeInfo]),
    )
)]
pub async fn list_event_types_handler() -> Json<Vec<EventTypeInfo>> {
    let items = NotificationEventType::all()
        .iter()
        .map(|et| EventTypeInfo {
            name: et.as_str().to_string(),
            category: et.category().as_str().to_string(),
            default_priority: et.default_priority().as_str().to_string(),
        })
        .collect();
    Json(items)
}

/// A synthetic notification used by the test-fire route. Not persisted.
fn test_notification(user_id: Uuid) -> Notification {
    let now = Utc::now();
    let event_type = NotificationEventType::SystemUpdate;
    Notification {
        id: Uuid::new_v4(),
        user_id,
        event_type,
        category: event_type.category(),
        priority: event_type.default_priority(),
        title: "Webhook test".to_string(),
        message: "This is a test delivery for your webhook endpoint.".to_string(),
        data: serde_json::json!({ "test": true }),
        channels: vec![Channel::Webhook],
        deliveries: vec![ChannelDelivery::pending(Channel::Webhook)],
        is_read: false,
        read_at: None,
        is_archived: false,
        archived_at: None,
        expires_at: None,
        group_key: None,
        source: None,
        created_at: now,
        updated_at: now,
    }
}
