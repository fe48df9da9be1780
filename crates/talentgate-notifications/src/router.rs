//! Axum router setup for the notification and webhook routes.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::audit::AuditSink;
use crate::error::NotifyError;
use crate::handlers::{endpoints, notifications, preferences};
use crate::services::{
    DeliveryEngine, EndpointRegistry, NotificationDispatcher, NotificationService,
    PreferenceService,
};
use crate::store::{EndpointStore, NotificationStore, PreferenceStore};

/// Shared state for notification and webhook handlers.
#[derive(Clone)]
pub struct NotificationsState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub notifications: Arc<NotificationService>,
    pub registry: Arc<EndpointRegistry>,
    pub preferences: Arc<PreferenceService>,
    pub engine: Arc<DeliveryEngine>,
}

impl NotificationsState {
    /// Wire up the full service graph from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the delivery engine's HTTP client cannot be built.
    pub fn new(
        notification_store: Arc<dyn NotificationStore>,
        endpoint_store: Arc<dyn EndpointStore>,
        preference_store: Arc<dyn PreferenceStore>,
        audit: Arc<dyn AuditSink>,
        encryption_key: Vec<u8>,
        allow_http: bool,
    ) -> Result<Self, NotifyError> {
        let registry = Arc::new(
            EndpointRegistry::new(endpoint_store, encryption_key.clone())
                .with_allow_http(allow_http),
        );
        let engine = Arc::new(DeliveryEngine::new(
            Arc::clone(&registry),
            Arc::clone(&audit),
            encryption_key,
        )?);
        let preferences = Arc::new(PreferenceService::new(preference_store, audit));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::clone(&notification_store),
            Arc::clone(&preferences),
            Arc::clone(&registry),
            Arc::clone(&engine),
        ));
        let notifications = Arc::new(NotificationService::new(notification_store));

        Ok(Self {
            dispatcher,
            notifications,
            registry,
            preferences,
            engine,
        })
    }
}

/// Creates the notifications router with all routes.
pub fn notifications_router(state: NotificationsState) -> Router {
    Router::new()
        // Notification dispatch and queries
        .route(
            "/notifications",
            post(notifications::dispatch_handler).get(notifications::list_handler),
        )
        .route("/notifications/summary", get(notifications::summary_handler))
        .route(
            "/notifications/read-all",
            post(notifications::mark_all_read_handler),
        )
        .route(
            "/notifications/bulk-delete",
            post(notifications::bulk_delete_handler),
        )
        // Preferences (static segments, registered before the {id} capture)
        .route(
            "/notifications/preferences",
            get(preferences::get_preferences_handler).put(preferences::update_preferences_handler),
        )
        .route(
            "/notifications/preferences/categories",
            axum::routing::put(preferences::update_category_preferences_handler),
        )
        .route(
            "/notifications/preferences/reset",
            post(preferences::reset_preferences_handler),
        )
        .route(
            "/notifications/{id}",
            get(notifications::get_handler).delete(notifications::delete_handler),
        )
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read_handler),
        )
        .route(
            "/notifications/{id}/archive",
            post(notifications::archive_handler),
        )
        // Webhook endpoint CRUD and operations
        .route(
            "/webhooks/endpoints",
            post(endpoints::create_endpoint_handler).get(endpoints::list_endpoints_handler),
        )
        .route(
            "/webhooks/endpoints/statistics",
            get(endpoints::statistics_handler),
        )
        .route(
            "/webhooks/endpoints/{id}",
            get(endpoints::get_endpoint_handler)
                .patch(endpoints::update_endpoint_handler)
                .delete(endpoints::delete_endpoint_handler),
        )
        .route(
            "/webhooks/endpoints/{id}/toggle",
            post(endpoints::toggle_endpoint_handler),
        )
        .route(
            "/webhooks/endpoints/{id}/test",
            post(endpoints::test_endpoint_handler),
        )
        .route(
            "/webhooks/event-types",
            get(endpoints::list_event_types_handler),
        )
        .with_state(state)
}
