//! Notification dispatcher.
//!
//! Orchestrates creation and multi-channel fan-out for one event: derives
//! category/priority, resolves channels through preferences, persists the
//! notification, and hands the webhook channel to the delivery engine as
//! detached per-endpoint tasks. Dispatch succeeds once the notification
//! record persists; channel delivery failures never reach the caller.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::NotifyError;
use crate::models::{
    Channel, ChannelDelivery, ChannelDeliveryStatus, ChannelOutcome, CreateNotification,
    Notification, WebhookEndpoint,
};
use crate::services::delivery::{DeliveryEngine, DELIVERY_TARGET};
use crate::services::preferences::PreferenceService;
use crate::services::registry::EndpointRegistry;
use crate::store::NotificationStore;

/// Orchestrates notification creation and channel fan-out.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationStore>,
    preferences: Arc<PreferenceService>,
    registry: Arc<EndpointRegistry>,
    engine: Arc<DeliveryEngine>,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        preferences: Arc<PreferenceService>,
        registry: Arc<EndpointRegistry>,
        engine: Arc<DeliveryEngine>,
    ) -> Self {
        Self {
            notifications,
            preferences,
            registry,
            engine,
        }
    }

    /// Create one notification and fan it out to its channels.
    ///
    /// Returns `None` when preference resolution yields no channels (the
    /// user's global opt-out): nothing is persisted and nothing is sent.
    /// Persistence failure of the notification record itself is returned to
    /// the caller; everything downstream is best-effort.
    pub async fn dispatch(
        &self,
        input: CreateNotification,
    ) -> Result<Option<Notification>, NotifyError> {
        let category = input.category.unwrap_or_else(|| input.event_type.category());
        let priority = input
            .priority
            .unwrap_or_else(|| input.event_type.default_priority());

        let channels = match input.channels {
            Some(forced) => {
                if forced.is_empty() {
                    return Err(NotifyError::Validation(
                        "Forced channel set must be non-empty".to_string(),
                    ));
                }
                forced
            }
            None => self.preferences.resolve(input.user_id, category).await?,
        };

        if channels.is_empty() {
            tracing::debug!(
                target: DELIVERY_TARGET,
                user_id = %input.user_id,
                event_type = %input.event_type,
                "Notifications disabled for user, skipping dispatch"
            );
            return Ok(None);
        }

        let now = Utc::now();
        let deliveries = channels
            .iter()
            .map(|&channel| match channel {
                // The stored record itself is the in-app delivery.
                Channel::InApp => ChannelDelivery::delivered(channel, now),
                _ => ChannelDelivery::pending(channel),
            })
            .collect();

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            event_type: input.event_type,
            category,
            priority,
            title: input.title,
            message: input.message,
            data: input.data.unwrap_or(serde_json::Value::Null),
            channels: channels.clone(),
            deliveries,
            is_read: false,
            read_at: None,
            is_archived: false,
            archived_at: None,
            expires_at: input.expires_at,
            group_key: input.group_key,
            source: input.source,
            created_at: now,
            updated_at: now,
        };

        self.notifications.insert(&notification).await?;

        tracing::info!(
            target: DELIVERY_TARGET,
            notification_id = %notification.id,
            user_id = %notification.user_id,
            event_type = %notification.event_type,
            channels = ?channels,
            "Notification dispatched"
        );

        if channels.contains(&Channel::Webhook) {
            self.fan_out_webhooks(&notification).await;
        }

        Ok(Some(notification))
    }

    /// Spawn one detached delivery task per matching endpoint.
    ///
    /// Each task owns its failure boundary: it runs the engine, writes the
    /// channel outcome back onto the notification, and can never propagate
    /// an error to the dispatching caller. Endpoint lookup failure is
    /// swallowed here for the same reason.
    async fn fan_out_webhooks(&self, notification: &Notification) {
        let event = notification.event_type.as_str();

        let endpoints = match self
            .registry
            .get_active_for_event(notification.user_id, event)
            .await
        {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::error!(
                    target: DELIVERY_TARGET,
                    notification_id = %notification.id,
                    user_id = %notification.user_id,
                    event,
                    error = %e,
                    "Failed to query endpoints for fan-out"
                );
                return;
            }
        };

        if endpoints.is_empty() {
            tracing::debug!(
                target: DELIVERY_TARGET,
                notification_id = %notification.id,
                event,
                "No active endpoints subscribed to event"
            );
            return;
        }

        for endpoint in endpoints {
            let engine = Arc::clone(&self.engine);
            let notifications = Arc::clone(&self.notifications);
            let notification = notification.clone();

            tokio::spawn(async move {
                deliver_to_endpoint(engine, notifications, notification, endpoint).await;
            });
        }
    }
}

/// Body of one fan-out task: deliver, then record the channel outcome.
async fn deliver_to_endpoint(
    engine: Arc<DeliveryEngine>,
    notifications: Arc<dyn NotificationStore>,
    notification: Notification,
    endpoint: WebhookEndpoint,
) {
    let outcome = engine.deliver(&endpoint, &notification).await;

    let channel_outcome = if outcome.attempt.success {
        ChannelOutcome {
            status: ChannelDeliveryStatus::Delivered,
            error: None,
            retry_count: outcome.retries,
            at: Utc::now(),
        }
    } else {
        ChannelOutcome {
            status: ChannelDeliveryStatus::Failed,
            error: outcome.attempt.error.clone(),
            retry_count: outcome.retries,
            at: Utc::now(),
        }
    };

    if let Err(e) = notifications
        .update_channel_delivery(notification.id, Channel::Webhook, &channel_outcome)
        .await
    {
        tracing::error!(
            target: DELIVERY_TARGET,
            notification_id = %notification.id,
            endpoint_id = %endpoint.id,
            error = %e,
            "Failed to record webhook channel outcome"
        );
    }
}
