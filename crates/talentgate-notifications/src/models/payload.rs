//! Outgoing webhook wire contract.
//!
//! Subscribers receive a camelCase JSON body and verify the
//! `X-Webhook-Signature` header (hex HMAC-SHA256 of the raw body) before
//! trusting it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::event::{NotificationCategory, NotificationEventType, NotificationPriority};
use super::notification::Notification;

/// The notification view embedded in every webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    pub notification_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: NotificationEventType,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
}

impl From<&Notification> for NotificationEnvelope {
    fn from(n: &Notification) -> Self {
        Self {
            notification_id: n.id,
            event_type: n.event_type,
            category: n.category,
            priority: n.priority,
            title: n.title.clone(),
            message: n.message.clone(),
            data: n.data.clone(),
        }
    }
}

/// Full body sent to a subscriber endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// The receiving endpoint's id, so one receiver can multiplex endpoints.
    pub webhook_id: Uuid,
    /// Event wire name, e.g. "CANDIDATE_ASSIGNED".
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub notification: NotificationEnvelope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = WebhookPayload {
            webhook_id: Uuid::nil(),
            event: "JOB_POSTED".to_string(),
            timestamp: Utc::now(),
            notification: NotificationEnvelope {
                notification_id: Uuid::nil(),
                event_type: NotificationEventType::JobPosted,
                category: NotificationCategory::Jobs,
                priority: NotificationPriority::Normal,
                title: "t".to_string(),
                message: "m".to_string(),
                data: serde_json::json!({}),
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("webhookId").is_some());
        assert!(json.get("timestamp").is_some());
        let inner = json.get("notification").unwrap();
        assert!(inner.get("notificationId").is_some());
        assert_eq!(inner.get("type").unwrap(), "JOB_POSTED");
    }
}
