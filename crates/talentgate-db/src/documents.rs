//! BSON document shapes for the Mongo collections.
//!
//! Documents use camelCase field names (the original database shape) and
//! native BSON datetimes so range filters and sorts behave correctly. UUIDs
//! are stored as their canonical string form. Conversions to and from the
//! core domain types live here.

use std::collections::HashMap;

use bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use talentgate_notifications::models::{
    BackoffStrategy, Channel, ChannelDelivery, ChannelDeliveryStatus, DeliveryAttempt,
    EndpointStatus, Notification, NotificationCategory, NotificationEventType,
    NotificationPreferences, NotificationPriority, SourceRef, WebhookEndpoint, WebhookMethod,
};

fn to_bson_dt(dt: chrono::DateTime<chrono::Utc>) -> BsonDateTime {
    BsonDateTime::from_chrono(dt)
}

fn to_chrono(dt: BsonDateTime) -> chrono::DateTime<chrono::Utc> {
    dt.to_chrono()
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDeliveryDoc {
    pub channel: Channel,
    pub status: ChannelDeliveryStatus,
    pub sent_at: Option<BsonDateTime>,
    pub delivered_at: Option<BsonDateTime>,
    pub read_at: Option<BsonDateTime>,
    pub error: Option<String>,
    pub retry_count: u32,
}

impl From<&ChannelDelivery> for ChannelDeliveryDoc {
    fn from(d: &ChannelDelivery) -> Self {
        Self {
            channel: d.channel,
            status: d.status,
            sent_at: d.sent_at.map(to_bson_dt),
            delivered_at: d.delivered_at.map(to_bson_dt),
            read_at: d.read_at.map(to_bson_dt),
            error: d.error.clone(),
            retry_count: d.retry_count,
        }
    }
}

impl From<ChannelDeliveryDoc> for ChannelDelivery {
    fn from(d: ChannelDeliveryDoc) -> Self {
        Self {
            channel: d.channel,
            status: d.status,
            sent_at: d.sent_at.map(to_chrono),
            delivered_at: d.delivered_at.map(to_chrono),
            read_at: d.read_at.map(to_chrono),
            error: d.error,
            retry_count: d.retry_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRefDoc {
    pub entity_type: String,
    pub entity_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: NotificationEventType,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
    pub channels: Vec<Channel>,
    pub deliveries: Vec<ChannelDeliveryDoc>,
    pub is_read: bool,
    pub read_at: Option<BsonDateTime>,
    pub is_archived: bool,
    pub archived_at: Option<BsonDateTime>,
    pub expires_at: Option<BsonDateTime>,
    pub group_key: Option<String>,
    pub source: Option<SourceRefDoc>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl From<&Notification> for NotificationDoc {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            event_type: n.event_type,
            category: n.category,
            priority: n.priority,
            title: n.title.clone(),
            message: n.message.clone(),
            data: n.data.clone(),
            channels: n.channels.clone(),
            deliveries: n.deliveries.iter().map(Into::into).collect(),
            is_read: n.is_read,
            read_at: n.read_at.map(to_bson_dt),
            is_archived: n.is_archived,
            archived_at: n.archived_at.map(to_bson_dt),
            expires_at: n.expires_at.map(to_bson_dt),
            group_key: n.group_key.clone(),
            source: n.source.as_ref().map(|s| SourceRefDoc {
                entity_type: s.entity_type.clone(),
                entity_id: s.entity_id,
            }),
            created_at: to_bson_dt(n.created_at),
            updated_at: to_bson_dt(n.updated_at),
        }
    }
}

impl From<NotificationDoc> for Notification {
    fn from(d: NotificationDoc) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            event_type: d.event_type,
            category: d.category,
            priority: d.priority,
            title: d.title,
            message: d.message,
            data: d.data,
            channels: d.channels,
            deliveries: d.deliveries.into_iter().map(Into::into).collect(),
            is_read: d.is_read,
            read_at: d.read_at.map(to_chrono),
            is_archived: d.is_archived,
            archived_at: d.archived_at.map(to_chrono),
            expires_at: d.expires_at.map(to_chrono),
            group_key: d.group_key,
            source: d.source.map(|s| SourceRef {
                entity_type: s.entity_type,
                entity_id: s.entity_id,
            }),
            created_at: to_chrono(d.created_at),
            updated_at: to_chrono(d.updated_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Webhook endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAttemptDoc {
    pub timestamp: BsonDateTime,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub response_time_ms: Option<u64>,
}

impl From<&DeliveryAttempt> for DeliveryAttemptDoc {
    fn from(a: &DeliveryAttempt) -> Self {
        Self {
            timestamp: to_bson_dt(a.timestamp),
            success: a.success,
            status_code: a.status_code,
            error: a.error.clone(),
            response_time_ms: a.response_time_ms,
        }
    }
}

impl From<DeliveryAttemptDoc> for DeliveryAttempt {
    fn from(d: DeliveryAttemptDoc) -> Self {
        Self {
            timestamp: to_chrono(d.timestamp),
            success: d.success,
            status_code: d.status_code,
            error: d.error,
            response_time_ms: d.response_time_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEndpointDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub method: WebhookMethod,
    pub headers: Option<HashMap<String, String>>,
    pub secret_encrypted: Option<String>,
    pub events: Vec<String>,
    pub status: EndpointStatus,
    pub is_active: bool,
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
    pub timeout_ms: u64,
    pub total_deliveries: u64,
    pub successful_deliveries: u64,
    pub failed_deliveries: u64,
    pub consecutive_failures: u32,
    pub last_success_at: Option<BsonDateTime>,
    pub last_failure_at: Option<BsonDateTime>,
    pub last_delivery_at: Option<BsonDateTime>,
    pub recent_attempts: Vec<DeliveryAttemptDoc>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl From<&WebhookEndpoint> for WebhookEndpointDoc {
    fn from(e: &WebhookEndpoint) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            url: e.url.clone(),
            method: e.method,
            headers: e.headers.clone(),
            secret_encrypted: e.secret_encrypted.clone(),
            events: e.events.clone(),
            status: e.status,
            is_active: e.is_active,
            max_retries: e.max_retries,
            backoff: e.backoff,
            timeout_ms: e.timeout_ms,
            total_deliveries: e.total_deliveries,
            successful_deliveries: e.successful_deliveries,
            failed_deliveries: e.failed_deliveries,
            consecutive_failures: e.consecutive_failures,
            last_success_at: e.last_success_at.map(to_bson_dt),
            last_failure_at: e.last_failure_at.map(to_bson_dt),
            last_delivery_at: e.last_delivery_at.map(to_bson_dt),
            recent_attempts: e.recent_attempts.iter().map(Into::into).collect(),
            created_at: to_bson_dt(e.created_at),
            updated_at: to_bson_dt(e.updated_at),
        }
    }
}

impl From<WebhookEndpointDoc> for WebhookEndpoint {
    fn from(d: WebhookEndpointDoc) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            url: d.url,
            method: d.method,
            headers: d.headers,
            secret_encrypted: d.secret_encrypted,
            events: d.events,
            status: d.status,
            is_active: d.is_active,
            max_retries: d.max_retries,
            backoff: d.backoff,
            timeout_ms: d.timeout_ms,
            total_deliveries: d.total_deliveries,
            successful_deliveries: d.successful_deliveries,
            failed_deliveries: d.failed_deliveries,
            consecutive_failures: d.consecutive_failures,
            last_success_at: d.last_success_at.map(to_chrono),
            last_failure_at: d.last_failure_at.map(to_chrono),
            last_delivery_at: d.last_delivery_at.map(to_chrono),
            recent_attempts: d.recent_attempts.into_iter().map(Into::into).collect(),
            created_at: to_chrono(d.created_at),
            updated_at: to_chrono(d.updated_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDoc {
    pub user_id: Uuid,
    pub enabled: bool,
    pub default_channels: Vec<Channel>,
    pub categories: HashMap<String, Vec<Channel>>,
    pub updated_at: BsonDateTime,
}

impl From<&NotificationPreferences> for PreferencesDoc {
    fn from(p: &NotificationPreferences) -> Self {
        Self {
            user_id: p.user_id,
            enabled: p.enabled,
            default_channels: p.default_channels.clone(),
            categories: p.categories.clone(),
            updated_at: to_bson_dt(p.updated_at),
        }
    }
}

impl From<PreferencesDoc> for NotificationPreferences {
    fn from(d: PreferencesDoc) -> Self {
        Self {
            user_id: d.user_id,
            enabled: d.enabled,
            default_channels: d.default_channels,
            categories: d.categories,
            updated_at: to_chrono(d.updated_at),
        }
    }
}
