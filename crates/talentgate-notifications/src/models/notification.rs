//! Notification entity, query/filter types, and API DTOs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::channel::{Channel, ChannelDelivery};
use super::event::{NotificationCategory, NotificationEventType, NotificationPriority};

/// Reference to the entity that produced a notification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceRef {
    /// Entity kind, e.g. "candidate" or "job".
    pub entity_type: String,
    pub entity_id: Uuid,
}

/// One event delivered to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: NotificationEventType,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    /// Free-form contextual data carried through to subscribers.
    pub data: JsonValue,
    /// Channels this notification was routed to. Non-empty once dispatched.
    pub channels: Vec<Channel>,
    /// Per-channel delivery state, one entry per routed channel.
    pub deliveries: Vec<ChannelDelivery>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    /// Past this instant the notification is filtered out of queries.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional key for collapsing related notifications client-side.
    pub group_key: Option<String>,
    pub source: Option<SourceRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Look up the delivery record for a channel.
    #[must_use]
    pub fn delivery(&self, channel: Channel) -> Option<&ChannelDelivery> {
        self.deliveries.iter().find(|d| d.channel == channel)
    }
}

/// Input to the dispatcher for creating one notification.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub event_type: NotificationEventType,
    /// Overrides the event type's static category mapping when set.
    pub category: Option<NotificationCategory>,
    /// Overrides the event type's default priority when set.
    pub priority: Option<NotificationPriority>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub data: Option<JsonValue>,
    /// Forces the channel set, bypassing preference resolution.
    pub channels: Option<Vec<Channel>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub group_key: Option<String>,
    pub source: Option<SourceRef>,
}

/// Sort order for notification listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter predicate shared by the listing and summary operations.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub user_id: Uuid,
    pub is_read: Option<bool>,
    pub is_archived: Option<bool>,
    pub category: Option<NotificationCategory>,
    pub priority: Option<NotificationPriority>,
    pub event_type: Option<NotificationEventType>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<Uuid>,
    pub limit: i64,
    pub offset: u64,
    pub sort: SortOrder,
}

impl NotificationQuery {
    /// Query matching everything a user can see, unpaginated.
    #[must_use]
    pub fn all_for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            limit: i64::MAX,
            ..Self::default()
        }
    }
}

/// One page of notifications plus the total match count.
#[derive(Debug, Clone)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub total_count: u64,
}

// ---------------------------------------------------------------------------
// API DTOs
// ---------------------------------------------------------------------------

/// Query string accepted by the notification listing route.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListNotificationsQuery {
    pub is_read: Option<bool>,
    pub is_archived: Option<bool>,
    pub category: Option<NotificationCategory>,
    pub priority: Option<NotificationPriority>,
    pub event_type: Option<NotificationEventType>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
    pub sort: Option<SortOrder>,
}

/// Notification as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: NotificationEventType,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
    pub channels: Vec<Channel>,
    pub deliveries: Vec<ChannelDelivery>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub group_key: Option<String>,
    pub source: Option<SourceRef>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            event_type: n.event_type,
            category: n.category,
            priority: n.priority,
            title: n.title,
            message: n.message,
            data: n.data,
            channels: n.channels,
            deliveries: n.deliveries,
            is_read: n.is_read,
            read_at: n.read_at,
            is_archived: n.is_archived,
            archived_at: n.archived_at,
            expires_at: n.expires_at,
            group_key: n.group_key,
            source: n.source,
            created_at: n.created_at,
        }
    }
}

/// Paginated notification listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub items: Vec<NotificationResponse>,
    pub total_count: u64,
    pub has_more: bool,
}

/// Dashboard badge counts, computed from the same predicate as the listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationSummary {
    pub unread_count: u64,
    pub total_count: u64,
    pub by_category: HashMap<String, u64>,
    pub by_priority: HashMap<String, u64>,
}

/// Body for the bulk delete route.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

/// Result of a bulk mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkActionResponse {
    pub affected: u64,
}
