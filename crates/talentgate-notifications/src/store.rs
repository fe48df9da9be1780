//! Persistence seam for the notification and webhook system.
//!
//! The document store is a boundary collaborator: these traits are what the
//! core needs from it, implemented over MongoDB in `talentgate-db` and over
//! in-memory maps in tests. Endpoint counter/ring-buffer mutation must be a
//! single atomic update in every implementation; the engine never does
//! read-modify-write on endpoint health state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Channel, ChannelOutcome, DeliveryAttempt, EndpointPatch, EndpointStatus, Notification,
    NotificationPage, NotificationPreferences, NotificationQuery, WebhookEndpoint,
};

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations over [`Notification`] documents.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> StoreResult<()>;

    /// Owner-scoped fetch. Expired notifications are filtered out.
    async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>>;

    /// Filtered, paginated listing. The same predicate backs the summary
    /// operation so badge counts never drift from the visible list.
    async fn list(&self, query: &NotificationQuery) -> StoreResult<NotificationPage>;

    /// Idempotent: a second call on an already-read notification is a no-op
    /// and leaves `read_at` unchanged. Returns the notification as stored.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>>;

    /// Marks every unread notification for the user; returns how many changed.
    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64>;

    async fn set_archived(
        &self,
        user_id: Uuid,
        id: Uuid,
        archived: bool,
    ) -> StoreResult<Option<Notification>>;

    /// Hard removal, owner-scoped. Returns whether a document was removed.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    /// How many of the given ids belong to the user. Used to validate bulk
    /// deletes before any removal happens.
    async fn count_owned(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64>;

    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64>;

    /// Writes a delivery outcome onto the notification's record for one
    /// channel. Used by the dispatcher's fan-out tasks.
    async fn update_channel_delivery(
        &self,
        id: Uuid,
        channel: Channel,
        outcome: &ChannelOutcome,
    ) -> StoreResult<()>;
}

/// Persistence operations over [`WebhookEndpoint`] documents.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    async fn insert(&self, endpoint: &WebhookEndpoint) -> StoreResult<()>;

    async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<WebhookEndpoint>>;

    /// Existence check without owner scoping, used by the delivery engine to
    /// notice endpoints deleted mid-retry.
    async fn exists(&self, id: Uuid) -> StoreResult<bool>;

    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<WebhookEndpoint>>;

    /// Endpoints owned by the user that are active, status ACTIVE, and
    /// subscribed to the event (exactly or via the "ALL" wildcard).
    async fn find_active_for_event(
        &self,
        user_id: Uuid,
        event: &str,
    ) -> StoreResult<Vec<WebhookEndpoint>>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &EndpointPatch,
    ) -> StoreResult<Option<WebhookEndpoint>>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    /// Applies one delivery result in a single atomic update: increments the
    /// total and success/failure counters, resets or increments the
    /// consecutive-failure count, stamps the last-success/failure/delivery
    /// timestamps, and appends to the bounded attempt ring buffer (evicting
    /// the oldest entry past capacity). Returns the updated endpoint.
    async fn record_attempt(
        &self,
        id: Uuid,
        attempt: &DeliveryAttempt,
    ) -> StoreResult<Option<WebhookEndpoint>>;

    /// Status transition used for auto-disable and recovery. Idempotent.
    async fn set_status(
        &self,
        id: Uuid,
        status: EndpointStatus,
        is_active: bool,
    ) -> StoreResult<()>;
}

/// Persistence operations over [`NotificationPreferences`] documents.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<NotificationPreferences>>;

    /// Inserts or replaces the user's preference document.
    async fn upsert(&self, preferences: &NotificationPreferences) -> StoreResult<()>;
}
