//! Domain models and API DTOs for the notification and webhook system.

pub mod channel;
pub mod endpoint;
pub mod event;
pub mod notification;
pub mod payload;
pub mod preferences;

pub use channel::{Channel, ChannelDelivery, ChannelDeliveryStatus, ChannelOutcome};
pub use endpoint::{
    BackoffStrategy, CreateEndpointRequest, DeliveryAttempt, EndpointListResponse, EndpointPatch,
    EndpointResponse, EndpointStatistics, EndpointStatus, EventTypeInfo, ToggleEndpointRequest,
    UpdateEndpointRequest, WebhookEndpoint, WebhookMethod, ATTEMPT_HISTORY_CAPACITY,
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS, FAILURE_THRESHOLD, WILDCARD_EVENT,
};
pub use event::{NotificationCategory, NotificationEventType, NotificationPriority};
pub use notification::{
    BulkActionResponse, BulkDeleteRequest, CreateNotification, ListNotificationsQuery,
    Notification, NotificationListResponse, NotificationPage, NotificationQuery,
    NotificationResponse, NotificationSummary, SortOrder, SourceRef,
};
pub use payload::{NotificationEnvelope, WebhookPayload};
pub use preferences::{
    NotificationPreferences, PreferencesResponse, UpdateCategoryPreferencesRequest,
    UpdatePreferencesRequest,
};
