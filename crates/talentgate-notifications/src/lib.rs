//! Notification fan-out and webhook delivery for the talentgate platform.
//!
//! Provides per-user notification storage with preference-based channel
//! routing, and reliable outgoing webhook delivery with HMAC-SHA256 signing,
//! bounded retries with backoff, per-endpoint health tracking, and
//! auto-disable after consecutive failures.

pub mod audit;
pub mod auth;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod validation;

pub use auth::AuthContext;
pub use error::NotifyError;
pub use models::{NotificationEventType, WebhookPayload};
pub use router::{notifications_router, NotificationsState};
pub use services::{
    DeliveryEngine, EndpointRegistry, NotificationDispatcher, NotificationService,
    PreferenceService,
};
