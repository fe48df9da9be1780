//! Core services: registry, delivery engine, notification store surface,
//! preference resolution, and the dispatcher that ties them together.

pub mod delivery;
pub mod dispatcher;
pub mod notifications;
pub mod preferences;
pub mod registry;

pub use delivery::{backoff_delay, DeliveryEngine, DeliveryOutcome};
pub use dispatcher::NotificationDispatcher;
pub use notifications::NotificationService;
pub use preferences::PreferenceService;
pub use registry::EndpointRegistry;
