//! Webhook endpoint entity, health state, and API DTOs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Capacity of the per-endpoint recent-attempt ring buffer.
pub const ATTEMPT_HISTORY_CAPACITY: usize = 10;

/// Consecutive failures before an endpoint is auto-disabled.
pub const FAILURE_THRESHOLD: u32 = 5;

/// Default retry cap for a newly created endpoint.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt timeout for a newly created endpoint.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Event name that subscribes an endpoint to every event.
pub const WILDCARD_EVENT: &str = "ALL";

/// HTTP method used for outgoing deliveries. POST and PUT only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    Post,
    Put,
}

impl WebhookMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Health/administrative status of an endpoint.
///
/// PAUSED is an explicit owner action; FAILED is the auto-disable transition
/// after [`FAILURE_THRESHOLD`] consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Active,
    Paused,
    Disabled,
    Failed,
}

impl EndpointStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Disabled => "disabled",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "disabled" => Some(Self::Disabled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a retry-attempt number to the wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Linear,
    #[default]
    Exponential,
}

impl BackoffStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }
}

/// One recorded delivery outcome, embedded in the endpoint's ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAttempt {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub response_time_ms: Option<u64>,
}

/// One outgoing webhook subscription owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub method: WebhookMethod,
    /// Custom headers attached to every delivery.
    pub headers: Option<HashMap<String, String>>,
    /// Signing secret, AES-256-GCM encrypted at rest.
    pub secret_encrypted: Option<String>,
    /// Subscribed event names; may contain the wildcard "ALL".
    pub events: Vec<String>,
    pub status: EndpointStatus,
    pub is_active: bool,
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
    pub timeout_ms: u64,
    pub total_deliveries: u64,
    pub successful_deliveries: u64,
    pub failed_deliveries: u64,
    /// Failures since the last success. Resets to 0 on any success.
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_delivery_at: Option<DateTime<Utc>>,
    /// Most recent delivery outcomes, oldest evicted first.
    pub recent_attempts: Vec<DeliveryAttempt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookEndpoint {
    /// Whether this endpoint subscribes to the given event name.
    #[must_use]
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == WILDCARD_EVENT || e == event)
    }

    /// Whether the endpoint should receive deliveries at all.
    #[must_use]
    pub fn is_deliverable(&self) -> bool {
        self.is_active && self.status == EndpointStatus::Active
    }
}

/// Partial update applied by the registry's update operation.
#[derive(Debug, Clone, Default)]
pub struct EndpointPatch {
    pub url: Option<String>,
    pub method: Option<WebhookMethod>,
    pub headers: Option<HashMap<String, String>>,
    pub secret_encrypted: Option<Option<String>>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub status: Option<EndpointStatus>,
    pub consecutive_failures: Option<u32>,
    pub max_retries: Option<u32>,
    pub backoff: Option<BackoffStrategy>,
    pub timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// API DTOs
// ---------------------------------------------------------------------------

/// Body for creating a webhook endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateEndpointRequest {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    pub method: Option<WebhookMethod>,
    /// Must be non-empty; validated against the known event vocabulary.
    pub events: Vec<String>,
    pub secret: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub max_retries: Option<u32>,
    pub backoff: Option<BackoffStrategy>,
    pub timeout_ms: Option<u64>,
}

/// Body for updating a webhook endpoint. Only provided fields change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateEndpointRequest {
    #[validate(length(min = 1, max = 2048))]
    pub url: Option<String>,
    pub method: Option<WebhookMethod>,
    pub events: Option<Vec<String>>,
    pub secret: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub max_retries: Option<u32>,
    pub backoff: Option<BackoffStrategy>,
    pub timeout_ms: Option<u64>,
}

/// Body for the enable/disable toggle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleEndpointRequest {
    pub is_active: bool,
}

/// Endpoint as returned by the API. The signing secret is never echoed back.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EndpointResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub method: WebhookMethod,
    pub headers: Option<HashMap<String, String>>,
    pub has_secret: bool,
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
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_delivery_at: Option<DateTime<Utc>>,
    pub recent_attempts: Vec<DeliveryAttempt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WebhookEndpoint> for EndpointResponse {
    fn from(e: WebhookEndpoint) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            url: e.url,
            method: e.method,
            headers: e.headers,
            has_secret: e.secret_encrypted.is_some(),
            events: e.events,
            status: e.status,
            is_active: e.is_active,
            max_retries: e.max_retries,
            backoff: e.backoff,
            timeout_ms: e.timeout_ms,
            total_deliveries: e.total_deliveries,
            successful_deliveries: e.successful_deliveries,
            failed_deliveries: e.failed_deliveries,
            consecutive_failures: e.consecutive_failures,
            last_success_at: e.last_success_at,
            last_failure_at: e.last_failure_at,
            last_delivery_at: e.last_delivery_at,
            recent_attempts: e.recent_attempts,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Endpoint listing for one owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointListResponse {
    pub items: Vec<EndpointResponse>,
    pub total: usize,
}

/// Aggregated view across all of an owner's endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EndpointStatistics {
    pub total: u64,
    pub active: u64,
    pub paused: u64,
    pub failed: u64,
    pub total_deliveries: u64,
    /// successful / total across the whole set; 0 when no deliveries yet.
    pub success_rate: f64,
}

/// Event-type listing entry for the discovery route.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventTypeInfo {
    pub name: String,
    pub category: String,
    pub default_priority: String,
}
