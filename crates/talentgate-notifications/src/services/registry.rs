//! Webhook endpoint registry.
//!
//! CRUD and query operations over webhook endpoints, and the single source
//! of truth for endpoint health state: all counter/ring-buffer mutation goes
//! through [`EndpointRegistry::record_attempt`], which delegates to the
//! store's atomic update and then applies the auto-disable/re-enable
//! transitions.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::crypto;
use crate::error::NotifyError;
use crate::models::{
    CreateEndpointRequest, DeliveryAttempt, EndpointPatch, EndpointResponse, EndpointStatistics,
    EndpointStatus, UpdateEndpointRequest, WebhookEndpoint, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT_MS, FAILURE_THRESHOLD,
};
use crate::store::{EndpointStore, StoreResult};
use crate::validation;

/// Default maximum endpoints per owner.
pub const DEFAULT_MAX_ENDPOINTS: usize = 25;

/// Registry of outgoing webhook endpoints.
#[derive(Clone)]
pub struct EndpointRegistry {
    store: Arc<dyn EndpointStore>,
    encryption_key: Vec<u8>,
    max_endpoints: usize,
    allow_http: bool,
}

impl EndpointRegistry {
    /// Create a new registry.
    #[must_use]
    pub fn new(store: Arc<dyn EndpointStore>, encryption_key: Vec<u8>) -> Self {
        Self {
            store,
            encryption_key,
            max_endpoints: DEFAULT_MAX_ENDPOINTS,
            allow_http: false,
        }
    }

    /// Set the maximum endpoints per owner.
    #[must_use]
    pub fn with_max_endpoints(mut self, max: usize) -> Self {
        self.max_endpoints = max;
        self
    }

    /// Allow HTTP URLs (for development/testing).
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Register a new endpoint for a user.
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateEndpointRequest,
    ) -> Result<EndpointResponse, NotifyError> {
        validation::validate_webhook_url(&request.url, self.allow_http)?;
        validation::validate_events(&request.events)?;

        let existing = self.store.list(user_id).await?;
        if existing.len() >= self.max_endpoints {
            return Err(NotifyError::EndpointLimitExceeded {
                limit: self.max_endpoints as i64,
            });
        }

        let secret_encrypted = match &request.secret {
            Some(secret) if !secret.is_empty() => {
                Some(crypto::encrypt_secret(secret, &self.encryption_key)?)
            }
            _ => None,
        };

        let now = Utc::now();
        let endpoint = WebhookEndpoint {
            id: Uuid::new_v4(),
            user_id,
            url: request.url,
            method: request.method.unwrap_or_default(),
            headers: request.headers,
            secret_encrypted,
            events: request.events,
            status: EndpointStatus::Active,
            is_active: true,
            max_retries: request.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            backoff: request.backoff.unwrap_or_default(),
            timeout_ms: request.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            total_deliveries: 0,
            successful_deliveries: 0,
            failed_deliveries: 0,
            consecutive_failures: 0,
            last_success_at: None,
            last_failure_at: None,
            last_delivery_at: None,
            recent_attempts: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&endpoint).await?;
        Ok(endpoint.into())
    }

    /// Get a single endpoint, owner-scoped.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<EndpointResponse, NotifyError> {
        let endpoint = self
            .store
            .find(user_id, id)
            .await?
            .ok_or(NotifyError::EndpointNotFound)?;
        Ok(endpoint.into())
    }

    /// List all of an owner's endpoints.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<EndpointResponse>, NotifyError> {
        let endpoints = self.store.list(user_id).await?;
        Ok(endpoints.into_iter().map(Into::into).collect())
    }

    /// Endpoints that should receive the given event for this user: active,
    /// status ACTIVE, and subscribed to the event exactly or via "ALL".
    pub async fn get_active_for_event(
        &self,
        user_id: Uuid,
        event: &str,
    ) -> StoreResult<Vec<WebhookEndpoint>> {
        self.store.find_active_for_event(user_id, event).await
    }

    /// Update an endpoint. Only provided fields change; URL and events are
    /// revalidated when present in the patch.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateEndpointRequest,
    ) -> Result<EndpointResponse, NotifyError> {
        if let Some(ref url) = request.url {
            validation::validate_webhook_url(url, self.allow_http)?;
        }
        if let Some(ref events) = request.events {
            validation::validate_events(events)?;
        }

        let secret_encrypted = match &request.secret {
            Some(secret) if !secret.is_empty() => {
                Some(Some(crypto::encrypt_secret(secret, &self.encryption_key)?))
            }
            _ => None,
        };

        let patch = EndpointPatch {
            url: request.url,
            method: request.method,
            headers: request.headers,
            secret_encrypted,
            events: request.events,
            max_retries: request.max_retries,
            backoff: request.backoff,
            timeout_ms: request.timeout_ms,
            ..EndpointPatch::default()
        };

        let endpoint = self
            .store
            .update(user_id, id, &patch)
            .await?
            .ok_or(NotifyError::EndpointNotFound)?;
        Ok(endpoint.into())
    }

    /// Enable or disable an endpoint. Enabling sets status ACTIVE and clears
    /// the consecutive-failure count so a previously FAILED endpoint gets a
    /// clean slate; disabling sets PAUSED, which is distinct from the
    /// auto-disable FAILED state.
    pub async fn toggle_active(
        &self,
        user_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<EndpointResponse, NotifyError> {
        let patch = EndpointPatch {
            is_active: Some(is_active),
            status: Some(if is_active {
                EndpointStatus::Active
            } else {
                EndpointStatus::Paused
            }),
            consecutive_failures: if is_active { Some(0) } else { None },
            ..EndpointPatch::default()
        };

        let endpoint = self
            .store
            .update(user_id, id, &patch)
            .await?
            .ok_or(NotifyError::EndpointNotFound)?;
        Ok(endpoint.into())
    }

    /// Delete an endpoint, owner-scoped.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), NotifyError> {
        let deleted = self.store.delete(user_id, id).await?;
        if !deleted {
            return Err(NotifyError::EndpointNotFound);
        }
        Ok(())
    }

    /// Whether an endpoint still exists, regardless of owner.
    pub async fn endpoint_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.store.exists(id).await
    }

    /// Find an endpoint by id, owner-scoped, as the domain type.
    pub async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<WebhookEndpoint>> {
        self.store.find(user_id, id).await
    }

    /// Record one logical delivery result.
    ///
    /// The store applies the counter, timestamp, and ring-buffer update as a
    /// single atomic operation; this method then derives the status
    /// transitions: a success while FAILED re-enables the endpoint, and
    /// reaching [`FAILURE_THRESHOLD`] consecutive failures auto-disables it.
    pub async fn record_attempt(
        &self,
        id: Uuid,
        attempt: &DeliveryAttempt,
    ) -> StoreResult<Option<WebhookEndpoint>> {
        let Some(mut endpoint) = self.store.record_attempt(id, attempt).await? else {
            return Ok(None);
        };

        if attempt.success {
            if endpoint.status == EndpointStatus::Failed {
                tracing::info!(
                    target: crate::services::delivery::DELIVERY_TARGET,
                    endpoint_id = %id,
                    "Re-enabling endpoint after successful delivery"
                );
                self.store
                    .set_status(id, EndpointStatus::Active, true)
                    .await?;
                endpoint.status = EndpointStatus::Active;
                endpoint.is_active = true;
            }
        } else if endpoint.consecutive_failures >= FAILURE_THRESHOLD
            && endpoint.status != EndpointStatus::Failed
        {
            tracing::warn!(
                target: crate::services::delivery::DELIVERY_TARGET,
                endpoint_id = %id,
                consecutive_failures = endpoint.consecutive_failures,
                threshold = FAILURE_THRESHOLD,
                "Auto-disabling endpoint due to consecutive failures"
            );
            self.store
                .set_status(id, EndpointStatus::Failed, false)
                .await?;
            endpoint.status = EndpointStatus::Failed;
            endpoint.is_active = false;
        }

        Ok(Some(endpoint))
    }

    /// Aggregated statistics across all of an owner's endpoints.
    pub async fn statistics(&self, user_id: Uuid) -> Result<EndpointStatistics, NotifyError> {
        let endpoints = self.store.list(user_id).await?;

        let mut stats = EndpointStatistics {
            total: endpoints.len() as u64,
            active: 0,
            paused: 0,
            failed: 0,
            total_deliveries: 0,
            success_rate: 0.0,
        };

        let mut successful: u64 = 0;
        for ep in &endpoints {
            match ep.status {
                EndpointStatus::Active => stats.active += 1,
                EndpointStatus::Paused => stats.paused += 1,
                EndpointStatus::Failed => stats.failed += 1,
                EndpointStatus::Disabled => {}
            }
            stats.total_deliveries += ep.total_deliveries;
            successful += ep.successful_deliveries;
        }

        if stats.total_deliveries > 0 {
            stats.success_rate = successful as f64 / stats.total_deliveries as f64;
        }

        Ok(stats)
    }
}
