//! Webhook delivery execution engine.
//!
//! Delivers one signed payload to one endpoint, retrying transient failures
//! with per-endpoint backoff, bounded by the endpoint's retry cap. Every
//! terminal outcome is recorded to the registry as exactly one logical
//! delivery result; every physical attempt emits an audit event. Delivery
//! never returns an error to its caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Client;

use crate::audit::{AuditRecord, AuditSink};
use crate::crypto;
use crate::error::NotifyError;
use crate::models::{
    BackoffStrategy, DeliveryAttempt, Notification, NotificationEnvelope, WebhookEndpoint,
    WebhookMethod, WebhookPayload,
};
use crate::services::registry::EndpointRegistry;

/// Tracing target for delivery events.
pub const DELIVERY_TARGET: &str = "webhook_delivery";

/// User agent identifying outgoing deliveries.
pub const DELIVERY_USER_AGENT: &str = "talentgate-webhooks/1.0";

/// Upper bound on any single backoff wait.
pub const BACKOFF_CAP_MS: u64 = 30_000;

/// Safety net on top of the per-endpoint timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal result of one logical delivery (initial attempt plus retries).
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub attempt: DeliveryAttempt,
    /// Retries performed after the initial attempt.
    pub retries: u32,
}

/// Classification of one physical attempt.
enum AttemptClass {
    Success,
    Retryable,
    Terminal,
}

/// Engine delivering signed payloads to webhook endpoints.
#[derive(Clone)]
pub struct DeliveryEngine {
    http: Client,
    registry: Arc<EndpointRegistry>,
    audit: Arc<dyn AuditSink>,
    encryption_key: Vec<u8>,
}

impl DeliveryEngine {
    /// Create a new delivery engine with a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Internal` if the HTTP client cannot be built.
    pub fn new(
        registry: Arc<EndpointRegistry>,
        audit: Arc<dyn AuditSink>,
        encryption_key: Vec<u8>,
    ) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(DELIVERY_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| NotifyError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            registry,
            audit,
            encryption_key,
        })
    }

    /// Deliver one notification to one endpoint.
    ///
    /// Runs the bounded retry loop, records the terminal outcome to the
    /// registry, and returns it. All failures are captured in the returned
    /// [`DeliveryOutcome`]; this method never fails.
    pub async fn deliver(
        &self,
        endpoint: &WebhookEndpoint,
        notification: &Notification,
    ) -> DeliveryOutcome {
        let event = notification.event_type.as_str();

        let payload = WebhookPayload {
            webhook_id: endpoint.id,
            event: event.to_string(),
            timestamp: Utc::now(),
            notification: NotificationEnvelope::from(notification),
        };

        let body = match serde_json::to_vec(&payload) {
            Ok(b) => b,
            Err(e) => {
                // Nothing was sent; still record one failed logical delivery.
                let attempt = DeliveryAttempt {
                    timestamp: Utc::now(),
                    success: false,
                    status_code: None,
                    error: Some(format!("Failed to serialize payload: {e}")),
                    response_time_ms: None,
                };
                self.record(endpoint, event, &attempt).await;
                return DeliveryOutcome { attempt, retries: 0 };
            }
        };

        let headers = self.build_headers(endpoint, event, &payload, &body);
        let timeout = Duration::from_millis(endpoint.timeout_ms);

        let mut retries: u32 = 0;
        let mut attempt_number: u32 = 0;
        let final_attempt = loop {
            // An endpoint deleted mid-retry stops the sequence; there is no
            // document left to record against.
            if attempt_number > 0 {
                match self.registry.endpoint_exists(endpoint.id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::info!(
                            target: DELIVERY_TARGET,
                            endpoint_id = %endpoint.id,
                            event,
                            "Abandoning retry loop, endpoint was deleted"
                        );
                        return DeliveryOutcome {
                            attempt: DeliveryAttempt {
                                timestamp: Utc::now(),
                                success: false,
                                status_code: None,
                                error: Some("Endpoint deleted during retry".to_string()),
                                response_time_ms: None,
                            },
                            retries,
                        };
                    }
                    Err(e) => {
                        tracing::warn!(
                            target: DELIVERY_TARGET,
                            endpoint_id = %endpoint.id,
                            error = %e,
                            "Failed to check endpoint existence, continuing retry"
                        );
                    }
                }
            }

            let (attempt, class) = self
                .execute_attempt(endpoint, event, &headers, &body, timeout, attempt_number)
                .await;

            match class {
                AttemptClass::Success | AttemptClass::Terminal => break attempt,
                AttemptClass::Retryable => {
                    if attempt_number >= endpoint.max_retries {
                        break attempt;
                    }
                    let delay = backoff_delay(endpoint.backoff, attempt_number);
                    tracing::debug!(
                        target: DELIVERY_TARGET,
                        endpoint_id = %endpoint.id,
                        event,
                        attempt = attempt_number,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt_number += 1;
                    retries += 1;
                }
            }
        };

        self.record(endpoint, event, &final_attempt).await;

        DeliveryOutcome {
            attempt: final_attempt,
            retries,
        }
    }

    /// Execute a single HTTP attempt and classify the outcome.
    async fn execute_attempt(
        &self,
        endpoint: &WebhookEndpoint,
        event: &str,
        headers: &reqwest::header::HeaderMap,
        body: &[u8],
        timeout: Duration,
        attempt_number: u32,
    ) -> (DeliveryAttempt, AttemptClass) {
        let builder = match endpoint.method {
            WebhookMethod::Post => self.http.post(&endpoint.url),
            WebhookMethod::Put => self.http.put(&endpoint.url),
        };

        let start = Instant::now();
        let result = builder
            .headers(headers.clone())
            .body(body.to_vec())
            .timeout(timeout)
            .send()
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let (attempt, class) = match result {
            Ok(response) => {
                let status = response.status().as_u16();
                if (200..300).contains(&status) {
                    (
                        DeliveryAttempt {
                            timestamp: Utc::now(),
                            success: true,
                            status_code: Some(status),
                            error: None,
                            response_time_ms: Some(elapsed_ms),
                        },
                        AttemptClass::Success,
                    )
                } else {
                    // 5xx and 429 are transient; any other rejection is a
                    // receiver configuration problem and is not retried.
                    let retryable = (500..600).contains(&status) || status == 429;
                    (
                        DeliveryAttempt {
                            timestamp: Utc::now(),
                            success: false,
                            status_code: Some(status),
                            error: Some(format!("HTTP {status}")),
                            response_time_ms: Some(elapsed_ms),
                        },
                        if retryable {
                            AttemptClass::Retryable
                        } else {
                            AttemptClass::Terminal
                        },
                    )
                }
            }
            Err(e) => {
                let error_msg = if e.is_timeout() {
                    format!("Request timed out after {}ms", endpoint.timeout_ms)
                } else if e.is_connect() {
                    format!("Connection failed: {e}")
                } else {
                    format!("Request error: {e}")
                };
                (
                    DeliveryAttempt {
                        timestamp: Utc::now(),
                        success: false,
                        status_code: None,
                        error: Some(error_msg),
                        response_time_ms: Some(elapsed_ms),
                    },
                    AttemptClass::Retryable,
                )
            }
        };

        if attempt.success {
            tracing::info!(
                target: DELIVERY_TARGET,
                endpoint_id = %endpoint.id,
                url = %endpoint.url,
                event,
                status_code = attempt.status_code,
                attempt = attempt_number,
                elapsed_ms,
                "Webhook delivery attempt succeeded"
            );
        } else {
            tracing::warn!(
                target: DELIVERY_TARGET,
                endpoint_id = %endpoint.id,
                url = %endpoint.url,
                event,
                status_code = attempt.status_code,
                error = attempt.error.as_deref().unwrap_or(""),
                attempt = attempt_number,
                elapsed_ms,
                "Webhook delivery attempt failed"
            );
        }

        self.audit.record(AuditRecord::new(
            "webhook.delivery.attempt",
            Some(endpoint.user_id),
            "webhook_endpoint",
            endpoint.id,
            if attempt.success { "success" } else { "failure" },
            serde_json::json!({
                "url": endpoint.url,
                "event": event,
                "attempt": attempt_number,
                "status_code": attempt.status_code,
                "error": attempt.error,
                "elapsed_ms": elapsed_ms,
            }),
        ));

        (attempt, class)
    }

    /// Build the header set shared by all attempts of one logical delivery.
    fn build_headers(
        &self,
        endpoint: &WebhookEndpoint,
        event: &str,
        payload: &WebhookPayload,
        body: &[u8],
    ) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(v) = "application/json".parse() {
            headers.insert("Content-Type", v);
        }
        if let Ok(v) = endpoint.id.to_string().parse() {
            headers.insert("X-Webhook-ID", v);
        }
        if let Ok(v) = event.parse() {
            headers.insert("X-Webhook-Event", v);
        }
        if let Ok(v) = payload.timestamp.to_rfc3339().parse() {
            headers.insert("X-Webhook-Timestamp", v);
        }

        // Sign the raw body when a secret is configured; an endpoint with no
        // secret gets no signature header at all.
        if let Some(ref secret_encrypted) = endpoint.secret_encrypted {
            match crypto::decrypt_secret(secret_encrypted, &self.encryption_key) {
                Ok(secret) => {
                    let signature = crypto::compute_signature(&secret, body);
                    if let Ok(v) = signature.parse() {
                        headers.insert("X-Webhook-Signature", v);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        target: DELIVERY_TARGET,
                        endpoint_id = %endpoint.id,
                        error = %e,
                        "Failed to decrypt endpoint secret, delivering without signature"
                    );
                }
            }
        }

        if let Some(ref custom) = endpoint.headers {
            for (name, value) in custom {
                if let (Ok(n), Ok(v)) = (
                    reqwest::header::HeaderName::from_bytes(name.as_bytes()),
                    value.parse(),
                ) {
                    headers.insert(n, v);
                }
            }
        }

        headers
    }

    /// Record the terminal outcome to the registry. Failures here are logged
    /// only; the outcome has already happened.
    async fn record(&self, endpoint: &WebhookEndpoint, event: &str, attempt: &DeliveryAttempt) {
        if let Err(e) = self.registry.record_attempt(endpoint.id, attempt).await {
            tracing::error!(
                target: DELIVERY_TARGET,
                endpoint_id = %endpoint.id,
                event,
                error = %e,
                "Failed to record delivery outcome"
            );
        }
    }
}

/// Compute the wait before the next attempt.
///
/// `attempt` is the zero-based number of the attempt that just failed. Both
/// strategies are monotonically non-decreasing and capped at 30 seconds.
#[must_use]
pub fn backoff_delay(strategy: BackoffStrategy, attempt: u32) -> Duration {
    let ms = match strategy {
        BackoffStrategy::Exponential => 2u64
            .saturating_pow(attempt)
            .saturating_mul(1_000)
            .min(BACKOFF_CAP_MS),
        BackoffStrategy::Linear => (u64::from(attempt) + 1)
            .saturating_mul(2_000)
            .min(BACKOFF_CAP_MS),
    };
    Duration::from_millis(ms)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_values() {
        let cases = [
            (0, 1_000),
            (1, 2_000),
            (2, 4_000),
            (3, 8_000),
            (4, 16_000),
            (5, 30_000),
        ];
        for (attempt, expected_ms) in cases {
            assert_eq!(
                backoff_delay(BackoffStrategy::Exponential, attempt),
                Duration::from_millis(expected_ms),
                "attempt {attempt}"
            );
        }
    }

    #[test]
    fn test_linear_backoff_values() {
        let cases = [(0, 2_000), (1, 4_000), (2, 6_000), (14, 30_000), (20, 30_000)];
        for (attempt, expected_ms) in cases {
            assert_eq!(
                backoff_delay(BackoffStrategy::Linear, attempt),
                Duration::from_millis(expected_ms),
                "attempt {attempt}"
            );
        }
    }

    #[test]
    fn test_backoff_monotonically_non_decreasing() {
        for strategy in [BackoffStrategy::Exponential, BackoffStrategy::Linear] {
            let mut prev = Duration::ZERO;
            for attempt in 0..64 {
                let d = backoff_delay(strategy, attempt);
                assert!(d >= prev, "{strategy:?} decreased at attempt {attempt}");
                prev = d;
            }
        }
    }

    #[test]
    fn test_backoff_never_exceeds_cap() {
        for strategy in [BackoffStrategy::Exponential, BackoffStrategy::Linear] {
            for attempt in 0..256 {
                assert!(
                    backoff_delay(strategy, attempt) <= Duration::from_millis(BACKOFF_CAP_MS),
                    "{strategy:?} exceeded cap at attempt {attempt}"
                );
            }
        }
    }
}
