//! Audit/observability collaborator.
//!
//! Delivery attempts and preference changes are recorded as structured audit
//! events. The sink is fire-and-forget: recording can never fail the calling
//! operation, so the trait is infallible and implementations swallow their
//! own errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Tracing target for audit events.
pub const AUDIT_TARGET: &str = "talentgate_audit";

/// One structured audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Event kind, e.g. "webhook.delivery.attempt".
    pub event: String,
    /// The user the operation was scoped to.
    pub actor_id: Option<Uuid>,
    pub resource_type: String,
    pub resource_id: Uuid,
    /// "success" or "failure".
    pub outcome: String,
    pub metadata: JsonValue,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    #[must_use]
    pub fn new(
        event: impl Into<String>,
        actor_id: Option<Uuid>,
        resource_type: impl Into<String>,
        resource_id: Uuid,
        outcome: impl Into<String>,
        metadata: JsonValue,
    ) -> Self {
        Self {
            event: event.into(),
            actor_id,
            resource_type: resource_type.into(),
            resource_id,
            outcome: outcome.into(),
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Sink accepting audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Default sink that emits audit records as structured tracing events.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: AUDIT_TARGET,
            event = %record.event,
            actor_id = ?record.actor_id,
            resource_type = %record.resource_type,
            resource_id = %record.resource_id,
            outcome = %record.outcome,
            metadata = %record.metadata,
            "audit"
        );
    }
}
