//! Common test utilities for talentgate-notifications integration tests.
//!
//! Provides in-memory store implementations, mock HTTP responders, and a
//! wired-up harness for exercising delivery, dispatch, and health tracking
//! without a real database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;
use wiremock::{Request, Respond, ResponseTemplate};

use talentgate_notifications::audit::{AuditRecord, AuditSink};
use talentgate_notifications::models::{
    BackoffStrategy, Channel, ChannelDeliveryStatus, ChannelOutcome, DeliveryAttempt,
    EndpointPatch, EndpointStatus, Notification, NotificationPage, NotificationPreferences,
    NotificationQuery, SortOrder, WebhookEndpoint, WebhookMethod, ATTEMPT_HISTORY_CAPACITY,
    DEFAULT_TIMEOUT_MS,
};
use talentgate_notifications::services::{
    DeliveryEngine, EndpointRegistry, NotificationDispatcher, NotificationService,
    PreferenceService,
};
use talentgate_notifications::store::{
    EndpointStore, NotificationStore, PreferenceStore, StoreResult,
};

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Standard test user IDs
pub const USER_1: Uuid = Uuid::from_bytes([
    0xaa, 0xaa, 0x11, 0x11, 0xaa, 0xaa, 0x11, 0x11, 0xaa, 0xaa, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11,
]);

pub const USER_2: Uuid = Uuid::from_bytes([
    0xbb, 0xbb, 0x22, 0x22, 0xbb, 0xbb, 0x22, 0x22, 0xbb, 0xbb, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22,
]);

/// Encryption key used across tests.
pub const TEST_KEY: [u8; 32] = [0x42u8; 32];

/// Standard test secret
pub const SECRET_1: &str = "whsec_test_secret_key_12345";

// ---------------------------------------------------------------------------
// In-memory notification store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryNotificationStore {
    docs: Mutex<HashMap<Uuid, Notification>>,
}

impl InMemoryNotificationStore {
    fn visible(n: &Notification) -> bool {
        n.expires_at.map(|at| at > Utc::now()).unwrap_or(true)
    }

    fn matches(n: &Notification, query: &NotificationQuery) -> bool {
        if n.user_id != query.user_id || !Self::visible(n) {
            return false;
        }
        if let Some(is_read) = query.is_read {
            if n.is_read != is_read {
                return false;
            }
        }
        if let Some(is_archived) = query.is_archived {
            if n.is_archived != is_archived {
                return false;
            }
        }
        if let Some(category) = query.category {
            if n.category != category {
                return false;
            }
        }
        if let Some(priority) = query.priority {
            if n.priority != priority {
                return false;
            }
        }
        if let Some(event_type) = query.event_type {
            if n.event_type != event_type {
                return false;
            }
        }
        if let Some(after) = query.created_after {
            if n.created_at < after {
                return false;
            }
        }
        if let Some(before) = query.created_before {
            if n.created_at > before {
                return false;
            }
        }
        if let Some(ref entity_type) = query.source_entity_type {
            match &n.source {
                Some(s) if &s.entity_type == entity_type => {}
                _ => return false,
            }
        }
        if let Some(entity_id) = query.source_entity_id {
            match &n.source {
                Some(s) if s.entity_id == entity_id => {}
                _ => return false,
            }
        }
        true
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> StoreResult<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .get(&id)
            .filter(|n| n.user_id == user_id && Self::visible(n))
            .cloned())
    }

    async fn list(&self, query: &NotificationQuery) -> StoreResult<NotificationPage> {
        let docs = self.docs.lock().unwrap();
        let mut items: Vec<Notification> = docs
            .values()
            .filter(|n| Self::matches(n, query))
            .cloned()
            .collect();

        match query.sort {
            SortOrder::Asc => items.sort_by_key(|n| n.created_at),
            SortOrder::Desc => items.sort_by_key(|n| std::cmp::Reverse(n.created_at)),
        }

        let total_count = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit.max(0) as usize)
            .collect();

        Ok(NotificationPage { items, total_count })
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        let mut docs = self.docs.lock().unwrap();
        let Some(n) = docs
            .get_mut(&id)
            .filter(|n| n.user_id == user_id && Self::visible(n))
        else {
            return Ok(None);
        };

        if !n.is_read {
            let now = Utc::now();
            n.is_read = true;
            n.read_at = Some(now);
            n.updated_at = now;
            if let Some(d) = n
                .deliveries
                .iter_mut()
                .find(|d| d.channel == Channel::InApp)
            {
                d.status = ChannelDeliveryStatus::Read;
                d.read_at = Some(now);
            }
        }
        Ok(Some(n.clone()))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut docs = self.docs.lock().unwrap();
        let now = Utc::now();
        let mut affected = 0;
        for n in docs.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                n.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn set_archived(
        &self,
        user_id: Uuid,
        id: Uuid,
        archived: bool,
    ) -> StoreResult<Option<Notification>> {
        let mut docs = self.docs.lock().unwrap();
        let Some(n) = docs.get_mut(&id).filter(|n| n.user_id == user_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        n.is_archived = archived;
        n.archived_at = archived.then_some(now);
        n.updated_at = now;
        Ok(Some(n.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut docs = self.docs.lock().unwrap();
        match docs.get(&id) {
            Some(n) if n.user_id == user_id => {
                docs.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_owned(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let docs = self.docs.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| docs.get(id).map(|n| n.user_id == user_id).unwrap_or(false))
            .count() as u64)
    }

    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let mut docs = self.docs.lock().unwrap();
        let mut removed = 0;
        for id in ids {
            if docs.get(id).map(|n| n.user_id == user_id).unwrap_or(false) {
                docs.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn update_channel_delivery(
        &self,
        id: Uuid,
        channel: Channel,
        outcome: &ChannelOutcome,
    ) -> StoreResult<()> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(n) = docs.get_mut(&id) {
            if let Some(d) = n.deliveries.iter_mut().find(|d| d.channel == channel) {
                d.status = outcome.status;
                d.error = outcome.error.clone();
                d.retry_count = outcome.retry_count;
                match outcome.status {
                    ChannelDeliveryStatus::Sent => d.sent_at = Some(outcome.at),
                    ChannelDeliveryStatus::Delivered => {
                        d.sent_at = Some(outcome.at);
                        d.delivered_at = Some(outcome.at);
                    }
                    ChannelDeliveryStatus::Read => d.read_at = Some(outcome.at),
                    ChannelDeliveryStatus::Pending | ChannelDeliveryStatus::Failed => {}
                }
            }
            n.updated_at = outcome.at;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory endpoint store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryEndpointStore {
    docs: Mutex<HashMap<Uuid, WebhookEndpoint>>,
}

#[async_trait]
impl EndpointStore for InMemoryEndpointStore {
    async fn insert(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(endpoint.id, endpoint.clone());
        Ok(())
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<WebhookEndpoint>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.get(&id).filter(|e| e.user_id == user_id).cloned())
    }

    async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.docs.lock().unwrap().contains_key(&id))
    }

    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<WebhookEndpoint>> {
        let docs = self.docs.lock().unwrap();
        let mut items: Vec<WebhookEndpoint> = docs
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|e| e.created_at);
        Ok(items)
    }

    async fn find_active_for_event(
        &self,
        user_id: Uuid,
        event: &str,
    ) -> StoreResult<Vec<WebhookEndpoint>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .values()
            .filter(|e| e.user_id == user_id && e.is_deliverable() && e.subscribes_to(event))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &EndpointPatch,
    ) -> StoreResult<Option<WebhookEndpoint>> {
        let mut docs = self.docs.lock().unwrap();
        let Some(e) = docs.get_mut(&id).filter(|e| e.user_id == user_id) else {
            return Ok(None);
        };

        if let Some(ref url) = patch.url {
            e.url = url.clone();
        }
        if let Some(method) = patch.method {
            e.method = method;
        }
        if let Some(ref headers) = patch.headers {
            e.headers = Some(headers.clone());
        }
        if let Some(ref secret) = patch.secret_encrypted {
            e.secret_encrypted = secret.clone();
        }
        if let Some(ref events) = patch.events {
            e.events = events.clone();
        }
        if let Some(is_active) = patch.is_active {
            e.is_active = is_active;
        }
        if let Some(status) = patch.status {
            e.status = status;
        }
        if let Some(failures) = patch.consecutive_failures {
            e.consecutive_failures = failures;
        }
        if let Some(max_retries) = patch.max_retries {
            e.max_retries = max_retries;
        }
        if let Some(backoff) = patch.backoff {
            e.backoff = backoff;
        }
        if let Some(timeout_ms) = patch.timeout_ms {
            e.timeout_ms = timeout_ms;
        }
        e.updated_at = Utc::now();
        Ok(Some(e.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut docs = self.docs.lock().unwrap();
        match docs.get(&id) {
            Some(e) if e.user_id == user_id => {
                docs.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_attempt(
        &self,
        id: Uuid,
        attempt: &DeliveryAttempt,
    ) -> StoreResult<Option<WebhookEndpoint>> {
        let mut docs = self.docs.lock().unwrap();
        let Some(e) = docs.get_mut(&id) else {
            return Ok(None);
        };

        e.total_deliveries += 1;
        if attempt.success {
            e.successful_deliveries += 1;
            e.consecutive_failures = 0;
            e.last_success_at = Some(attempt.timestamp);
        } else {
            e.failed_deliveries += 1;
            e.consecutive_failures += 1;
            e.last_failure_at = Some(attempt.timestamp);
        }
        e.last_delivery_at = Some(attempt.timestamp);

        e.recent_attempts.push(attempt.clone());
        if e.recent_attempts.len() > ATTEMPT_HISTORY_CAPACITY {
            let excess = e.recent_attempts.len() - ATTEMPT_HISTORY_CAPACITY;
            e.recent_attempts.drain(0..excess);
        }
        e.updated_at = attempt.timestamp;

        Ok(Some(e.clone()))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EndpointStatus,
        is_active: bool,
    ) -> StoreResult<()> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(e) = docs.get_mut(&id) {
            e.status = status;
            e.is_active = is_active;
            e.updated_at = Utc::now();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory preference store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryPreferenceStore {
    docs: Mutex<HashMap<Uuid, NotificationPreferences>>,
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<NotificationPreferences>> {
        Ok(self.docs.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, preferences: &NotificationPreferences) -> StoreResult<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(preferences.user_id, preferences.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collecting audit sink
// ---------------------------------------------------------------------------

/// Audit sink that keeps every record for assertions.
#[derive(Default)]
pub struct CollectingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl CollectingAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for CollectingAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}

// ---------------------------------------------------------------------------
// Wired-up harness
// ---------------------------------------------------------------------------

/// Full service graph over in-memory stores.
pub struct TestHarness {
    pub notification_store: Arc<InMemoryNotificationStore>,
    pub endpoint_store: Arc<InMemoryEndpointStore>,
    pub preference_store: Arc<InMemoryPreferenceStore>,
    pub audit: Arc<CollectingAuditSink>,
    pub registry: Arc<EndpointRegistry>,
    pub engine: Arc<DeliveryEngine>,
    pub preferences: Arc<PreferenceService>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub notifications: Arc<NotificationService>,
}

impl TestHarness {
    pub fn new() -> Self {
        let notification_store = Arc::new(InMemoryNotificationStore::default());
        let endpoint_store = Arc::new(InMemoryEndpointStore::default());
        let preference_store = Arc::new(InMemoryPreferenceStore::default());
        let audit = Arc::new(CollectingAuditSink::default());

        let registry = Arc::new(
            EndpointRegistry::new(endpoint_store.clone(), TEST_KEY.to_vec()).with_allow_http(true),
        );
        let engine = Arc::new(
            DeliveryEngine::new(Arc::clone(&registry), audit.clone(), TEST_KEY.to_vec())
                .expect("failed to build delivery engine"),
        );
        let preferences = Arc::new(PreferenceService::new(preference_store.clone(), audit.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notification_store.clone(),
            Arc::clone(&preferences),
            Arc::clone(&registry),
            Arc::clone(&engine),
        ));
        let notifications = Arc::new(NotificationService::new(notification_store.clone()));

        Self {
            notification_store,
            endpoint_store,
            preference_store,
            audit,
            registry,
            engine,
            preferences,
            dispatcher,
            notifications,
        }
    }

    /// Insert an endpoint directly into the store, bypassing validation.
    pub async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) {
        self.endpoint_store
            .insert(endpoint)
            .await
            .expect("insert endpoint");
    }

    /// Current state of an endpoint.
    pub async fn endpoint(&self, user_id: Uuid, id: Uuid) -> WebhookEndpoint {
        self.endpoint_store
            .find(user_id, id)
            .await
            .expect("find endpoint")
            .expect("endpoint exists")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Endpoint fixture: active, exponential backoff, no retries, no secret.
pub fn test_endpoint(user_id: Uuid, url: &str, events: &[&str]) -> WebhookEndpoint {
    let now = Utc::now();
    WebhookEndpoint {
        id: Uuid::new_v4(),
        user_id,
        url: url.to_string(),
        method: WebhookMethod::Post,
        headers: None,
        secret_encrypted: None,
        events: events.iter().map(|s| s.to_string()).collect(),
        status: EndpointStatus::Active,
        is_active: true,
        max_retries: 0,
        backoff: BackoffStrategy::Exponential,
        timeout_ms: DEFAULT_TIMEOUT_MS,
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
    }
}

/// Notification fixture for direct engine calls.
pub fn test_notification(user_id: Uuid) -> Notification {
    use talentgate_notifications::models::{ChannelDelivery, NotificationEventType};

    let now = Utc::now();
    let event_type = NotificationEventType::CandidateAssigned;
    Notification {
        id: Uuid::new_v4(),
        user_id,
        event_type,
        category: event_type.category(),
        priority: event_type.default_priority(),
        title: "Candidate assigned".to_string(),
        message: "A candidate was assigned to you.".to_string(),
        data: serde_json::json!({ "candidateId": Uuid::new_v4().to_string() }),
        channels: vec![Channel::Webhook],
        deliveries: vec![ChannelDelivery::pending(Channel::Webhook)],
        is_read: false,
        read_at: None,
        is_archived: false,
        archived_at: None,
        expires_at: None,
        group_key: None,
        source: None,
        created_at: now,
        updated_at: now,
    }
}

/// Poll an async condition until it holds or the deadline passes.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..150 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}

// ---------------------------------------------------------------------------
// CapturedRequest - for inspecting webhook requests
// ---------------------------------------------------------------------------

/// A captured HTTP request with body and headers.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub method: String,
}

impl CapturedRequest {
    /// Parse the body as JSON.
    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// CaptureResponder - captures requests and returns a fixed status
// ---------------------------------------------------------------------------

/// A wiremock responder that captures incoming requests.
#[derive(Clone)]
pub struct CaptureResponder {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    response_code: u16,
}

impl CaptureResponder {
    /// Create a new capture responder that returns 200 OK.
    pub fn new() -> Self {
        Self::with_status(200)
    }

    /// Create a capture responder that returns a custom status code.
    pub fn with_status(status: u16) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response_code: status,
        }
    }

    /// Get all captured requests.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for CaptureResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for CaptureResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let captured = CapturedRequest {
            body: request.body.clone(),
            headers: request
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                .collect(),
            method: request.method.to_string(),
        };
        self.requests.lock().unwrap().push(captured);
        ResponseTemplate::new(self.response_code)
    }
}

// ---------------------------------------------------------------------------
// CountingResponder - counts requests
// ---------------------------------------------------------------------------

/// A wiremock responder that counts incoming requests.
#[derive(Clone)]
pub struct CountingResponder {
    count: Arc<AtomicU32>,
    response_code: u16,
}

impl CountingResponder {
    /// Create a new counting responder that returns 200 OK.
    pub fn new() -> Self {
        Self::with_status(200)
    }

    /// Create a counting responder that returns a custom status code.
    pub fn with_status(status: u16) -> Self {
        Self {
            count: Arc::new(AtomicU32::new(0)),
            response_code: status,
        }
    }

    /// Get the current request count.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl Default for CountingResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for CountingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.count.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(self.response_code)
    }
}

// ---------------------------------------------------------------------------
// FailingResponder - fails N times then succeeds
// ---------------------------------------------------------------------------

/// A wiremock responder that fails a specified number of times before
/// succeeding.
#[derive(Clone)]
pub struct FailingResponder {
    attempt_count: Arc<AtomicU32>,
    failures_before_success: u32,
    failure_code: u16,
}

impl FailingResponder {
    /// Create a responder that fails `n` times with 500, then returns 200.
    pub fn fail_times(n: u32) -> Self {
        Self::fail_with_status(n, 500)
    }

    /// Create a responder that fails with a custom status code.
    pub fn fail_with_status(n: u32, failure_code: u16) -> Self {
        Self {
            attempt_count: Arc::new(AtomicU32::new(0)),
            failures_before_success: n,
            failure_code,
        }
    }

    /// Get the current attempt count.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count.load(Ordering::SeqCst)
    }
}

impl Respond for FailingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.attempt_count.fetch_add(1, Ordering::SeqCst);
        if n < self.failures_before_success {
            ResponseTemplate::new(self.failure_code)
        } else {
            ResponseTemplate::new(200)
        }
    }
}
