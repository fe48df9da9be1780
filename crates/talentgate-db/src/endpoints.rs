//! MongoDB implementation of the webhook endpoint store.
//!
//! The delivery-result update is a single atomic command: `$inc` on the
//! counters, `$set` on the timestamps, and `$push` with `$each`/`$slice` on
//! the bounded attempt ring buffer. Concurrent deliveries to the same
//! endpoint can never lose a counter update.

use async_trait::async_trait;
use bson::{doc, Bson, DateTime as BsonDateTime, Document};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use uuid::Uuid;

use talentgate_notifications::models::{
    DeliveryAttempt, EndpointPatch, EndpointStatus, WebhookEndpoint, ATTEMPT_HISTORY_CAPACITY,
    WILDCARD_EVENT,
};
use talentgate_notifications::store::{EndpointStore, StoreResult};

use crate::backend_err;
use crate::documents::{DeliveryAttemptDoc, WebhookEndpointDoc};

/// Collection name for webhook endpoint documents.
pub const ENDPOINTS_COLLECTION: &str = "webhook_endpoints";

/// Mongo-backed [`EndpointStore`].
#[derive(Clone)]
pub struct MongoEndpointStore {
    collection: Collection<WebhookEndpointDoc>,
}

impl MongoEndpointStore {
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(ENDPOINTS_COLLECTION),
        }
    }
}

#[async_trait]
impl EndpointStore for MongoEndpointStore {
    async fn insert(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        self.collection
            .insert_one(WebhookEndpointDoc::from(endpoint))
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<WebhookEndpoint>> {
        let doc = self
            .collection
            .find_one(doc! { "id": id.to_string(), "userId": user_id.to_string() })
            .await
            .map_err(backend_err)?;
        Ok(doc.map(Into::into))
    }

    async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "id": id.to_string() })
            .await
            .map_err(backend_err)?;
        Ok(count > 0)
    }

    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<WebhookEndpoint>> {
        let docs: Vec<WebhookEndpointDoc> = self
            .collection
            .find(doc! { "userId": user_id.to_string() })
            .sort(doc! { "createdAt": 1 })
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn find_active_for_event(
        &self,
        user_id: Uuid,
        event: &str,
    ) -> StoreResult<Vec<WebhookEndpoint>> {
        let docs: Vec<WebhookEndpointDoc> = self
            .collection
            .find(doc! {
                "userId": user_id.to_string(),
                "isActive": true,
                "status": EndpointStatus::Active.as_str(),
                "events": { "$in": [WILDCARD_EVENT, event] },
            })
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &EndpointPatch,
    ) -> StoreResult<Option<WebhookEndpoint>> {
        let mut set = Document::new();
        if let Some(ref url) = patch.url {
            set.insert("url", url.as_str());
        }
        if let Some(method) = patch.method {
            set.insert("method", method.as_str());
        }
        if let Some(ref headers) = patch.headers {
            let headers_doc: Document = headers
                .iter()
                .map(|(k, v)| (k.clone(), Bson::String(v.clone())))
                .collect();
            set.insert("headers", headers_doc);
        }
        if let Some(ref secret) = patch.secret_encrypted {
            match secret {
                Some(value) => set.insert("secretEncrypted", value.as_str()),
                None => set.insert("secretEncrypted", Bson::Null),
            };
        }
        if let Some(ref events) = patch.events {
            set.insert("events", events.clone());
        }
        if let Some(is_active) = patch.is_active {
            set.insert("isActive", is_active);
        }
        if let Some(status) = patch.status {
            set.insert("status", status.as_str());
        }
        if let Some(failures) = patch.consecutive_failures {
            set.insert("consecutiveFailures", i64::from(failures));
        }
        if let Some(max_retries) = patch.max_retries {
            set.insert("maxRetries", i64::from(max_retries));
        }
        if let Some(backoff) = patch.backoff {
            set.insert("backoff", backoff.as_str());
        }
        if let Some(timeout_ms) = patch.timeout_ms {
            set.insert("timeoutMs", timeout_ms as i64);
        }
        set.insert("updatedAt", BsonDateTime::now());

        let doc = self
            .collection
            .find_one_and_update(
                doc! { "id": id.to_string(), "userId": user_id.to_string() },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_err)?;
        Ok(doc.map(Into::into))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "id": id.to_string(), "userId": user_id.to_string() })
            .await
            .map_err(backend_err)?;
        Ok(result.deleted_count > 0)
    }

    async fn record_attempt(
        &self,
        id: Uuid,
        attempt: &DeliveryAttempt,
    ) -> StoreResult<Option<WebhookEndpoint>> {
        let now = BsonDateTime::from_chrono(attempt.timestamp);
        let attempt_bson =
            bson::to_bson(&DeliveryAttemptDoc::from(attempt)).map_err(crate::serde_err)?;

        let update = if attempt.success {
            doc! {
                "$inc": { "totalDeliveries": 1_i64, "successfulDeliveries": 1_i64 },
                "$set": {
                    "consecutiveFailures": 0,
                    "lastSuccessAt": now,
                    "lastDeliveryAt": now,
                    "updatedAt": now,
                },
                "$push": { "recentAttempts": {
                    "$each": [attempt_bson],
                    "$slice": -(ATTEMPT_HISTORY_CAPACITY as i32),
                } },
            }
        } else {
            doc! {
                "$inc": {
                    "totalDeliveries": 1_i64,
                    "failedDeliveries": 1_i64,
                    "consecutiveFailures": 1,
                },
                "$set": {
                    "lastFailureAt": now,
                    "lastDeliveryAt": now,
                    "updatedAt": now,
                },
                "$push": { "recentAttempts": {
                    "$each": [attempt_bson],
                    "$slice": -(ATTEMPT_HISTORY_CAPACITY as i32),
                } },
            }
        };

        let doc = self
            .collection
            .find_one_and_update(doc! { "id": id.to_string() }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_err)?;
        Ok(doc.map(Into::into))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EndpointStatus,
        is_active: bool,
    ) -> StoreResult<()> {
        self.collection
            .update_one(
                doc! { "id": id.to_string() },
                doc! { "$set": {
                    "status": status.as_str(),
                    "isActive": is_active,
                    "updatedAt": BsonDateTime::now(),
                } },
            )
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
