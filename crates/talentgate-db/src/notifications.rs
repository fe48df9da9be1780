//! MongoDB implementation of the notification store.

use async_trait::async_trait;
use bson::{doc, Bson, DateTime as BsonDateTime, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use uuid::Uuid;

use talentgate_notifications::models::{
    Channel, ChannelDeliveryStatus, ChannelOutcome, Notification, NotificationPage,
    NotificationQuery, SortOrder,
};
use talentgate_notifications::store::{NotificationStore, StoreResult};

use crate::backend_err;
use crate::documents::NotificationDoc;

/// Collection name for notification documents.
pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// Mongo-backed [`NotificationStore`].
#[derive(Clone)]
pub struct MongoNotificationStore {
    collection: Collection<NotificationDoc>,
}

impl MongoNotificationStore {
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(NOTIFICATIONS_COLLECTION),
        }
    }

    /// Filter document for the query, including the expiry cutoff.
    fn filter_for(query: &NotificationQuery) -> Document {
        let mut filter = doc! {
            "userId": query.user_id.to_string(),
            "$or": [
                { "expiresAt": Bson::Null },
                { "expiresAt": { "$gt": BsonDateTime::now() } },
            ],
        };

        if let Some(is_read) = query.is_read {
            filter.insert("isRead", is_read);
        }
        if let Some(is_archived) = query.is_archived {
            filter.insert("isArchived", is_archived);
        }
        if let Some(category) = query.category {
            filter.insert("category", category.as_str());
        }
        if let Some(priority) = query.priority {
            filter.insert("priority", priority.as_str());
        }
        if let Some(event_type) = query.event_type {
            filter.insert("eventType", event_type.as_str());
        }

        let mut created = Document::new();
        if let Some(after) = query.created_after {
            created.insert("$gte", BsonDateTime::from_chrono(after));
        }
        if let Some(before) = query.created_before {
            created.insert("$lte", BsonDateTime::from_chrono(before));
        }
        if !created.is_empty() {
            filter.insert("createdAt", created);
        }

        if let Some(ref entity_type) = query.source_entity_type {
            filter.insert("source.entityType", entity_type.as_str());
        }
        if let Some(entity_id) = query.source_entity_id {
            filter.insert("source.entityId", entity_id.to_string());
        }

        filter
    }

    /// Owner-and-expiry-scoped filter for one document.
    fn id_filter(user_id: Uuid, id: Uuid) -> Document {
        doc! {
            "id": id.to_string(),
            "userId": user_id.to_string(),
            "$or": [
                { "expiresAt": Bson::Null },
                { "expiresAt": { "$gt": BsonDateTime::now() } },
            ],
        }
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        let doc = self
            .collection
            .find_one(Self::id_filter(user_id, id))
            .await
            .map_err(backend_err)?;
        Ok(doc.map(Into::into))
    }
}

#[async_trait]
impl NotificationStore for MongoNotificationStore {
    async fn insert(&self, notification: &Notification) -> StoreResult<()> {
        self.collection
            .insert_one(NotificationDoc::from(notification))
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        self.fetch(user_id, id).await
    }

    async fn list(&self, query: &NotificationQuery) -> StoreResult<NotificationPage> {
        let filter = Self::filter_for(query);

        let total_count = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(backend_err)?;

        let order = match query.sort {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };

        let mut find = self
            .collection
            .find(filter)
            .sort(doc! { "createdAt": order })
            .skip(query.offset);
        if query.limit < i64::MAX {
            find = find.limit(query.limit);
        }

        let docs: Vec<NotificationDoc> = find
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)?;

        Ok(NotificationPage {
            items: docs.into_iter().map(Into::into).collect(),
            total_count,
        })
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        let now = BsonDateTime::now();

        // Only an unread document matches, so a repeated call changes
        // nothing and readAt keeps its original value.
        self.collection
            .update_one(
                doc! { "id": id.to_string(), "userId": user_id.to_string(), "isRead": false },
                doc! { "$set": { "isRead": true, "readAt": now, "updatedAt": now } },
            )
            .await
            .map_err(backend_err)?;

        self.collection
            .update_one(
                doc! {
                    "id": id.to_string(),
                    "userId": user_id.to_string(),
                    "deliveries.channel": Channel::InApp.as_str(),
                    "deliveries.status": { "$ne": ChannelDeliveryStatus::Read.as_str() },
                },
                doc! { "$set": {
                    "deliveries.$.status": ChannelDeliveryStatus::Read.as_str(),
                    "deliveries.$.readAt": now,
                } },
            )
            .await
            .map_err(backend_err)?;

        self.fetch(user_id, id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let now = BsonDateTime::now();

        let result = self
            .collection
            .update_many(
                doc! { "userId": user_id.to_string(), "isRead": false },
                doc! { "$set": { "isRead": true, "readAt": now, "updatedAt": now } },
            )
            .await
            .map_err(backend_err)?;

        self.collection
            .update_many(
                doc! {
                    "userId": user_id.to_string(),
                    "deliveries.channel": Channel::InApp.as_str(),
                    "deliveries.status": { "$ne": ChannelDeliveryStatus::Read.as_str() },
                },
                doc! { "$set": {
                    "deliveries.$.status": ChannelDeliveryStatus::Read.as_str(),
                    "deliveries.$.readAt": now,
                } },
            )
            .await
            .map_err(backend_err)?;

        Ok(result.modified_count)
    }

    async fn set_archived(
        &self,
        user_id: Uuid,
        id: Uuid,
        archived: bool,
    ) -> StoreResult<Option<Notification>> {
        let now = BsonDateTime::now();
        let archived_at = if archived {
            Bson::DateTime(now)
        } else {
            Bson::Null
        };

        self.collection
            .update_one(
                doc! { "id": id.to_string(), "userId": user_id.to_string() },
                doc! { "$set": {
                    "isArchived": archived,
                    "archivedAt": archived_at,
                    "updatedAt": now,
                } },
            )
            .await
            .map_err(backend_err)?;

        self.fetch(user_id, id).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "id": id.to_string(), "userId": user_id.to_string() })
            .await
            .map_err(backend_err)?;
        Ok(result.deleted_count > 0)
    }

    async fn count_owned(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        self.collection
            .count_documents(doc! {
                "userId": user_id.to_string(),
                "id": { "$in": id_strings },
            })
            .await
            .map_err(backend_err)
    }

    async fn delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let result = self
            .collection
            .delete_many(doc! {
                "userId": user_id.to_string(),
                "id": { "$in": id_strings },
            })
            .await
            .map_err(backend_err)?;
        Ok(result.deleted_count)
    }

    async fn update_channel_delivery(
        &self,
        id: Uuid,
        channel: Channel,
        outcome: &ChannelOutcome,
    ) -> StoreResult<()> {
        let at = BsonDateTime::from_chrono(outcome.at);

        let mut set = doc! {
            "deliveries.$.status": outcome.status.as_str(),
            "deliveries.$.retryCount": i64::from(outcome.retry_count),
            "updatedAt": at,
        };
        match outcome.status {
            ChannelDeliveryStatus::Sent => {
                set.insert("deliveries.$.sentAt", at);
            }
            ChannelDeliveryStatus::Delivered => {
                set.insert("deliveries.$.sentAt", at);
                set.insert("deliveries.$.deliveredAt", at);
            }
            ChannelDeliveryStatus::Read => {
                set.insert("deliveries.$.readAt", at);
            }
            ChannelDeliveryStatus::Pending | ChannelDeliveryStatus::Failed => {}
        }
        if let Some(ref error) = outcome.error {
            set.insert("deliveries.$.error", error.as_str());
        }

        self.collection
            .update_one(
                doc! { "id": id.to_string(), "deliveries.channel": channel.as_str() },
                doc! { "$set": set },
            )
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
