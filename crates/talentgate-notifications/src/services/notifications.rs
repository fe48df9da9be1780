//! Notification persistence and query service.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::NotifyError;
use crate::models::{
    ListNotificationsQuery, Notification, NotificationListResponse, NotificationQuery,
    NotificationResponse, NotificationSummary,
};
use crate::store::NotificationStore;

/// Default page size for listings.
const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size for listings.
const MAX_LIMIT: i64 = 100;

/// Query and mutation surface over notification entities.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Get a single notification, owner-scoped.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<NotificationResponse, NotifyError> {
        let notification = self
            .store
            .find(user_id, id)
            .await?
            .ok_or(NotifyError::NotificationNotFound)?;
        Ok(notification.into())
    }

    /// Filtered, paginated listing.
    pub async fn list(
        &self,
        user_id: Uuid,
        query: ListNotificationsQuery,
    ) -> Result<NotificationListResponse, NotifyError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0);

        let filter = NotificationQuery {
            user_id,
            is_read: query.is_read,
            is_archived: query.is_archived,
            category: query.category,
            priority: query.priority,
            event_type: query.event_type,
            created_after: query.created_after,
            created_before: query.created_before,
            source_entity_type: query.source_entity_type,
            source_entity_id: query.source_entity_id,
            limit,
            offset,
            sort: query.sort.unwrap_or_default(),
        };

        let page = self.store.list(&filter).await?;
        let has_more = offset + (page.items.len() as u64) < page.total_count;

        Ok(NotificationListResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            total_count: page.total_count,
            has_more,
        })
    }

    /// Badge counts for the dashboard.
    ///
    /// Runs over the same store predicate as the listing (non-archived,
    /// non-expired) so the badge can never disagree with the visible list.
    pub async fn summary(&self, user_id: Uuid) -> Result<NotificationSummary, NotifyError> {
        let filter = NotificationQuery {
            is_archived: Some(false),
            ..NotificationQuery::all_for_user(user_id)
        };
        let page = self.store.list(&filter).await?;

        let mut by_category: HashMap<String, u64> = HashMap::new();
        let mut by_priority: HashMap<String, u64> = HashMap::new();
        let mut unread_count: u64 = 0;

        for n in &page.items {
            *by_category.entry(n.category.as_str().to_string()).or_default() += 1;
            *by_priority.entry(n.priority.as_str().to_string()).or_default() += 1;
            if !n.is_read {
                unread_count += 1;
            }
        }

        Ok(NotificationSummary {
            unread_count,
            total_count: page.total_count,
            by_category,
            by_priority,
        })
    }

    /// Mark one notification read. Idempotent; a second call leaves
    /// `read_at` unchanged.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<NotificationResponse, NotifyError> {
        let notification = self
            .store
            .mark_read(user_id, id)
            .await?
            .ok_or(NotifyError::NotificationNotFound)?;
        Ok(notification.into())
    }

    /// Mark every unread notification for the user; returns how many changed.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, NotifyError> {
        Ok(self.store.mark_all_read(user_id).await?)
    }

    /// Archive or unarchive a notification.
    pub async fn set_archived(
        &self,
        user_id: Uuid,
        id: Uuid,
        archived: bool,
    ) -> Result<NotificationResponse, NotifyError> {
        let notification = self
            .store
            .set_archived(user_id, id, archived)
            .await?
            .ok_or(NotifyError::NotificationNotFound)?;
        Ok(notification.into())
    }

    /// Hard delete, owner-scoped.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), NotifyError> {
        let deleted = self.store.delete(user_id, id).await?;
        if !deleted {
            return Err(NotifyError::NotificationNotFound);
        }
        Ok(())
    }

    /// Bulk delete. Every target id must belong to the caller; nothing is
    /// removed otherwise.
    pub async fn bulk_delete(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, NotifyError> {
        if ids.is_empty() {
            return Err(NotifyError::Validation(
                "At least one notification id is required".to_string(),
            ));
        }

        let owned = self.store.count_owned(user_id, ids).await?;
        if owned != ids.len() as u64 {
            return Err(NotifyError::Validation(
                "One or more notifications do not belong to the caller".to_string(),
            ));
        }

        Ok(self.store.delete_many(user_id, ids).await?)
    }

    /// Fetch the domain entity (used by the dispatcher and tests).
    pub async fn find(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, NotifyError> {
        Ok(self.store.find(user_id, id).await?)
    }
}
