//! MongoDB implementation of the preference store.

use async_trait::async_trait;
use bson::doc;
use mongodb::{Collection, Database};
use uuid::Uuid;

use talentgate_notifications::models::NotificationPreferences;
use talentgate_notifications::store::{PreferenceStore, StoreResult};

use crate::backend_err;
use crate::documents::PreferencesDoc;

/// Collection name for preference documents.
pub const PREFERENCES_COLLECTION: &str = "notification_preferences";

/// Mongo-backed [`PreferenceStore`]. One document per user.
#[derive(Clone)]
pub struct MongoPreferenceStore {
    collection: Collection<PreferencesDoc>,
}

impl MongoPreferenceStore {
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(PREFERENCES_COLLECTION),
        }
    }
}

#[async_trait]
impl PreferenceStore for MongoPreferenceStore {
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<NotificationPreferences>> {
        let doc = self
            .collection
            .find_one(doc! { "userId": user_id.to_string() })
            .await
            .map_err(backend_err)?;
        Ok(doc.map(Into::into))
    }

    async fn upsert(&self, preferences: &NotificationPreferences) -> StoreResult<()> {
        self.collection
            .replace_one(
                doc! { "userId": preferences.user_id.to_string() },
                PreferencesDoc::from(preferences),
            )
            .upsert(true)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
