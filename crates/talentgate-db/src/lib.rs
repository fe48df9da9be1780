//! MongoDB store implementations for the talentgate notification core.
//!
//! Implements the core's `NotificationStore`, `EndpointStore`, and
//! `PreferenceStore` traits over typed collections.

pub mod documents;
pub mod endpoints;
pub mod notifications;
pub mod preferences;

use bson::doc;
use mongodb::{Client, Database, IndexModel};

use talentgate_notifications::store::StoreError;

pub use endpoints::MongoEndpointStore;
pub use notifications::MongoNotificationStore;
pub use preferences::MongoPreferenceStore;

/// Map a driver error into the core's store error.
pub(crate) fn backend_err(e: mongodb::error::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Map a BSON (de)serialization error into the core's store error.
pub(crate) fn serde_err(e: bson::ser::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

/// Connect to MongoDB and select the application database.
///
/// # Errors
///
/// Returns `StoreError::Backend` if the connection string is invalid or the
/// server cannot be reached.
pub async fn connect(uri: &str, database: &str) -> Result<Database, StoreError> {
    let client = Client::with_uri_str(uri).await.map_err(backend_err)?;
    let db = client.database(database);

    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(backend_err)?;
    tracing::debug!(database, "MongoDB connection verified");

    Ok(db)
}

/// Create the indexes the query patterns rely on. Idempotent.
pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    db.collection::<documents::NotificationDoc>(notifications::NOTIFICATIONS_COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userId": 1, "createdAt": -1 })
                .build(),
        )
        .await
        .map_err(backend_err)?;

    db.collection::<documents::WebhookEndpointDoc>(endpoints::ENDPOINTS_COLLECTION)
        .create_index(IndexModel::builder().keys(doc! { "id": 1 }).build())
        .await
        .map_err(backend_err)?;

    db.collection::<documents::WebhookEndpointDoc>(endpoints::ENDPOINTS_COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userId": 1, "events": 1 })
                .build(),
        )
        .await
        .map_err(backend_err)?;

    db.collection::<documents::PreferencesDoc>(preferences::PREFERENCES_COLLECTION)
        .create_index(IndexModel::builder().keys(doc! { "userId": 1 }).build())
        .await
        .map_err(backend_err)?;

    Ok(())
}
