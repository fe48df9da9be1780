//! `talentgate-server` -- notification and webhook service binary.
//!
//! Wires the Mongo-backed stores into the notification core and serves the
//! API. The platform gateway in front of this service authenticates requests
//! and injects the caller identity.
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default                     | Description                          |
//! |--------------------------|----------|-----------------------------|--------------------------------------|
//! | `MONGODB_URI`            | yes      | --                          | MongoDB connection string            |
//! | `MONGODB_DATABASE`       | no       | `talentgate`                | Database name                        |
//! | `BIND_ADDR`              | no       | `0.0.0.0:3000`              | Listen address                       |
//! | `WEBHOOK_ENCRYPTION_KEY` | yes      | --                          | 64 hex chars (32 bytes) for secrets  |
//! | `WEBHOOK_ALLOW_HTTP`     | no       | `false`                     | Allow plain-HTTP webhook URLs (dev)  |

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use talentgate_notifications::audit::TracingAuditSink;
use talentgate_notifications::{notifications_router, AuthContext, NotificationsState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talentgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mongodb_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    let database = std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "talentgate".into());

    let encryption_key = std::env::var("WEBHOOK_ENCRYPTION_KEY")
        .expect("WEBHOOK_ENCRYPTION_KEY must be set");
    let encryption_key = hex::decode(encryption_key.trim())
        .expect("WEBHOOK_ENCRYPTION_KEY must be hex-encoded");
    assert_eq!(
        encryption_key.len(),
        32,
        "WEBHOOK_ENCRYPTION_KEY must decode to 32 bytes"
    );

    let allow_http = std::env::var("WEBHOOK_ALLOW_HTTP")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let db = talentgate_db::connect(&mongodb_uri, &database)
        .await
        .expect("Failed to connect to MongoDB");
    tracing::info!(database = %database, "Connected to MongoDB");

    talentgate_db::ensure_indexes(&db)
        .await
        .expect("Failed to create indexes");

    let state = NotificationsState::new(
        Arc::new(talentgate_db::MongoNotificationStore::new(&db)),
        Arc::new(talentgate_db::MongoEndpointStore::new(&db)),
        Arc::new(talentgate_db::MongoPreferenceStore::new(&db)),
        Arc::new(TracingAuditSink),
        encryption_key,
        allow_http,
    )
    .expect("Failed to build notification services");

    // The gateway in front of this service replaces this with the real
    // authenticated identity; the placeholder keeps local runs working.
    let dev_identity = AuthContext::new(Uuid::nil());

    let app = Router::new()
        .merge(notifications_router(state))
        .layer(Extension(dev_identity))
        .layer(TraceLayer::new_for_http());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!(addr = %bind_addr, "Starting talentgate-server");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
