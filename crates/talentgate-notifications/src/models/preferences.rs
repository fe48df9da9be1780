//! Per-user notification preferences and API DTOs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::channel::Channel;

/// Per-user delivery configuration.
///
/// Category overrides are keyed by category wire name; keys are validated
/// against [`crate::models::NotificationCategory`] on every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    /// Hard global opt-out: when false, no channel is ever used.
    pub enabled: bool,
    pub default_channels: Vec<Channel>,
    pub categories: HashMap<String, Vec<Channel>>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// System defaults a user starts from on first access.
    #[must_use]
    pub fn defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            enabled: true,
            default_channels: Channel::system_defaults(),
            categories: HashMap::new(),
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// API DTOs
// ---------------------------------------------------------------------------

/// Shallow-merge update to a user's preferences. Only provided fields change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    pub enabled: Option<bool>,
    pub default_channels: Option<Vec<Channel>>,
}

/// Replaces the channel override for one category.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateCategoryPreferencesRequest {
    pub category: String,
    pub channels: Vec<Channel>,
}

/// Preferences as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreferencesResponse {
    pub user_id: Uuid,
    pub enabled: bool,
    pub default_channels: Vec<Channel>,
    pub categories: HashMap<String, Vec<Channel>>,
    pub updated_at: DateTime<Utc>,
}

impl From<NotificationPreferences> for PreferencesResponse {
    fn from(p: NotificationPreferences) -> Self {
        Self {
            user_id: p.user_id,
            enabled: p.enabled,
            default_channels: p.default_channels,
            categories: p.categories,
            updated_at: p.updated_at,
        }
    }
}
