//! Preference resolution and mutation.
//!
//! Maps a user + notification category to the set of delivery channels that
//! should receive it. Category overrides beat user defaults, user defaults
//! beat the system default, and the global `enabled` flag beats everything.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditSink};
use crate::error::NotifyError;
use crate::models::{
    Channel, NotificationCategory, NotificationPreferences, PreferencesResponse,
    UpdateCategoryPreferencesRequest, UpdatePreferencesRequest,
};
use crate::store::PreferenceStore;
use crate::validation;

/// Resolves and mutates per-user notification preferences.
#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
    audit: Arc<dyn AuditSink>,
}

impl PreferenceService {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Load the user's preferences, lazily creating the document with system
    /// defaults on first access.
    pub async fn get_or_default(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationPreferences, NotifyError> {
        if let Some(prefs) = self.store.find(user_id).await? {
            return Ok(prefs);
        }

        let prefs = NotificationPreferences::defaults(user_id);
        self.store.upsert(&prefs).await?;
        Ok(prefs)
    }

    /// Effective channel set for a (user, category) pair.
    ///
    /// Returns the empty set whenever the user's global `enabled` flag is
    /// false, regardless of any override present.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
    ) -> Result<Vec<Channel>, NotifyError> {
        let prefs = self.get_or_default(user_id).await?;

        if !prefs.enabled {
            return Ok(Vec::new());
        }

        if let Some(channels) = prefs.categories.get(category.as_str()) {
            return Ok(channels.clone());
        }

        if !prefs.default_channels.is_empty() {
            return Ok(prefs.default_channels);
        }

        Ok(Channel::system_defaults())
    }

    /// Shallow merge: only provided fields change.
    pub async fn update(
        &self,
        user_id: Uuid,
        request: UpdatePreferencesRequest,
    ) -> Result<PreferencesResponse, NotifyError> {
        let mut prefs = self.get_or_default(user_id).await?;

        if let Some(enabled) = request.enabled {
            prefs.enabled = enabled;
        }
        if let Some(channels) = request.default_channels {
            prefs.default_channels = channels;
        }
        prefs.updated_at = Utc::now();

        self.store.upsert(&prefs).await?;
        self.audit_change(user_id, "notification.preferences.updated", &prefs);
        Ok(prefs.into())
    }

    /// Replace the channel override for one category.
    pub async fn update_category(
        &self,
        user_id: Uuid,
        request: UpdateCategoryPreferencesRequest,
    ) -> Result<PreferencesResponse, NotifyError> {
        let category = validation::validate_category(&request.category)?;

        let mut prefs = self.get_or_default(user_id).await?;
        prefs
            .categories
            .insert(category.as_str().to_string(), request.channels);
        prefs.updated_at = Utc::now();

        self.store.upsert(&prefs).await?;
        self.audit_change(user_id, "notification.preferences.category_updated", &prefs);
        Ok(prefs.into())
    }

    /// Reset the user's preferences to system defaults.
    pub async fn reset(&self, user_id: Uuid) -> Result<PreferencesResponse, NotifyError> {
        let prefs = NotificationPreferences::defaults(user_id);
        self.store.upsert(&prefs).await?;
        self.audit_change(user_id, "notification.preferences.reset", &prefs);
        Ok(prefs.into())
    }

    fn audit_change(&self, user_id: Uuid, event: &str, prefs: &NotificationPreferences) {
        self.audit.record(AuditRecord::new(
            event,
            Some(user_id),
            "notification_preferences",
            user_id,
            "success",
            serde_json::json!({
                "enabled": prefs.enabled,
                "default_channels": prefs.default_channels,
                "categories": prefs.categories,
            }),
        ));
    }
}
