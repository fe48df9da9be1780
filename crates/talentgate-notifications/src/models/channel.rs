//! Delivery channels and per-channel delivery state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A delivery mechanism for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Push,
    Sms,
    Webhook,
}

impl Channel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Push => "push",
            Self::Sms => "sms",
            Self::Webhook => "webhook",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(Self::InApp),
            "email" => Some(Self::Email),
            "push" => Some(Self::Push),
            "sms" => Some(Self::Sms),
            "webhook" => Some(Self::Webhook),
            _ => None,
        }
    }

    /// All known channels.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::InApp,
            Self::Email,
            Self::Push,
            Self::Sms,
            Self::Webhook,
        ]
    }

    /// System-wide default channel set, used when a user has configured nothing.
    #[must_use]
    pub fn system_defaults() -> Vec<Self> {
        vec![Self::InApp, Self::Email]
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery lifecycle of one channel for one notification.
///
/// Happy path: pending -> sent -> delivered -> read.
/// Terminal failure: pending -> failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChannelDeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl ChannelDeliveryStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

/// Per-channel delivery record embedded in a notification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChannelDelivery {
    pub channel: Channel,
    pub status: ChannelDeliveryStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Retries the delivery engine performed before this state was reached.
    pub retry_count: u32,
}

impl ChannelDelivery {
    /// A fresh pending record for a channel.
    #[must_use]
    pub fn pending(channel: Channel) -> Self {
        Self {
            channel,
            status: ChannelDeliveryStatus::Pending,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            error: None,
            retry_count: 0,
        }
    }

    /// A record already delivered at creation time (in-app: the stored
    /// notification itself is the delivery).
    #[must_use]
    pub fn delivered(channel: Channel, at: DateTime<Utc>) -> Self {
        Self {
            channel,
            status: ChannelDeliveryStatus::Delivered,
            sent_at: Some(at),
            delivered_at: Some(at),
            read_at: None,
            error: None,
            retry_count: 0,
        }
    }
}

/// Outcome written back onto a notification's channel record after delivery.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    pub status: ChannelDeliveryStatus,
    pub error: Option<String>,
    pub retry_count: u32,
    pub at: DateTime<Utc>,
}
