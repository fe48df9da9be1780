//! URL, event, and channel validation for webhook and preference input.
//!
//! Validates webhook URLs against:
//! - Protocol requirements (HTTPS in production)
//! - SSRF protections (private/internal IP ranges, cloud metadata endpoints)

use std::net::IpAddr;

use crate::error::NotifyError;
use crate::models::{NotificationCategory, NotificationEventType, WILDCARD_EVENT};

// ---------------------------------------------------------------------------
// URL validation
// ---------------------------------------------------------------------------

/// Validate a webhook delivery URL.
///
/// Checks:
/// 1. URL is parseable
/// 2. Scheme is HTTPS (or HTTP if `allow_http` is true for dev/test)
/// 3. Host is not a private/internal address (SSRF protection)
pub fn validate_webhook_url(url: &str, allow_http: bool) -> Result<(), NotifyError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| NotifyError::InvalidUrl(format!("Invalid URL format: {e}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(NotifyError::InvalidUrl(
                "Webhook URLs must use HTTPS".to_string(),
            ));
        }
        scheme => {
            return Err(NotifyError::InvalidUrl(format!(
                "Unsupported URL scheme: {scheme}"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| NotifyError::InvalidUrl("URL must have a host".to_string()))?;

    validate_host_not_internal(host)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Validate that a host is not a private/internal address.
///
/// Blocks:
/// - Loopback addresses (127.0.0.0/8)
/// - Private networks (10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16)
/// - Link-local (169.254.0.0/16, cloud metadata endpoint)
/// - CGNAT (100.64.0.0/10)
/// - IPv6 loopback and unspecified
/// - Internal hostnames (localhost, *.internal, *.local)
pub fn validate_host_not_internal(host: &str) -> Result<(), NotifyError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_internal_ip(&ip) {
            return Err(NotifyError::SsrfDetected(format!(
                "Destination host {host} is a private/internal address"
            )));
        }
    }

    let lower = host.to_ascii_lowercase();
    if lower == "localhost"
        || lower == "metadata.google.internal"
        || lower.ends_with(".internal")
        || lower.ends_with(".local")
    {
        return Err(NotifyError::SsrfDetected(format!(
            "Destination host {host} is a restricted internal hostname"
        )));
    }

    Ok(())
}

/// Check if an IP address belongs to a private/internal range.
fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()                // 127.0.0.0/8
                || v4.is_private()          // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
                || v4.is_link_local()       // 169.254.0.0/16
                || v4.is_broadcast()
                || v4.is_unspecified()
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64) // 100.64.0.0/10 (CGNAT)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

// ---------------------------------------------------------------------------
// Event and channel validation
// ---------------------------------------------------------------------------

/// Validate that the subscription event list is non-empty and every entry is
/// a known event wire name or the "ALL" wildcard.
pub fn validate_events(events: &[String]) -> Result<(), NotifyError> {
    if events.is_empty() {
        return Err(NotifyError::Validation(
            "At least one event must be subscribed".to_string(),
        ));
    }
    for ev in events {
        if ev != WILDCARD_EVENT && NotificationEventType::parse(ev).is_none() {
            return Err(NotifyError::Validation(format!("Unknown event type: {ev}")));
        }
    }
    Ok(())
}

/// Validate a category key used in preference overrides.
pub fn validate_category(category: &str) -> Result<NotificationCategory, NotifyError> {
    NotificationCategory::parse(category)
        .ok_or_else(|| NotifyError::Validation(format!("Unknown category: {category}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
