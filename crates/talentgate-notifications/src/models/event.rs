//! Notification event vocabulary: event types, categories, and priorities.
//!
//! Event types carry a static category and default-priority mapping used by
//! the dispatcher when the caller does not supply them explicitly.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse grouping of notification types, used for preference matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Candidates,
    Jobs,
    Interviews,
    System,
    Security,
}

impl NotificationCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidates => "candidates",
            Self::Jobs => "jobs",
            Self::Interviews => "interviews",
            Self::System => "system",
            Self::Security => "security",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "candidates" => Some(Self::Candidates),
            "jobs" => Some(Self::Jobs),
            "interviews" => Some(Self::Interviews),
            "system" => Some(Self::System),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    /// All known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Candidates,
            Self::Jobs,
            Self::Interviews,
            Self::System,
            Self::Security,
        ]
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority level of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained event tag carried by every notification and webhook payload.
///
/// Wire names are SCREAMING_SNAKE to match what subscribers register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEventType {
    CandidateApplied,
    CandidateAssigned,
    CandidateStatusChanged,
    CandidateNoteAdded,
    InterviewScheduled,
    InterviewCompleted,
    JobPosted,
    JobClosed,
    AnalysisReady,
    SecurityAlert,
    SystemUpdate,
}

impl NotificationEventType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CandidateApplied => "CANDIDATE_APPLIED",
            Self::CandidateAssigned => "CANDIDATE_ASSIGNED",
            Self::CandidateStatusChanged => "CANDIDATE_STATUS_CHANGED",
            Self::CandidateNoteAdded => "CANDIDATE_NOTE_ADDED",
            Self::InterviewScheduled => "INTERVIEW_SCHEDULED",
            Self::InterviewCompleted => "INTERVIEW_COMPLETED",
            Self::JobPosted => "JOB_POSTED",
            Self::JobClosed => "JOB_CLOSED",
            Self::AnalysisReady => "ANALYSIS_READY",
            Self::SecurityAlert => "SECURITY_ALERT",
            Self::SystemUpdate => "SYSTEM_UPDATE",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CANDIDATE_APPLIED" => Some(Self::CandidateApplied),
            "CANDIDATE_ASSIGNED" => Some(Self::CandidateAssigned),
            "CANDIDATE_STATUS_CHANGED" => Some(Self::CandidateStatusChanged),
            "CANDIDATE_NOTE_ADDED" => Some(Self::CandidateNoteAdded),
            "INTERVIEW_SCHEDULED" => Some(Self::InterviewScheduled),
            "INTERVIEW_COMPLETED" => Some(Self::InterviewCompleted),
            "JOB_POSTED" => Some(Self::JobPosted),
            "JOB_CLOSED" => Some(Self::JobClosed),
            "ANALYSIS_READY" => Some(Self::AnalysisReady),
            "SECURITY_ALERT" => Some(Self::SecurityAlert),
            "SYSTEM_UPDATE" => Some(Self::SystemUpdate),
            _ => None,
        }
    }

    /// All known event types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::CandidateApplied,
            Self::CandidateAssigned,
            Self::CandidateStatusChanged,
            Self::CandidateNoteAdded,
            Self::InterviewScheduled,
            Self::InterviewCompleted,
            Self::JobPosted,
            Self::JobClosed,
            Self::AnalysisReady,
            Self::SecurityAlert,
            Self::SystemUpdate,
        ]
    }

    /// The category this event type belongs to.
    #[must_use]
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::CandidateApplied
            | Self::CandidateAssigned
            | Self::CandidateStatusChanged
            | Self::CandidateNoteAdded
            | Self::AnalysisReady => NotificationCategory::Candidates,
            Self::InterviewScheduled | Self::InterviewCompleted => {
                NotificationCategory::Interviews
            }
            Self::JobPosted | Self::JobClosed => NotificationCategory::Jobs,
            Self::SecurityAlert => NotificationCategory::Security,
            Self::SystemUpdate => NotificationCategory::System,
        }
    }

    /// The default priority assigned when the caller does not set one.
    #[must_use]
    pub fn default_priority(&self) -> NotificationPriority {
        match self {
            Self::SecurityAlert => NotificationPriority::Urgent,
            Self::CandidateAssigned | Self::InterviewScheduled => NotificationPriority::High,
            Self::SystemUpdate | Self::JobClosed => NotificationPriority::Low,
            _ => NotificationPriority::Normal,
        }
    }
}

impl std::fmt::Display for NotificationEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        for et in NotificationEventType::all() {
            assert_eq!(NotificationEventType::parse(et.as_str()), Some(*et));
        }
    }

    #[test]
    fn test_unknown_event_type() {
        assert_eq!(NotificationEventType::parse("NOT_A_REAL_EVENT"), None);
        assert_eq!(NotificationEventType::parse("candidate_applied"), None);
    }

    #[test]
    fn test_category_round_trip() {
        for cat in NotificationCategory::all() {
            assert_eq!(NotificationCategory::parse(cat.as_str()), Some(*cat));
        }
    }

    #[test]
    fn test_security_alert_defaults() {
        let et = NotificationEventType::SecurityAlert;
        assert_eq!(et.category(), NotificationCategory::Security);
        assert_eq!(et.default_priority(), NotificationPriority::Urgent);
    }

    #[test]
    fn test_candidate_assigned_mapping() {
        let et = NotificationEventType::CandidateAssigned;
        assert_eq!(et.category(), NotificationCategory::Candidates);
        assert_eq!(et.default_priority(), NotificationPriority::High);
    }
}
