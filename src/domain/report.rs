use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub assignment_id: Option<Uuid>,
    pub reported_user_id: Option<Uuid>,
    pub reporter_name: String,
    pub reporter_email: Option<String>,
    pub reporter_phone: Option<String>,
    pub status: ReportStatus,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Investigating,
    Dismissed,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Investigating => "INVESTIGATING",
            ReportStatus::Dismissed => "DISMISSED",
            ReportStatus::Resolved => "RESOLVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ReportStatus::Pending),
            "INVESTIGATING" => Some(ReportStatus::Investigating),
            "DISMISSED" => Some(ReportStatus::Dismissed),
            "RESOLVED" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }

    /// Strict workflow: PENDING -> {INVESTIGATING, DISMISSED} -> RESOLVED.
    /// Staying in the same status is always allowed so responses can be edited.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Investigating)
                | (Pending, Dismissed)
                | (Investigating, Resolved)
                | (Dismissed, Resolved)
        )
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub assignment_id: Option<Uuid>,
    pub reported_user_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Reporter name is required"))]
    pub reporter_name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub reporter_email: Option<String>,
    pub reporter_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReportRequest {
    pub status: ReportStatus,
    pub admin_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_transitions() {
        use ReportStatus::*;
        assert!(Pending.can_transition_to(Investigating));
        assert!(Pending.can_transition_to(Dismissed));
        assert!(Investigating.can_transition_to(Resolved));
        assert!(Dismissed.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Resolved));
        assert!(!Investigating.can_transition_to(Dismissed));
        assert!(!Pending.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(Pending));
        assert!(!Investigating.can_transition_to(Pending));
    }
}
