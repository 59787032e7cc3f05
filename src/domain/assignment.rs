//! Assignment lifecycle.
//!
//! ```text
//! PENDING ──claim/approve──▶ IN_PROGRESS ──complete──▶ COMPLETED
//!    │                           │
//!    └──────────reject───────────┴──────────▶ REJECTED
//! ```
//!
//! The guard functions here are the single source of truth for which
//! transitions are legal. Repositories mirror them in the `WHERE` clause of
//! their conditional updates so the check and the write are one statement.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::principal::{contact_channel_error, has_contact_channel};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::InProgress => "IN_PROGRESS",
            AssignmentStatus::Completed => "COMPLETED",
            AssignmentStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(AssignmentStatus::Pending),
            "IN_PROGRESS" => Some(AssignmentStatus::InProgress),
            "COMPLETED" => Some(AssignmentStatus::Completed),
            "REJECTED" => Some(AssignmentStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Completed | AssignmentStatus::Rejected)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub comments: Option<String>,
    pub files: Vec<String>,
    pub submitter_name: String,
    pub submitter_phone: String,
    pub submitter_email: Option<String>,
    pub submitter_telegram: Option<String>,
    pub submitter_whatsapp: Option<String>,
    pub department_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub status: AssignmentStatus,
    pub is_approved_by_admin: bool,
    pub solution_delivered: bool,
    pub ai_detection_screenshot: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a requested transition is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardViolation {
    NotApprovedByAdmin,
    AssignedToAnotherMaker,
    NotOwner,
    InvalidStatus {
        current: AssignmentStatus,
        action: &'static str,
    },
    MissingEvidence,
    NotCompleted,
}

impl fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardViolation::NotApprovedByAdmin => write!(f, "Assignment not approved by admin"),
            GuardViolation::AssignedToAnotherMaker => {
                write!(f, "Assignment already assigned to another maker")
            }
            GuardViolation::NotOwner => write!(f, "Assignment is not assigned to you"),
            GuardViolation::InvalidStatus { current, action } => {
                write!(f, "Cannot {} an assignment that is {}", action, current)
            }
            GuardViolation::MissingEvidence => write!(f, "AI detection screenshot is required"),
            GuardViolation::NotCompleted => write!(f, "Assignment is not completed"),
        }
    }
}

/// Result of an admin approval: the status the assignment ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalEffect {
    /// Pre-completion item moved to (or kept in) IN_PROGRESS.
    Activated,
    /// Already COMPLETED; status untouched, commission payment finalized.
    FinalizeCompleted,
}

impl Assignment {
    /// A maker may claim an approved, non-terminal item that is free or already theirs.
    pub fn check_claim(&self, maker_id: Uuid) -> Result<(), GuardViolation> {
        if !matches!(
            self.status,
            AssignmentStatus::Pending | AssignmentStatus::InProgress
        ) {
            return Err(GuardViolation::InvalidStatus {
                current: self.status,
                action: "claim",
            });
        }
        if !self.is_approved_by_admin {
            return Err(GuardViolation::NotApprovedByAdmin);
        }
        match self.assigned_to_id {
            Some(owner) if owner != maker_id => Err(GuardViolation::AssignedToAnotherMaker),
            _ => Ok(()),
        }
    }

    /// Completion is only for the owner of an approved IN_PROGRESS item.
    pub fn check_complete(&self, maker_id: Uuid) -> Result<(), GuardViolation> {
        if self.assigned_to_id != Some(maker_id) {
            return Err(GuardViolation::NotOwner);
        }
        if self.status != AssignmentStatus::InProgress {
            return Err(GuardViolation::InvalidStatus {
                current: self.status,
                action: "complete",
            });
        }
        if !self.is_approved_by_admin {
            return Err(GuardViolation::NotApprovedByAdmin);
        }
        Ok(())
    }

    pub fn check_approve(&self) -> Result<ApprovalEffect, GuardViolation> {
        match self.status {
            AssignmentStatus::Pending | AssignmentStatus::InProgress => {
                Ok(ApprovalEffect::Activated)
            }
            AssignmentStatus::Completed => Ok(ApprovalEffect::FinalizeCompleted),
            AssignmentStatus::Rejected => Err(GuardViolation::InvalidStatus {
                current: self.status,
                action: "approve",
            }),
        }
    }

    /// Rejection pre-empts any in-flight work but never undoes a paid completion.
    pub fn check_reject(&self) -> Result<(), GuardViolation> {
        if self.status == AssignmentStatus::Completed {
            return Err(GuardViolation::InvalidStatus {
                current: self.status,
                action: "reject",
            });
        }
        Ok(())
    }

    pub fn check_reassign(&self) -> Result<(), GuardViolation> {
        if self.status.is_terminal() {
            return Err(GuardViolation::InvalidStatus {
                current: self.status,
                action: "reassign",
            });
        }
        Ok(())
    }

    /// Admin status edits only move between the two pre-terminal states.
    pub fn check_set_status(&self, target: AssignmentStatus) -> Result<(), GuardViolation> {
        if self.status.is_terminal() || target.is_terminal() {
            return Err(GuardViolation::InvalidStatus {
                current: self.status,
                action: "change the status of",
            });
        }
        Ok(())
    }

    pub fn check_mark_delivered(&self) -> Result<(), GuardViolation> {
        if self.status != AssignmentStatus::Completed {
            return Err(GuardViolation::NotCompleted);
        }
        Ok(())
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.status, self.is_approved_by_admin, self.solution_delivered)
    }
}

/// Human-readable label shown to both admins and makers.
pub fn status_label(
    status: AssignmentStatus,
    is_approved_by_admin: bool,
    solution_delivered: bool,
) -> &'static str {
    match status {
        AssignmentStatus::Rejected => "Rejected",
        AssignmentStatus::Completed if solution_delivered => "Delivered",
        AssignmentStatus::Completed => "Completed",
        AssignmentStatus::InProgress if is_approved_by_admin => "In progress",
        AssignmentStatus::Pending if is_approved_by_admin => "Available",
        AssignmentStatus::Pending | AssignmentStatus::InProgress => "Awaiting approval",
    }
}

/// Seeker submission, validated before anything is written.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_submitter_contact"))]
pub struct SubmitAssignmentRequest {
    #[validate(length(min = 5, max = 200, message = "Assignment title must be at least 5 characters long"))]
    pub title: String,
    #[validate(length(min = 20, message = "Assignment description must be at least 20 characters long"))]
    pub description: String,
    pub comments: Option<String>,
    #[validate(length(min = 2, message = "Submitter name must be at least 2 characters long"))]
    pub submitter_name: String,
    #[validate(length(min = 8, max = 20, message = "Please provide a valid phone number"))]
    pub submitter_phone: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub submitter_email: Option<String>,
    pub submitter_telegram: Option<String>,
    pub submitter_whatsapp: Option<String>,
    pub department_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
}

fn validate_submitter_contact(request: &SubmitAssignmentRequest) -> Result<(), ValidationError> {
    if has_contact_channel(
        request.submitter_telegram.as_deref(),
        request.submitter_whatsapp.as_deref(),
    ) {
        Ok(())
    } else {
        Err(contact_channel_error())
    }
}

/// Row to insert for a validated submission.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub code: String,
    pub request: SubmitAssignmentRequest,
    pub files: Vec<String>,
}

/// Alphabet without 0/O and 1/I so codes survive being read over the phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

pub fn generate_assignment_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("ASG-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(status: AssignmentStatus, approved: bool, owner: Option<Uuid>) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            code: generate_assignment_code(),
            title: "Linear algebra".to_string(),
            description: "Solve the attached problem set".to_string(),
            comments: None,
            files: Vec::new(),
            submitter_name: "Seeker".to_string(),
            submitter_phone: "+251911000000".to_string(),
            submitter_email: None,
            submitter_telegram: Some("seeker".to_string()),
            submitter_whatsapp: None,
            department_id: Uuid::new_v4(),
            assigned_to_id: owner,
            status,
            is_approved_by_admin: approved,
            solution_delivered: false,
            ai_detection_screenshot: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_claim_guards() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(assignment(AssignmentStatus::Pending, true, None).check_claim(me).is_ok());
        assert!(assignment(AssignmentStatus::InProgress, true, Some(me)).check_claim(me).is_ok());
        assert_eq!(
            assignment(AssignmentStatus::Pending, true, Some(other)).check_claim(me),
            Err(GuardViolation::AssignedToAnotherMaker)
        );
        assert_eq!(
            assignment(AssignmentStatus::Pending, false, None).check_claim(me),
            Err(GuardViolation::NotApprovedByAdmin)
        );
        assert!(matches!(
            assignment(AssignmentStatus::Rejected, false, None).check_claim(me),
            Err(GuardViolation::InvalidStatus { .. })
        ));
        assert!(matches!(
            assignment(AssignmentStatus::Completed, true, Some(me)).check_claim(me),
            Err(GuardViolation::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_complete_guards() {
        let me = Uuid::new_v4();
        assert!(assignment(AssignmentStatus::InProgress, true, Some(me)).check_complete(me).is_ok());
        assert_eq!(
            assignment(AssignmentStatus::InProgress, true, Some(Uuid::new_v4())).check_complete(me),
            Err(GuardViolation::NotOwner)
        );
        assert!(matches!(
            assignment(AssignmentStatus::Completed, true, Some(me)).check_complete(me),
            Err(GuardViolation::InvalidStatus { .. })
        ));
        assert_eq!(
            assignment(AssignmentStatus::InProgress, false, Some(me)).check_complete(me),
            Err(GuardViolation::NotApprovedByAdmin)
        );
    }

    #[test]
    fn test_admin_decisions() {
        assert_eq!(
            assignment(AssignmentStatus::Pending, false, None).check_approve(),
            Ok(ApprovalEffect::Activated)
        );
        assert_eq!(
            assignment(AssignmentStatus::Completed, true, None).check_approve(),
            Ok(ApprovalEffect::FinalizeCompleted)
        );
        assert!(assignment(AssignmentStatus::Rejected, false, None).check_approve().is_err());

        assert!(assignment(AssignmentStatus::Pending, true, None).check_reject().is_ok());
        assert!(assignment(AssignmentStatus::InProgress, true, None).check_reject().is_ok());
        assert!(assignment(AssignmentStatus::Completed, true, None).check_reject().is_err());
    }

    #[test]
    fn test_set_status_stays_pre_terminal() {
        let item = assignment(AssignmentStatus::InProgress, true, None);
        assert!(item.check_set_status(AssignmentStatus::Pending).is_ok());
        assert!(item.check_set_status(AssignmentStatus::Completed).is_err());
        assert!(assignment(AssignmentStatus::Rejected, false, None)
            .check_set_status(AssignmentStatus::Pending)
            .is_err());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(AssignmentStatus::Pending, false, false), "Awaiting approval");
        assert_eq!(status_label(AssignmentStatus::Pending, true, false), "Available");
        assert_eq!(status_label(AssignmentStatus::InProgress, true, false), "In progress");
        assert_eq!(status_label(AssignmentStatus::Completed, true, false), "Completed");
        assert_eq!(status_label(AssignmentStatus::Completed, true, true), "Delivered");
        assert_eq!(status_label(AssignmentStatus::Rejected, true, false), "Rejected");
    }

    #[test]
    fn test_assignment_code_format() {
        let code = generate_assignment_code();
        assert!(code.starts_with("ASG-"));
        assert_eq!(code.len(), 4 + CODE_LEN);
        assert!(code[4..].bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }
}
