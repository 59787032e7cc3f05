//! Assignment lifecycle.
//!
//! Every transition is a conditional write in the repository. When the write
//! matches nothing, the assignment is reloaded and the domain guard explains
//! which precondition failed.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{
        AssignmentFilter, AssignmentRepository, Completion, DepartmentRepository, MakerRepository,
    },
    storage::{FileStore, UploadKind, UploadedFile},
};

const CODE_ATTEMPTS: usize = 3;

pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    departments: Arc<dyn DepartmentRepository>,
    makers: Arc<dyn MakerRepository>,
    files: Arc<dyn FileStore>,
}

fn guard_error(violation: GuardViolation) -> AppError {
    match violation {
        GuardViolation::NotOwner => AppError::Forbidden,
        GuardViolation::MissingEvidence => AppError::Validation(violation.to_string()),
        other => AppError::Conflict(other.to_string()),
    }
}

impl AssignmentService {
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        departments: Arc<dyn DepartmentRepository>,
        makers: Arc<dyn MakerRepository>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self { assignments, departments, makers, files }
    }

    pub async fn get(&self, id: Uuid) -> Result<Assignment> {
        self.assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))
    }

    pub async fn list(&self, filter: AssignmentFilter) -> Result<Vec<Assignment>> {
        self.assignments.list(filter).await
    }

    pub async fn list_for_maker(&self, maker_id: Uuid) -> Result<Vec<Assignment>> {
        self.assignments
            .list(AssignmentFilter {
                assigned_to_id: Some(maker_id),
                ..Default::default()
            })
            .await
    }

    pub async fn list_claimable(&self, department_id: Uuid, maker_id: Uuid) -> Result<Vec<Assignment>> {
        self.assignments.list_claimable(department_id, maker_id).await
    }

    /// Explains why a conditional write matched no row.
    async fn refusal<F>(&self, id: Uuid, check: F) -> AppError
    where
        F: FnOnce(&Assignment) -> std::result::Result<(), GuardViolation>,
    {
        match self.assignments.find_by_id(id).await {
            Ok(None) => AppError::NotFound("Assignment not found".to_string()),
            Ok(Some(current)) => match check(&current) {
                Err(violation) => guard_error(violation),
                // The row changed between the write and the reload.
                Ok(()) => AppError::Conflict("Assignment was modified concurrently".to_string()),
            },
            Err(e) => e,
        }
    }

    async fn remove_uploads(&self, uris: &[String]) {
        for uri in uris {
            if let Err(e) = self.files.delete(uri).await {
                tracing::warn!("Failed to remove orphaned upload {}: {}", uri, e);
            }
        }
    }

    /// Seeker submission. Attachments are stored first and removed again if
    /// the row cannot be written.
    pub async fn submit(
        &self,
        request: SubmitAssignmentRequest,
        attachments: Vec<UploadedFile>,
    ) -> Result<Assignment> {
        request.validate()?;

        if self.departments.find_by_id(request.department_id).await?.is_none() {
            return Err(AppError::Validation("Selected department does not exist".to_string()));
        }

        if let Some(maker_id) = request.assigned_to_id {
            let maker = self.makers.find_by_id(maker_id).await?;
            match maker {
                Some(m) if m.is_eligible() && m.department_id == request.department_id => {}
                _ => {
                    return Err(AppError::Validation(
                        "Selected maker is not available for this department".to_string(),
                    ))
                }
            }
        }

        let mut files = Vec::with_capacity(attachments.len());
        for attachment in &attachments {
            match self
                .files
                .store(UploadKind::AssignmentAttachment, &attachment.filename, &attachment.data)
                .await
            {
                Ok(uri) => files.push(uri),
                Err(e) => {
                    self.remove_uploads(&files).await;
                    return Err(e);
                }
            }
        }

        let mut attempt = 0;
        let created = loop {
            attempt += 1;
            let new_assignment = NewAssignment {
                code: generate_assignment_code(),
                request: request.clone(),
                files: files.clone(),
            };
            match self.assignments.create(new_assignment).await {
                Err(AppError::Conflict(msg)) if attempt < CODE_ATTEMPTS => {
                    tracing::debug!("Retrying assignment code: {}", msg);
                }
                other => break other,
            }
        };

        match created {
            Ok(assignment) => {
                tracing::info!(
                    "Assignment {} ({}) submitted in department {}",
                    assignment.code,
                    assignment.id,
                    assignment.department_id
                );
                Ok(assignment)
            }
            Err(e) => {
                self.remove_uploads(&files).await;
                Err(e)
            }
        }
    }

    /// Compare-and-swap claim. Re-claiming one's own assignment succeeds.
    pub async fn claim(&self, id: Uuid, maker_id: Uuid) -> Result<Assignment> {
        match self.assignments.claim(id, maker_id).await? {
            Some(assignment) => {
                tracing::info!("Maker {} claimed assignment {}", maker_id, assignment.code);
                Ok(assignment)
            }
            None => {
                let err = self.refusal(id, |a| a.check_claim(maker_id)).await;
                tracing::warn!("Claim of {} by maker {} refused: {}", id, maker_id, err);
                Err(err)
            }
        }
    }

    /// Owner completion with AI-detection evidence. Credits the commission
    /// exactly once.
    pub async fn complete(
        &self,
        id: Uuid,
        maker_id: Uuid,
        screenshot: Option<UploadedFile>,
    ) -> Result<Completion> {
        // Refuse early so a doomed request leaves no stored file behind.
        let current = self.get(id).await?;
        current.check_complete(maker_id).map_err(guard_error)?;

        let screenshot = screenshot.ok_or_else(|| guard_error(GuardViolation::MissingEvidence))?;
        let uri = self
            .files
            .store(UploadKind::AiDetectionScreenshot, &screenshot.filename, &screenshot.data)
            .await?;

        let outcome = self.assignments.complete(id, maker_id, &uri).await;
        match outcome {
            Ok(Some(completion)) => {
                tracing::info!(
                    "Assignment {} completed by maker {}; credited {}",
                    completion.assignment.code,
                    maker_id,
                    completion.commission
                );
                Ok(completion)
            }
            Ok(None) => {
                self.remove_uploads(std::slice::from_ref(&uri)).await;
                let err = self.refusal(id, |a| a.check_complete(maker_id)).await;
                tracing::warn!("Completion of {} by maker {} refused: {}", id, maker_id, err);
                Err(err)
            }
            Err(e) => {
                tracing::error!("Completion of {} rolled back: {}", id, e);
                self.remove_uploads(std::slice::from_ref(&uri)).await;
                Err(e)
            }
        }
    }

    pub async fn approve(&self, id: Uuid) -> Result<Assignment> {
        match self.assignments.approve(id).await? {
            Some(assignment) => {
                tracing::info!(
                    "Assignment {} approved (status {})",
                    assignment.code,
                    assignment.status
                );
                Ok(assignment)
            }
            None => Err(self.refusal(id, |a| a.check_approve().map(|_| ())).await),
        }
    }

    /// Pre-empts any in-flight work. Rejecting twice is a no-op.
    pub async fn reject(&self, id: Uuid) -> Result<Assignment> {
        match self.assignments.reject(id).await? {
            Some(assignment) => {
                tracing::info!("Assignment {} rejected", assignment.code);
                Ok(assignment)
            }
            None => Err(self.refusal(id, |a| a.check_reject()).await),
        }
    }

    /// Hands a pre-terminal assignment to another eligible maker of its department.
    pub async fn reassign(&self, id: Uuid, maker_id: Uuid) -> Result<Assignment> {
        let current = self.get(id).await?;
        current.check_reassign().map_err(guard_error)?;

        let maker = self
            .makers
            .find_by_id(maker_id)
            .await?
            .ok_or_else(|| AppError::Validation("Maker does not exist".to_string()))?;
        if !maker.is_eligible() || maker.department_id != current.department_id {
            return Err(AppError::Validation(
                "Maker is not approved for this department".to_string(),
            ));
        }

        match self.assignments.reassign(id, maker_id).await? {
            Some(assignment) => {
                tracing::info!("Assignment {} reassigned to maker {}", assignment.code, maker_id);
                Ok(assignment)
            }
            None => Err(self.refusal(id, |a| a.check_reassign()).await),
        }
    }

    pub async fn set_status(&self, id: Uuid, status: AssignmentStatus) -> Result<Assignment> {
        if status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "Status cannot be set to {}; use approve, reject or complete",
                status
            )));
        }

        match self.assignments.set_status(id, status).await? {
            Some(assignment) => {
                tracing::info!("Assignment {} moved to {}", assignment.code, status);
                Ok(assignment)
            }
            None => Err(self.refusal(id, |a| a.check_set_status(status)).await),
        }
    }

    pub async fn mark_delivered(&self, id: Uuid) -> Result<Assignment> {
        match self.assignments.mark_delivered(id).await? {
            Some(assignment) => {
                tracing::info!("Assignment {} delivered", assignment.code);
                Ok(assignment)
            }
            None => Err(self.refusal(id, |a| a.check_mark_delivered()).await),
        }
    }
}
