use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::ReportRepository,
};

pub struct ReportService {
    repo: Arc<dyn ReportRepository>,
    strict_transitions: bool,
}

impl ReportService {
    pub fn new(repo: Arc<dyn ReportRepository>, strict_transitions: bool) -> Self {
        Self { repo, strict_transitions }
    }

    pub async fn create(&self, request: CreateReportRequest) -> Result<Report> {
        request.validate()?;
        let report = self.repo.create(request).await?;
        tracing::info!("Report {} filed", report.id);
        Ok(report)
    }

    pub async fn list(&self) -> Result<Vec<Report>> {
        self.repo.list().await
    }

    /// Any status change is accepted unless strict transitions are configured.
    pub async fn update_status(&self, id: Uuid, request: UpdateReportRequest) -> Result<Report> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

        if self.strict_transitions && !current.status.can_transition_to(request.status) {
            return Err(AppError::Conflict(format!(
                "Report cannot move from {} to {}",
                current.status, request.status
            )));
        }

        let report = self.repo.update_status(id, request).await?;
        tracing::info!("Report {} is now {}", report.id, report.status);
        Ok(report)
    }
}
