use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{DepartmentRepository, GuardedDelete},
};

pub struct DepartmentService {
    repo: Arc<dyn DepartmentRepository>,
}

impl DepartmentService {
    pub fn new(repo: Arc<dyn DepartmentRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Department>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Department> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".to_string()))
    }

    pub async fn create(&self, request: CreateDepartmentRequest) -> Result<Department> {
        request.validate()?;

        let department = self.repo.create(request).await?;
        tracing::info!(
            "Created department {} ({}) with fee {}",
            department.name,
            department.id,
            department.service_fee
        );
        Ok(department)
    }

    pub async fn update(&self, id: Uuid, request: UpdateDepartmentRequest) -> Result<Department> {
        request.validate()?;

        if request.name.is_none() && request.description.is_none() && request.service_fee.is_none() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let department = self.repo.update(id, request).await?;
        tracing::info!("Updated department {}", department.id);
        Ok(department)
    }

    /// Refused while any maker or assignment still references the department.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        match self.repo.delete_unreferenced(id).await? {
            GuardedDelete::Deleted => {
                tracing::info!("Deleted department {}", id);
                Ok(())
            }
            GuardedDelete::NotFound => Err(AppError::NotFound("Department not found".to_string())),
            GuardedDelete::Referenced {
                makers,
                assignments,
                ..
            } => {
                tracing::warn!(
                    "Refused to delete department {}: {} makers, {} assignments",
                    id,
                    makers,
                    assignments
                );
                Err(AppError::Conflict(format!(
                    "Cannot delete department: it has {} makers and {} assignments",
                    makers, assignments
                )))
            }
        }
    }
}
