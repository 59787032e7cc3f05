use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, Result},
    repository::{GuardedDelete, MakerRepository},
};

pub struct MakerService {
    repo: Arc<dyn MakerRepository>,
    auth: Arc<AuthService>,
    registration_fee: i64,
}

impl MakerService {
    pub fn new(repo: Arc<dyn MakerRepository>, auth: Arc<AuthService>, registration_fee: i64) -> Self {
        Self { repo, auth, registration_fee }
    }

    pub async fn get(&self, id: Uuid) -> Result<Maker> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Maker not found".to_string()))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Maker>> {
        self.repo.list(limit, offset).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    /// Approved and paid makers of one department, for seekers picking a maker.
    pub async fn list_eligible(&self, department_id: Uuid) -> Result<Vec<Maker>> {
        self.repo.list_eligible(department_id).await
    }

    pub async fn update_approval(&self, id: Uuid, update: MakerApprovalUpdate) -> Result<Maker> {
        if update.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let revoked = update.is_approved == Some(false) || update.payment_approved == Some(false);
        let maker = self.repo.update_approval(id, update, self.registration_fee).await?;

        if revoked {
            let ended = self.auth.invalidate_principal(maker.id).await?;
            if ended > 0 {
                tracing::info!("Ended {} sessions of maker {}", ended, maker.id);
            }
        }

        tracing::info!(
            "Maker {} approval updated: approved={}, payment_approved={}",
            maker.id,
            maker.is_approved,
            maker.payment_approved
        );
        Ok(maker)
    }

    /// Refused while any assignment is assigned to the maker or any payment
    /// row names them.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        match self.repo.delete_unreferenced(id).await? {
            GuardedDelete::Deleted => {
                tracing::info!("Deleted maker {}", id);
                Ok(())
            }
            GuardedDelete::NotFound => Err(AppError::NotFound("Maker not found".to_string())),
            GuardedDelete::Referenced {
                assignments,
                payments,
                ..
            } => {
                tracing::warn!(
                    "Refused to delete maker {}: {} assignments, {} payments",
                    id,
                    assignments,
                    payments
                );
                Err(AppError::Conflict(format!(
                    "Cannot delete maker: {} assignments are assigned to them and {} payments are on record",
                    assignments, payments
                )))
            }
        }
    }
}
