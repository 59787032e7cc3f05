use std::sync::Arc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{AssignmentFilter, AssignmentRepository, MakerRepository, PaymentRepository},
};

const RECENT_LIMIT: i64 = 5;

/// Platform aggregate shown to admins. Recomputed on every read.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub total_users: i64,
    pub total_assignments: i64,
    pub completed_assignments: i64,
    pub total_revenue: i64,
    pub pending_payments: i64,
    pub recent_assignments: Vec<Assignment>,
}

/// A maker's own earnings view.
#[derive(Debug, Clone, Serialize)]
pub struct MakerBalance {
    pub balance: i64,
    pub total_earnings: i64,
    pub completed_assignments: i64,
    pub pending_assignments: i64,
    pub recent_assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerAudit {
    pub makers_checked: i64,
    pub discrepancies: Vec<LedgerDiscrepancy>,
}

pub struct LedgerService {
    makers: Arc<dyn MakerRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl LedgerService {
    pub fn new(
        makers: Arc<dyn MakerRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self { makers, assignments, payments }
    }

    pub async fn admin_overview(&self) -> Result<AdminOverview> {
        Ok(AdminOverview {
            total_users: self.makers.count_approved().await?,
            total_assignments: self.assignments.count(None).await?,
            completed_assignments: self.assignments.count(Some(AssignmentStatus::Completed)).await?,
            total_revenue: self.payments.sum_completed(PaymentType::RegistrationFee).await?,
            pending_payments: self.payments.count_by_status(PaymentStatus::Pending).await?,
            recent_assignments: self
                .assignments
                .list(AssignmentFilter {
                    limit: Some(RECENT_LIMIT),
                    ..Default::default()
                })
                .await?,
        })
    }

    pub async fn maker_balance(&self, maker_id: Uuid) -> Result<MakerBalance> {
        let maker = self
            .makers
            .find_by_id(maker_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let completed = self
            .assignments
            .list(AssignmentFilter {
                assigned_to_id: Some(maker_id),
                status: Some(AssignmentStatus::Completed),
                ..Default::default()
            })
            .await?;

        Ok(MakerBalance {
            balance: maker.balance,
            total_earnings: maker.total_earnings,
            completed_assignments: completed.len() as i64,
            pending_assignments: self.assignments.count_open_for_maker(maker_id).await?,
            recent_assignments: completed.into_iter().take(RECENT_LIMIT as usize).collect(),
        })
    }

    /// A maker's payment history, newest first.
    pub async fn payments_for(&self, maker_id: Uuid) -> Result<Vec<Payment>> {
        self.payments.find_by_user(maker_id).await
    }

    /// Compares each maker's earnings accumulator with their commission rows.
    pub async fn audit(&self) -> Result<LedgerAudit> {
        let discrepancies = self.payments.ledger_discrepancies().await?;
        if !discrepancies.is_empty() {
            tracing::warn!("Ledger audit found {} diverging makers", discrepancies.len());
        }

        Ok(LedgerAudit {
            makers_checked: self.makers.count().await?,
            discrepancies,
        })
    }
}
