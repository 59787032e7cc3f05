use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{LedgerDiscrepancy, Payment, PaymentStatus, PaymentType},
    error::{AppError, Result},
    repository::{parse_id, parse_opt_id, to_utc, PaymentRepository},
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    amount: i64,
    payment_type: String,
    status: String,
    assignment_id: Option<String>,
    user_id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct DiscrepancyRow {
    maker_id: String,
    maker_name: String,
    total_earnings: i64,
    commission_sum: i64,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: parse_id(&row.id)?,
            amount: row.amount,
            payment_type: PaymentType::from_str(&row.payment_type).ok_or_else(|| {
                AppError::Database(format!("Invalid payment type: {}", row.payment_type))
            })?,
            status: PaymentStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid payment status: {}", row.status))
            })?,
            assignment_id: parse_opt_id(row.assignment_id)?,
            user_id: parse_id(&row.user_id)?,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, amount, payment_type, status, assignment_id, user_id, created_at, updated_at
            FROM payments
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn find_commission(&self, assignment_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, amount, payment_type, status, assignment_id, user_id, created_at, updated_at
            FROM payments
            WHERE assignment_id = ? AND payment_type = 'COMMISSION'
            "#
        )
        .bind(assignment_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn sum_completed(&self, payment_type: PaymentType) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM payments
            WHERE payment_type = ? AND status = 'COMPLETED'
            "#
        )
        .bind(payment_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn count_by_status(&self, status: PaymentStatus) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn ledger_discrepancies(&self) -> Result<Vec<LedgerDiscrepancy>> {
        let rows = sqlx::query_as::<_, DiscrepancyRow>(
            r#"
            SELECT maker_id, maker_name, total_earnings, commission_sum FROM (
                SELECT m.id AS maker_id,
                       m.name AS maker_name,
                       m.total_earnings AS total_earnings,
                       COALESCE((
                           SELECT SUM(p.amount) FROM payments p
                           WHERE p.user_id = m.id
                             AND p.payment_type = 'COMMISSION'
                             AND p.status = 'COMPLETED'
                       ), 0) AS commission_sum
                FROM makers m
            )
            WHERE total_earnings <> commission_sum
            ORDER BY maker_name ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(LedgerDiscrepancy {
                    maker_id: parse_id(&row.maker_id)?,
                    maker_name: row.maker_name,
                    total_earnings: row.total_earnings,
                    commission_sum: row.commission_sum,
                })
            })
            .collect()
    }
}
