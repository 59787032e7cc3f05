use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        commission_for, Assignment, AssignmentStatus, NewAssignment, Payment, PaymentStatus,
        PaymentType,
    },
    error::{is_unique_violation, AppError, Result},
    repository::{
        parse_id, parse_opt_id, to_utc, AssignmentFilter, AssignmentRepository, Completion,
    },
};

#[derive(FromRow)]
struct AssignmentRow {
    id: String,
    code: String,
    title: String,
    description: String,
    comments: Option<String>,
    files: String,
    submitter_name: String,
    submitter_phone: String,
    submitter_email: Option<String>,
    submitter_telegram: Option<String>,
    submitter_whatsapp: Option<String>,
    department_id: String,
    assigned_to_id: Option<String>,
    status: String,
    is_approved_by_admin: i32,
    solution_delivered: i32,
    ai_detection_screenshot: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const ASSIGNMENT_COLUMNS: &str = r#"
    id, code, title, description, comments, files, submitter_name, submitter_phone,
    submitter_email, submitter_telegram, submitter_whatsapp, department_id,
    assigned_to_id, status, is_approved_by_admin, solution_delivered,
    ai_detection_screenshot, created_at, updated_at
"#;

pub struct SqliteAssignmentRepository {
    pool: SqlitePool,
}

impl SqliteAssignmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_assignment(row: AssignmentRow) -> Result<Assignment> {
        let files: Vec<String> = serde_json::from_str(&row.files)
            .map_err(|e| AppError::Database(format!("Invalid assignment files: {}", e)))?;

        Ok(Assignment {
            id: parse_id(&row.id)?,
            code: row.code,
            title: row.title,
            description: row.description,
            comments: row.comments,
            files,
            submitter_name: row.submitter_name,
            submitter_phone: row.submitter_phone,
            submitter_email: row.submitter_email,
            submitter_telegram: row.submitter_telegram,
            submitter_whatsapp: row.submitter_whatsapp,
            department_id: parse_id(&row.department_id)?,
            assigned_to_id: parse_opt_id(row.assigned_to_id)?,
            status: AssignmentStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid assignment status: {}", row.status))
            })?,
            is_approved_by_admin: row.is_approved_by_admin != 0,
            solution_delivered: row.solution_delivered != 0,
            ai_detection_screenshot: row.ai_detection_screenshot,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    async fn reload_if(&self, id: Uuid, rows_affected: u64) -> Result<Option<Assignment>> {
        if rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

#[async_trait]
impl AssignmentRepository for SqliteAssignmentRepository {
    async fn create(&self, assignment: NewAssignment) -> Result<Assignment> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let request = &assignment.request;
        let files = serde_json::to_string(&assignment.files)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO assignments (
                id, code, title, description, comments, files, submitter_name,
                submitter_phone, submitter_email, submitter_telegram, submitter_whatsapp,
                department_id, assigned_to_id, status, is_approved_by_admin,
                solution_delivered, ai_detection_screenshot, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, NULL, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&assignment.code)
        .bind(request.title.trim())
        .bind(request.description.trim())
        .bind(&request.comments)
        .bind(files)
        .bind(request.submitter_name.trim())
        .bind(request.submitter_phone.trim())
        .bind(&request.submitter_email)
        .bind(&request.submitter_telegram)
        .bind(&request.submitter_whatsapp)
        .bind(request.department_id.to_string())
        .bind(request.assigned_to_id.map(|m| m.to_string()))
        .bind(AssignmentStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Assignment code {} already in use", assignment.code))
            } else {
                AppError::from(e)
            }
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created assignment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments WHERE id = ?",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_assignment).transpose()
    }

    async fn list(&self, filter: AssignmentFilter) -> Result<Vec<Assignment>> {
        let assigned_to = filter.assigned_to_id.map(|id| id.to_string());
        let department = filter.department_id.map(|id| id.to_string());
        let status = filter.status.map(|s| s.as_str());

        // A negative LIMIT means "no limit" in SQLite.
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            SELECT {} FROM assignments
            WHERE (? IS NULL OR assigned_to_id = ?)
              AND (? IS NULL OR department_id = ?)
              AND (? IS NULL OR status = ?)
            ORDER BY created_at DESC
            LIMIT ?
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assigned_to.clone())
        .bind(assigned_to)
        .bind(department.clone())
        .bind(department)
        .bind(status)
        .bind(status)
        .bind(filter.limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_assignment)
            .collect()
    }

    async fn list_claimable(&self, department_id: Uuid, maker_id: Uuid) -> Result<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            SELECT {} FROM assignments
            WHERE department_id = ?
              AND is_approved_by_admin = 1
              AND status IN ('PENDING', 'IN_PROGRESS')
              AND (assigned_to_id IS NULL OR assigned_to_id = ?)
            ORDER BY created_at DESC
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(department_id.to_string())
        .bind(maker_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_assignment)
            .collect()
    }

    async fn count(&self, status: Option<AssignmentStatus>) -> Result<i64> {
        let status = status.map(|s| s.as_str());
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM assignments WHERE (? IS NULL OR status = ?)"
        )
        .bind(status)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_open_for_maker(&self, maker_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM assignments
            WHERE assigned_to_id = ? AND status IN ('PENDING', 'IN_PROGRESS')
            "#
        )
        .bind(maker_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn claim(&self, id: Uuid, maker_id: Uuid) -> Result<Option<Assignment>> {
        let maker_id_str = maker_id.to_string();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET assigned_to_id = ?, status = 'IN_PROGRESS', updated_at = ?
            WHERE id = ?
              AND is_approved_by_admin = 1
              AND status IN ('PENDING', 'IN_PROGRESS')
              AND (assigned_to_id IS NULL OR assigned_to_id = ?)
            "#
        )
        .bind(&maker_id_str)
        .bind(now)
        .bind(id.to_string())
        .bind(&maker_id_str)
        .execute(&self.pool)
        .await?;

        self.reload_if(id, result.rows_affected()).await
    }

    async fn complete(&self, id: Uuid, maker_id: Uuid, screenshot: &str) -> Result<Option<Completion>> {
        let id_str = id.to_string();
        let maker_id_str = maker_id.to_string();
        let now = Utc::now();
        let now_naive = now.naive_utc();

        let mut tx = self.pool.begin().await?;

        // The status check and the flip are one statement: a second caller
        // racing this one matches zero rows and credits nothing.
        let flipped = sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'COMPLETED', ai_detection_screenshot = ?, updated_at = ?
            WHERE id = ?
              AND assigned_to_id = ?
              AND status = 'IN_PROGRESS'
              AND is_approved_by_admin = 1
            "#
        )
        .bind(screenshot)
        .bind(now_naive)
        .bind(&id_str)
        .bind(&maker_id_str)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let service_fee: i64 = sqlx::query_scalar(
            r#"
            SELECT d.service_fee
            FROM assignments a
            JOIN departments d ON d.id = a.department_id
            WHERE a.id = ?
            "#
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?;
        let Some(commission) = commission_for(service_fee) else {
            return Err(AppError::Internal(format!(
                "Commission for service fee {} is out of range",
                service_fee
            )));
        };

        let credited = sqlx::query(
            r#"
            UPDATE makers
            SET balance = balance + ?, total_earnings = total_earnings + ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(commission)
        .bind(commission)
        .bind(now_naive)
        .bind(&maker_id_str)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() != 1 {
            // Dropping the transaction rolls the status flip back.
            return Err(AppError::Database(format!(
                "Ledger credit for maker {} affected {} rows",
                maker_id,
                credited.rows_affected()
            )));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            amount: commission,
            payment_type: PaymentType::Commission,
            status: PaymentStatus::Completed,
            assignment_id: Some(id),
            user_id: maker_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, amount, payment_type, status, assignment_id, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(payment.id.to_string())
        .bind(payment.amount)
        .bind(payment.payment_type.as_str())
        .bind(payment.status.as_str())
        .bind(&id_str)
        .bind(&maker_id_str)
        .bind(now_naive)
        .bind(now_naive)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let assignment = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve completed assignment".to_string())
        })?;

        Ok(Some(Completion {
            assignment,
            payment,
            commission,
        }))
    }

    async fn approve(&self, id: Uuid) -> Result<Option<Assignment>> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET is_approved_by_admin = 1,
                status = CASE WHEN status IN ('PENDING', 'IN_PROGRESS') THEN 'IN_PROGRESS' ELSE status END,
                updated_at = ?
            WHERE id = ? AND status <> 'REJECTED'
            "#
        )
        .bind(now)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        // Finalizing a completed item: settle its commission row. Safe to repeat.
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'COMPLETED', updated_at = ?
            WHERE assignment_id = ?
              AND payment_type = 'COMMISSION'
              AND status = 'PENDING'
              AND EXISTS (
                  SELECT 1 FROM assignments
                  WHERE id = ? AND status = 'COMPLETED' AND ai_detection_screenshot IS NOT NULL
              )
            "#
        )
        .bind(now)
        .bind(&id_str)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(id).await
    }

    async fn reject(&self, id: Uuid) -> Result<Option<Assignment>> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET is_approved_by_admin = 0, status = 'REJECTED', updated_at = ?
            WHERE id = ? AND status <> 'COMPLETED'
            "#
        )
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.reload_if(id, result.rows_affected()).await
    }

    async fn reassign(&self, id: Uuid, maker_id: Uuid) -> Result<Option<Assignment>> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET assigned_to_id = ?, updated_at = ?
            WHERE id = ? AND status IN ('PENDING', 'IN_PROGRESS')
            "#
        )
        .bind(maker_id.to_string())
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.reload_if(id, result.rows_affected()).await
    }

    async fn set_status(&self, id: Uuid, status: AssignmentStatus) -> Result<Option<Assignment>> {
        if status.is_terminal() {
            return Ok(None);
        }

        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET status = ?, updated_at = ?
            WHERE id = ? AND status IN ('PENDING', 'IN_PROGRESS')
            "#
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.reload_if(id, result.rows_affected()).await
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<Option<Assignment>> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET solution_delivered = 1, updated_at = ?
            WHERE id = ? AND status = 'COMPLETED'
            "#
        )
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.reload_if(id, result.rows_affected()).await
    }
}
