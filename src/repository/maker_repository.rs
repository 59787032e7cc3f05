use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Maker, MakerApprovalUpdate, PaymentStatus, PaymentType},
    error::{is_unique_violation, AppError, Result},
    repository::{parse_id, to_utc, GuardedDelete, MakerRepository, NewMaker},
};

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct MakerRow {
    id: String,
    email: String,
    name: String,
    phone: String,
    telegram_username: Option<String>,
    whatsapp_number: Option<String>,
    department_id: String,
    is_approved: i32,
    payment_approved: i32,
    payment_screenshot: Option<String>,
    balance: i64,
    total_earnings: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const MAKER_COLUMNS: &str = r#"
    id, email, name, phone, telegram_username, whatsapp_number, department_id,
    is_approved, payment_approved, payment_screenshot, balance, total_earnings,
    created_at, updated_at
"#;

pub struct SqliteMakerRepository {
    pool: SqlitePool,
}

impl SqliteMakerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_maker(row: MakerRow) -> Result<Maker> {
        Ok(Maker {
            id: parse_id(&row.id)?,
            email: row.email,
            name: row.name,
            phone: row.phone,
            telegram_username: row.telegram_username,
            whatsapp_number: row.whatsapp_number,
            department_id: parse_id(&row.department_id)?,
            is_approved: row.is_approved != 0,
            payment_approved: row.payment_approved != 0,
            payment_screenshot: row.payment_screenshot,
            balance: row.balance,
            total_earnings: row.total_earnings,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }
}

#[async_trait]
impl MakerRepository for SqliteMakerRepository {
    async fn create(&self, maker: NewMaker) -> Result<Maker> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();
        let request = &maker.request;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO makers (
                id, email, password_hash, name, phone, telegram_username,
                whatsapp_number, department_id, is_approved, payment_approved,
                payment_screenshot, balance, total_earnings, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, 0, 0, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(request.email.trim().to_lowercase())
        .bind(&maker.password_hash)
        .bind(request.name.trim())
        .bind(request.phone.trim())
        .bind(&request.telegram_username)
        .bind(&request.whatsapp_number)
        .bind(request.department_id.to_string())
        .bind(&maker.payment_screenshot)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User with this email already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        if let Some(fee) = maker.registration_fee {
            sqlx::query(
                r#"
                INSERT INTO payments (id, amount, payment_type, status, assignment_id, user_id, created_at, updated_at)
                VALUES (?, ?, ?, ?, NULL, ?, ?, ?)
                "#
            )
            .bind(Uuid::new_v4().to_string())
            .bind(fee)
            .bind(PaymentType::RegistrationFee.as_str())
            .bind(PaymentStatus::Pending.as_str())
            .bind(&id_str)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created maker".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Maker>> {
        let row = sqlx::query_as::<_, MakerRow>(&format!(
            "SELECT {} FROM makers WHERE id = ?",
            MAKER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_maker).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Maker>> {
        let row = sqlx::query_as::<_, MakerRow>(&format!(
            "SELECT {} FROM makers WHERE email = ?",
            MAKER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_maker).transpose()
    }

    async fn password_hash(&self, email: &str) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM makers WHERE email = ?"
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Maker>> {
        let rows = sqlx::query_as::<_, MakerRow>(&format!(
            "SELECT {} FROM makers ORDER BY created_at DESC LIMIT ? OFFSET ?",
            MAKER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_maker)
            .collect()
    }

    async fn list_eligible(&self, department_id: Uuid) -> Result<Vec<Maker>> {
        let rows = sqlx::query_as::<_, MakerRow>(&format!(
            r#"
            SELECT {} FROM makers
            WHERE department_id = ? AND is_approved = 1 AND payment_approved = 1
            ORDER BY name ASC
            "#,
            MAKER_COLUMNS
        ))
        .bind(department_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_maker)
            .collect()
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM makers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_approved(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM makers WHERE is_approved = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_approval(
        &self,
        id: Uuid,
        update: MakerApprovalUpdate,
        registration_fee: i64,
    ) -> Result<Maker> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE makers
            SET is_approved = COALESCE(?, is_approved),
                payment_approved = COALESCE(?, payment_approved),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(update.is_approved.map(i32::from))
        .bind(update.payment_approved.map(i32::from))
        .bind(now)
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Maker not found".to_string()));
        }

        // Keep the registration-fee ledger in step with the payment decision.
        match update.payment_approved {
            Some(true) => {
                let settled = sqlx::query(
                    r#"
                    UPDATE payments SET status = ?, updated_at = ?
                    WHERE user_id = ? AND payment_type = ? AND status = ?
                    "#
                )
                .bind(PaymentStatus::Completed.as_str())
                .bind(now)
                .bind(&id_str)
                .bind(PaymentType::RegistrationFee.as_str())
                .bind(PaymentStatus::Pending.as_str())
                .execute(&mut *tx)
                .await?;

                let already_paid: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM payments WHERE user_id = ? AND payment_type = ? AND status = ?"
                )
                .bind(&id_str)
                .bind(PaymentType::RegistrationFee.as_str())
                .bind(PaymentStatus::Completed.as_str())
                .fetch_one(&mut *tx)
                .await?;

                if settled.rows_affected() == 0 && already_paid == 0 {
                    sqlx::query(
                        r#"
                        INSERT INTO payments (id, amount, payment_type, status, assignment_id, user_id, created_at, updated_at)
                        VALUES (?, ?, ?, ?, NULL, ?, ?, ?)
                        "#
                    )
                    .bind(Uuid::new_v4().to_string())
                    .bind(registration_fee)
                    .bind(PaymentType::RegistrationFee.as_str())
                    .bind(PaymentStatus::Completed.as_str())
                    .bind(&id_str)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }
            Some(false) => {
                sqlx::query(
                    r#"
                    UPDATE payments SET status = ?, updated_at = ?
                    WHERE user_id = ? AND payment_type = ? AND status = ?
                    "#
                )
                .bind(PaymentStatus::Failed.as_str())
                .bind(now)
                .bind(&id_str)
                .bind(PaymentType::RegistrationFee.as_str())
                .bind(PaymentStatus::Pending.as_str())
                .execute(&mut *tx)
                .await?;
            }
            None => {}
        }

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated maker".to_string())
        })
    }

    async fn delete_unreferenced(&self, id: Uuid) -> Result<GuardedDelete> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE makers SET updated_at = updated_at WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Ok(GuardedDelete::NotFound);
        }

        let assignments: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE assigned_to_id = ?")
                .bind(&id_str)
                .fetch_one(&mut *tx)
                .await?;
        // Payment rows are ledger history and are never deleted.
        let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = ?")
            .bind(&id_str)
            .fetch_one(&mut *tx)
            .await?;
        if assignments > 0 || payments > 0 {
            tx.rollback().await?;
            return Ok(GuardedDelete::Referenced {
                makers: 0,
                assignments,
                payments,
            });
        }

        // Fan-out rows cascade and reports keep the row with the reference cleared.
        sqlx::query("DELETE FROM sessions WHERE principal_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM makers WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(GuardedDelete::Deleted)
    }
}
