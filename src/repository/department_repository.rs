use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateDepartmentRequest, Department, UpdateDepartmentRequest},
    error::{is_unique_violation, AppError, Result},
    repository::{parse_id, to_utc, DepartmentRepository, GuardedDelete},
};

#[derive(FromRow)]
struct DepartmentRow {
    id: String,
    name: String,
    description: Option<String>,
    service_fee: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteDepartmentRepository {
    pool: SqlitePool,
}

impl SqliteDepartmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_department(row: DepartmentRow) -> Result<Department> {
        Ok(Department {
            id: parse_id(&row.id)?,
            name: row.name,
            description: row.description,
            service_fee: row.service_fee,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    fn map_write_error(err: sqlx::Error) -> AppError {
        if is_unique_violation(&err) {
            AppError::Conflict("A department with this name already exists".to_string())
        } else {
            AppError::from(err)
        }
    }
}

#[async_trait]
impl DepartmentRepository for SqliteDepartmentRepository {
    async fn create(&self, request: CreateDepartmentRequest) -> Result<Department> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO departments (id, name, description, service_fee, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.service_fee)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created department".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT id, name, description, service_fee, created_at, updated_at
            FROM departments
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_department).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT id, name, description, service_fee, created_at, updated_at
            FROM departments
            WHERE name = ?
            "#
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_department).transpose()
    }

    async fn list(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT id, name, description, service_fee, created_at, updated_at
            FROM departments
            ORDER BY name ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_department)
            .collect()
    }

    async fn update(&self, id: Uuid, request: UpdateDepartmentRequest) -> Result<Department> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE departments
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                service_fee = COALESCE(?, service_fee),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(request.name.as_deref().map(str::trim))
        .bind(&request.description)
        .bind(request.service_fee)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Department not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated department".to_string())
        })
    }

    async fn delete_unreferenced(&self, id: Uuid) -> Result<GuardedDelete> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        // Take the write lock first so no maker or assignment can be added
        // between the reference count and the delete.
        let touched = sqlx::query("UPDATE departments SET updated_at = updated_at WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Ok(GuardedDelete::NotFound);
        }

        let makers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM makers WHERE department_id = ?")
            .bind(&id_str)
            .fetch_one(&mut *tx)
            .await?;
        let assignments: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE department_id = ?")
                .bind(&id_str)
                .fetch_one(&mut *tx)
                .await?;

        if makers > 0 || assignments > 0 {
            tx.rollback().await?;
            return Ok(GuardedDelete::Referenced {
                makers,
                assignments,
                payments: 0,
            });
        }

        sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(GuardedDelete::Deleted)
    }
}
