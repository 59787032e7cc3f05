use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateReportRequest, Report, ReportStatus, UpdateReportRequest},
    error::{AppError, Result},
    repository::{parse_id, parse_opt_id, to_utc, ReportRepository},
};

#[derive(FromRow)]
struct ReportRow {
    id: String,
    title: String,
    description: String,
    assignment_id: Option<String>,
    reported_user_id: Option<String>,
    reporter_name: String,
    reporter_email: Option<String>,
    reporter_phone: Option<String>,
    status: String,
    admin_response: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const REPORT_COLUMNS: &str = r#"
    id, title, description, assignment_id, reported_user_id, reporter_name,
    reporter_email, reporter_phone, status, admin_response, created_at, updated_at
"#;

pub struct SqliteReportRepository {
    pool: SqlitePool,
}

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_report(row: ReportRow) -> Result<Report> {
        Ok(Report {
            id: parse_id(&row.id)?,
            title: row.title,
            description: row.description,
            assignment_id: parse_opt_id(row.assignment_id)?,
            reported_user_id: parse_opt_id(row.reported_user_id)?,
            reporter_name: row.reporter_name,
            reporter_email: row.reporter_email,
            reporter_phone: row.reporter_phone,
            status: ReportStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid report status: {}", row.status))
            })?,
            admin_response: row.admin_response,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn create(&self, request: CreateReportRequest) -> Result<Report> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO reports (
                id, title, description, assignment_id, reported_user_id, reporter_name,
                reporter_email, reporter_phone, status, admin_response, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(request.assignment_id.map(|a| a.to_string()))
        .bind(request.reported_user_id.map(|u| u.to_string()))
        .bind(request.reporter_name.trim())
        .bind(&request.reporter_email)
        .bind(&request.reporter_phone)
        .bind(ReportStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created report".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {} FROM reports WHERE id = ?",
            REPORT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_report).transpose()
    }

    async fn list(&self) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {} FROM reports ORDER BY created_at DESC",
            REPORT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_report)
            .collect()
    }

    async fn update_status(&self, id: Uuid, request: UpdateReportRequest) -> Result<Report> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE reports
            SET status = ?, admin_response = COALESCE(?, admin_response), updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(request.status.as_str())
        .bind(&request.admin_response)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Report not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated report".to_string())
        })
    }
}
