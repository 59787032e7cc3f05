#![allow(dead_code)]

use std::sync::Arc;

use assignmentpro::{
    config::Settings,
    domain::{
        Assignment, CreateAdminRequest, CreateDepartmentRequest, CreateMakerRequest, Department,
        Maker, MakerApprovalUpdate, SubmitAssignmentRequest,
    },
    service::ServiceContext,
    storage::{LocalFileStore, UploadedFile},
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

/// One connection so every query sees the same in-memory database.
pub async fn pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.uploads.dir = std::env::temp_dir()
        .join(format!("assignmentpro-test-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    settings
}

pub async fn context_with(settings: &Settings) -> anyhow::Result<Arc<ServiceContext>> {
    let pool = pool().await?;
    let file_store = Arc::new(LocalFileStore::new(&settings.uploads));
    Ok(Arc::new(ServiceContext::new(pool, file_store, settings)))
}

pub async fn context() -> anyhow::Result<Arc<ServiceContext>> {
    context_with(&settings()).await
}

pub fn png(name: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        data: b"\x89PNG\r\n\x1a\nfake".to_vec(),
    }
}

pub async fn department(ctx: &ServiceContext, name: &str, fee: i64) -> anyhow::Result<Department> {
    Ok(ctx
        .department_service
        .create(CreateDepartmentRequest {
            name: name.to_string(),
            description: None,
            service_fee: fee,
        })
        .await?)
}

pub fn maker_request(email: &str, department_id: Uuid) -> CreateMakerRequest {
    CreateMakerRequest {
        email: email.to_string(),
        password: "maker123".to_string(),
        name: "Test Maker".to_string(),
        phone: "+251911234567".to_string(),
        telegram_username: Some("testmaker".to_string()),
        whatsapp_number: None,
        department_id,
    }
}

/// A maker who has been approved and whose registration payment is verified.
pub async fn eligible_maker(
    ctx: &ServiceContext,
    email: &str,
    department_id: Uuid,
) -> anyhow::Result<Maker> {
    let maker = ctx
        .identity_service
        .register_maker(maker_request(email, department_id), Some(png("receipt.png")))
        .await?;

    Ok(ctx
        .maker_service
        .update_approval(
            maker.id,
            MakerApprovalUpdate {
                is_approved: Some(true),
                payment_approved: Some(true),
            },
        )
        .await?)
}

pub async fn admin(ctx: &ServiceContext, email: &str) -> anyhow::Result<()> {
    ctx.identity_service
        .create_admin(CreateAdminRequest {
            email: email.to_string(),
            password: "admin123".to_string(),
            name: Some("Admin".to_string()),
        })
        .await?;
    Ok(())
}

pub fn submission(department_id: Uuid) -> SubmitAssignmentRequest {
    SubmitAssignmentRequest {
        title: "Binary search trees".to_string(),
        description: "Implement insertion and deletion for a BST with tests".to_string(),
        comments: None,
        submitter_name: "Seeker".to_string(),
        submitter_phone: "+251922000000".to_string(),
        submitter_email: Some("seeker@example.com".to_string()),
        submitter_telegram: Some("seeker_tg".to_string()),
        submitter_whatsapp: None,
        department_id,
        assigned_to_id: None,
    }
}

/// A submitted assignment the admin has already approved.
pub async fn approved_assignment(ctx: &ServiceContext, department_id: Uuid) -> anyhow::Result<Assignment> {
    let assignment = ctx
        .assignment_service
        .submit(submission(department_id), Vec::new())
        .await?;
    Ok(ctx.assignment_service.approve(assignment.id).await?)
}
