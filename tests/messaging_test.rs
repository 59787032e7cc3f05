mod common;

use assignmentpro::{
    domain::{
        AnnouncementTarget, CreateAnnouncementRequest, CreateReportRequest, ReportStatus,
        UpdateReportRequest,
    },
    error::AppError,
};
use common::*;
use uuid::Uuid;

fn broadcast(title: &str) -> CreateAnnouncementRequest {
    CreateAnnouncementRequest {
        title: title.to_string(),
        content: "Exams week: expect more submissions".to_string(),
        target_type: AnnouncementTarget::All,
        target_user_id: None,
    }
}

fn report(title: &str) -> CreateReportRequest {
    CreateReportRequest {
        title: title.to_string(),
        description: "The solution was delivered late".to_string(),
        assignment_id: None,
        reported_user_id: None,
        reporter_name: "Seeker".to_string(),
        reporter_email: Some("seeker@example.com".to_string()),
        reporter_phone: None,
    }
}

#[tokio::test]
async fn test_broadcast_reaches_approved_makers() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let first = eligible_maker(&ctx, "first@example.com", cs.id).await?;
    let second = eligible_maker(&ctx, "second@example.com", cs.id).await?;
    let pending = ctx
        .identity_service
        .register_maker(maker_request("pending@example.com", cs.id), None)
        .await?;

    let published = ctx.announcement_service.publish(broadcast("Exams")).await?;
    assert_eq!(published.recipients, 2);

    assert_eq!(ctx.announcement_service.inbox(first.id).await?.len(), 1);
    assert_eq!(ctx.announcement_service.inbox(second.id).await?.len(), 1);
    assert!(ctx.announcement_service.inbox(pending.id).await?.is_empty());

    let summaries = ctx.announcement_service.list_all().await?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].recipients, 2);
    assert_eq!(summaries[0].read_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_direct_announcement_and_read_scoping() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let target = eligible_maker(&ctx, "target@example.com", cs.id).await?;
    let bystander = eligible_maker(&ctx, "bystander@example.com", cs.id).await?;

    let published = ctx
        .announcement_service
        .publish(CreateAnnouncementRequest {
            target_type: AnnouncementTarget::SpecificUser,
            target_user_id: Some(target.id),
            ..broadcast("Your payout")
        })
        .await?;
    assert_eq!(published.recipients, 1);
    let id = published.announcement.id;

    assert!(ctx.announcement_service.inbox(bystander.id).await?.is_empty());
    assert!(matches!(
        ctx.announcement_service.mark_read(bystander.id, id).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        ctx.announcement_service.mark_read(target.id, Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));

    ctx.announcement_service.mark_read(target.id, id).await?;
    let inbox = ctx.announcement_service.inbox(target.id).await?;
    assert!(inbox[0].delivery.is_read);
    let first_read = inbox[0].delivery.read_at;
    assert!(first_read.is_some());

    // Marking again keeps the original read time
    ctx.announcement_service.mark_read(target.id, id).await?;
    let inbox = ctx.announcement_service.inbox(target.id).await?;
    assert_eq!(inbox[0].delivery.read_at, first_read);

    let summaries = ctx.announcement_service.list_all().await?;
    assert_eq!(summaries[0].read_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_direct_announcement_needs_a_target() -> anyhow::Result<()> {
    let ctx = context().await?;

    let missing = CreateAnnouncementRequest {
        target_type: AnnouncementTarget::SpecificUser,
        target_user_id: None,
        ..broadcast("Hello")
    };
    assert!(matches!(
        ctx.announcement_service.publish(missing).await,
        Err(AppError::Validation(_))
    ));

    let unknown = CreateAnnouncementRequest {
        target_type: AnnouncementTarget::SpecificUser,
        target_user_id: Some(Uuid::new_v4()),
        ..broadcast("Hello")
    };
    assert!(matches!(
        ctx.announcement_service.publish(unknown).await,
        Err(AppError::Validation(_))
    ));

    // Nobody approved yet: published with no recipients
    let published = ctx.announcement_service.publish(broadcast("Welcome")).await?;
    assert_eq!(published.recipients, 0);

    Ok(())
}

#[tokio::test]
async fn test_report_status_is_free_by_default() -> anyhow::Result<()> {
    let ctx = context().await?;

    let filed = ctx.report_service.create(report("Late delivery")).await?;
    assert_eq!(filed.status, ReportStatus::Pending);

    let resolved = ctx
        .report_service
        .update_status(
            filed.id,
            UpdateReportRequest {
                status: ReportStatus::Resolved,
                admin_response: Some("Refund issued".to_string()),
            },
        )
        .await?;
    assert_eq!(resolved.status, ReportStatus::Resolved);
    assert_eq!(resolved.admin_response.as_deref(), Some("Refund issued"));

    // Reopening without a response keeps the previous one
    let reopened = ctx
        .report_service
        .update_status(
            filed.id,
            UpdateReportRequest {
                status: ReportStatus::Pending,
                admin_response: None,
            },
        )
        .await?;
    assert_eq!(reopened.status, ReportStatus::Pending);
    assert_eq!(reopened.admin_response.as_deref(), Some("Refund issued"));

    assert!(matches!(
        ctx.report_service
            .update_status(
                Uuid::new_v4(),
                UpdateReportRequest {
                    status: ReportStatus::Dismissed,
                    admin_response: None,
                },
            )
            .await,
        Err(AppError::NotFound(_))
    ));

    assert_eq!(ctx.report_service.list().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_strict_report_transitions() -> anyhow::Result<()> {
    let mut settings = settings();
    settings.reports.strict_transitions = true;
    let ctx = context_with(&settings).await?;

    let filed = ctx.report_service.create(report("Plagiarism")).await?;

    assert!(matches!(
        ctx.report_service
            .update_status(
                filed.id,
                UpdateReportRequest {
                    status: ReportStatus::Resolved,
                    admin_response: None,
                },
            )
            .await,
        Err(AppError::Conflict(_))
    ));

    ctx.report_service
        .update_status(
            filed.id,
            UpdateReportRequest {
                status: ReportStatus::Investigating,
                admin_response: None,
            },
        )
        .await?;

    // Once under investigation a report can only be resolved
    assert!(matches!(
        ctx.report_service
            .update_status(
                filed.id,
                UpdateReportRequest {
                    status: ReportStatus::Dismissed,
                    admin_response: None,
                },
            )
            .await,
        Err(AppError::Conflict(_))
    ));

    let resolved = ctx
        .report_service
        .update_status(
            filed.id,
            UpdateReportRequest {
                status: ReportStatus::Resolved,
                admin_response: None,
            },
        )
        .await?;
    assert_eq!(resolved.status, ReportStatus::Resolved);

    let mut invalid = report("x");
    invalid.reporter_email = Some("not-an-email".to_string());
    assert!(matches!(
        ctx.report_service.create(invalid).await,
        Err(AppError::Validation(_))
    ));

    Ok(())
}
