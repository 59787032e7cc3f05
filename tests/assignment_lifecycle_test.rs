mod common;

use assignmentpro::{
    domain::{AssignmentStatus, CreateDepartmentRequest, PaymentStatus, PaymentType, MAX_SERVICE_FEE},
    error::AppError,
};
use common::*;

#[tokio::test]
async fn test_claim_complete_credits_commission() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let maker = eligible_maker(&ctx, "maker@example.com", cs.id).await?;

    let submitted = ctx
        .assignment_service
        .submit(submission(cs.id), vec![png("brief.png")])
        .await?;
    assert_eq!(submitted.status, AssignmentStatus::Pending);
    assert!(!submitted.is_approved_by_admin);
    assert_eq!(submitted.files.len(), 1);
    assert!(submitted.code.starts_with("ASG-"));

    // Not claimable until approved
    let err = ctx.assignment_service.claim(submitted.id, maker.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    ctx.assignment_service.approve(submitted.id).await?;
    let available = ctx.assignment_service.list_claimable(cs.id, maker.id).await?;
    assert_eq!(available.len(), 1);

    let claimed = ctx.assignment_service.claim(submitted.id, maker.id).await?;
    assert_eq!(claimed.status, AssignmentStatus::InProgress);
    assert_eq!(claimed.assigned_to_id, Some(maker.id));

    // Re-claiming one's own assignment is fine
    ctx.assignment_service.claim(submitted.id, maker.id).await?;

    let completion = ctx
        .assignment_service
        .complete(submitted.id, maker.id, Some(png("ai-check.png")))
        .await?;
    assert_eq!(completion.commission, 400);
    assert_eq!(completion.assignment.status, AssignmentStatus::Completed);
    assert!(completion.assignment.ai_detection_screenshot.is_some());
    assert_eq!(completion.payment.payment_type, PaymentType::Commission);
    assert_eq!(completion.payment.status, PaymentStatus::Completed);
    assert_eq!(completion.payment.amount, 400);

    let maker = ctx.maker_service.get(maker.id).await?;
    assert_eq!(maker.balance, 400);
    assert_eq!(maker.total_earnings, 400);

    let balance = ctx.ledger_service.maker_balance(maker.id).await?;
    assert_eq!(balance.completed_assignments, 1);
    assert_eq!(balance.pending_assignments, 0);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_claims_have_one_winner() -> anyhow::Result<()> {
    let ctx = context().await?;
    let math = department(&ctx, "Mathematics", 400).await?;
    let first = eligible_maker(&ctx, "first@example.com", math.id).await?;
    let second = eligible_maker(&ctx, "second@example.com", math.id).await?;
    let assignment = approved_assignment(&ctx, math.id).await?;

    let (a, b) = tokio::join!(
        ctx.assignment_service.claim(assignment.id, first.id),
        ctx.assignment_service.claim(assignment.id, second.id),
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn test_double_completion_credits_once() -> anyhow::Result<()> {
    let ctx = context().await?;
    let physics = department(&ctx, "Physics", 450).await?;
    let maker = eligible_maker(&ctx, "maker@example.com", physics.id).await?;
    let assignment = approved_assignment(&ctx, physics.id).await?;
    ctx.assignment_service.claim(assignment.id, maker.id).await?;

    let (a, b) = tokio::join!(
        ctx.assignment_service.complete(assignment.id, maker.id, Some(png("a.png"))),
        ctx.assignment_service.complete(assignment.id, maker.id, Some(png("b.png"))),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

    let again = ctx
        .assignment_service
        .complete(assignment.id, maker.id, Some(png("c.png")))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let maker = ctx.maker_service.get(maker.id).await?;
    assert_eq!(maker.balance, 360);
    assert_eq!(maker.total_earnings, 360);

    let commissions = ctx.payment_repo.find_commission(assignment.id).await?;
    assert_eq!(commissions.len(), 1);

    let audit = ctx.ledger_service.audit().await?;
    assert!(audit.discrepancies.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_completion_guards() -> anyhow::Result<()> {
    let ctx = context().await?;
    let chem = department(&ctx, "Chemistry", 400).await?;
    let owner = eligible_maker(&ctx, "owner@example.com", chem.id).await?;
    let other = eligible_maker(&ctx, "other@example.com", chem.id).await?;
    let assignment = approved_assignment(&ctx, chem.id).await?;
    ctx.assignment_service.claim(assignment.id, owner.id).await?;

    let err = ctx
        .assignment_service
        .complete(assignment.id, other.id, Some(png("x.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = ctx
        .assignment_service
        .complete(assignment.id, owner.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = ctx
        .assignment_service
        .complete(uuid::Uuid::new_v4(), owner.id, Some(png("x.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let owner = ctx.maker_service.get(owner.id).await?;
    assert_eq!(owner.balance, 0);

    Ok(())
}

#[tokio::test]
async fn test_rejection_preempts_work() -> anyhow::Result<()> {
    let ctx = context().await?;
    let bio = department(&ctx, "Biology", 350).await?;
    let maker = eligible_maker(&ctx, "maker@example.com", bio.id).await?;
    let assignment = approved_assignment(&ctx, bio.id).await?;
    ctx.assignment_service.claim(assignment.id, maker.id).await?;

    let rejected = ctx.assignment_service.reject(assignment.id).await?;
    assert_eq!(rejected.status, AssignmentStatus::Rejected);

    // Rejecting twice is a no-op
    let again = ctx.assignment_service.reject(assignment.id).await?;
    assert_eq!(again.status, AssignmentStatus::Rejected);

    let err = ctx.assignment_service.claim(assignment.id, maker.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = ctx
        .assignment_service
        .complete(assignment.id, maker.id, Some(png("x.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = ctx.assignment_service.approve(assignment.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert!(ctx.assignment_service.list_claimable(bio.id, maker.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_completed_assignment_is_final() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let maker = eligible_maker(&ctx, "maker@example.com", cs.id).await?;
    let assignment = approved_assignment(&ctx, cs.id).await?;
    ctx.assignment_service.claim(assignment.id, maker.id).await?;
    ctx.assignment_service
        .complete(assignment.id, maker.id, Some(png("ai.png")))
        .await?;

    let err = ctx.assignment_service.reject(assignment.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = ctx
        .assignment_service
        .set_status(assignment.id, AssignmentStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Approving a completed item finalizes without paying again
    let approved = ctx.assignment_service.approve(assignment.id).await?;
    assert_eq!(approved.status, AssignmentStatus::Completed);
    assert_eq!(ctx.payment_repo.find_commission(assignment.id).await?.len(), 1);
    assert_eq!(ctx.maker_service.get(maker.id).await?.balance, 400);

    let delivered = ctx.assignment_service.mark_delivered(assignment.id).await?;
    assert!(delivered.solution_delivered);
    assert_eq!(delivered.status_label(), "Delivered");

    Ok(())
}

#[tokio::test]
async fn test_admin_status_edits() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let math = department(&ctx, "Mathematics", 400).await?;
    let first = eligible_maker(&ctx, "first@example.com", cs.id).await?;
    let second = eligible_maker(&ctx, "second@example.com", cs.id).await?;
    let outsider = eligible_maker(&ctx, "outsider@example.com", math.id).await?;
    let assignment = approved_assignment(&ctx, cs.id).await?;
    ctx.assignment_service.claim(assignment.id, first.id).await?;

    let err = ctx
        .assignment_service
        .set_status(assignment.id, AssignmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let reset = ctx
        .assignment_service
        .set_status(assignment.id, AssignmentStatus::Pending)
        .await?;
    assert_eq!(reset.status, AssignmentStatus::Pending);

    let err = ctx
        .assignment_service
        .reassign(assignment.id, outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let moved = ctx.assignment_service.reassign(assignment.id, second.id).await?;
    assert_eq!(moved.assigned_to_id, Some(second.id));

    let err = ctx.assignment_service.claim(assignment.id, first.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = ctx.assignment_service.mark_delivered(assignment.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn test_submission_validation() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let math = department(&ctx, "Mathematics", 400).await?;
    let math_maker = eligible_maker(&ctx, "math@example.com", math.id).await?;

    let mut no_contact = submission(cs.id);
    no_contact.submitter_telegram = Some("ab".to_string());
    no_contact.submitter_whatsapp = None;
    let err = ctx.assignment_service.submit(no_contact, Vec::new()).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut short = submission(cs.id);
    short.description = "too short".to_string();
    assert!(ctx.assignment_service.submit(short, Vec::new()).await.is_err());

    let err = ctx
        .assignment_service
        .submit(submission(uuid::Uuid::new_v4()), Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut wrong_department = submission(cs.id);
    wrong_department.assigned_to_id = Some(math_maker.id);
    let err = ctx
        .assignment_service
        .submit(wrong_department, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = ctx
        .assignment_service
        .submit(submission(cs.id), vec![png("payload.exe")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(ctx.assignment_repo.count(None).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_preassigned_assignment_completes_after_approval() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "CS", 500).await?;
    let maker = eligible_maker(&ctx, "maker@example.com", cs.id).await?;

    let mut request = submission(cs.id);
    request.assigned_to_id = Some(maker.id);
    let submitted = ctx.assignment_service.submit(request, Vec::new()).await?;
    assert_eq!(submitted.assigned_to_id, Some(maker.id));
    assert_eq!(submitted.status, AssignmentStatus::Pending);

    // Owner but not yet approved
    let err = ctx
        .assignment_service
        .complete(submitted.id, maker.id, Some(png("ai.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let approved = ctx.assignment_service.approve(submitted.id).await?;
    assert!(approved.is_approved_by_admin);
    assert_eq!(approved.status, AssignmentStatus::InProgress);

    let completion = ctx
        .assignment_service
        .complete(submitted.id, maker.id, Some(png("ai.png")))
        .await?;
    assert_eq!(completion.commission, 400);
    assert_eq!(ctx.maker_service.get(maker.id).await?.balance, 400);

    Ok(())
}

#[tokio::test]
async fn test_completion_at_the_maximum_fee() -> anyhow::Result<()> {
    let ctx = context().await?;
    let thesis = department(&ctx, "Thesis", MAX_SERVICE_FEE).await?;
    let maker = eligible_maker(&ctx, "thesis@example.com", thesis.id).await?;
    let assignment = approved_assignment(&ctx, thesis.id).await?;
    ctx.assignment_service.claim(assignment.id, maker.id).await?;

    let completion = ctx
        .assignment_service
        .complete(assignment.id, maker.id, Some(png("ai.png")))
        .await?;
    assert_eq!(completion.commission, 800_000_000);
    assert_eq!(completion.payment.amount, 800_000_000);
    assert_eq!(ctx.maker_service.get(maker.id).await?.balance, 800_000_000);

    let err = department(&ctx, "Too Expensive", MAX_SERVICE_FEE + 1).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_fee_fails_completion_cleanly() -> anyhow::Result<()> {
    let settings = settings();
    let ctx = context_with(&settings).await?;
    // Written straight through the repository, past request validation
    let legacy = ctx
        .department_repo
        .create(CreateDepartmentRequest {
            name: "Legacy".to_string(),
            description: None,
            service_fee: i64::MAX / 10,
        })
        .await?;
    let maker = eligible_maker(&ctx, "legacy@example.com", legacy.id).await?;
    let assignment = approved_assignment(&ctx, legacy.id).await?;
    ctx.assignment_service.claim(assignment.id, maker.id).await?;

    let err = ctx
        .assignment_service
        .complete(assignment.id, maker.id, Some(png("ai.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    let assignment = ctx.assignment_service.get(assignment.id).await?;
    assert_eq!(assignment.status, AssignmentStatus::InProgress);
    assert!(assignment.ai_detection_screenshot.is_none());
    assert_eq!(ctx.maker_service.get(maker.id).await?.balance, 0);

    let evidence_dir = std::path::Path::new(&settings.uploads.dir).join("ai-detection");
    let leftover = match std::fs::read_dir(&evidence_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    };
    assert_eq!(leftover, 0);

    Ok(())
}
