mod common;

use assignmentpro::{
    auth::AuthService,
    domain::{MakerApprovalUpdate, PaymentStatus, PaymentType, PrincipalKind},
    error::AppError,
    service::Principal,
};
use common::*;

#[tokio::test]
async fn test_password_hashing() -> anyhow::Result<()> {
    let password = "my_secure_password";
    let hash = AuthService::hash_password(password).await?;

    assert!(AuthService::verify_password(password, &hash).await?);
    assert!(!AuthService::verify_password("wrong_password", &hash).await?);

    Ok(())
}

#[tokio::test]
async fn test_maker_login_reports_approval_state() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let maker = ctx
        .identity_service
        .register_maker(maker_request("maker@example.com", cs.id), None)
        .await?;
    assert!(!maker.is_approved);
    assert!(!maker.payment_approved);
    assert_eq!(maker.balance, 0);

    let identity = &ctx.identity_service;

    // Wrong credentials never reveal approval state
    assert!(matches!(
        identity.login("maker@example.com", "wrong-password", PrincipalKind::Maker).await,
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(
        identity.login("nobody@example.com", "maker123", PrincipalKind::Maker).await,
        Err(AppError::Unauthorized)
    ));
    // The admin store is separate
    assert!(matches!(
        identity.login("maker@example.com", "maker123", PrincipalKind::Admin).await,
        Err(AppError::Unauthorized)
    ));

    assert!(matches!(
        identity.login("maker@example.com", "maker123", PrincipalKind::Maker).await,
        Err(AppError::PendingApproval)
    ));

    ctx.maker_service
        .update_approval(
            maker.id,
            MakerApprovalUpdate {
                is_approved: Some(true),
                payment_approved: None,
            },
        )
        .await?;
    assert!(matches!(
        identity.login("maker@example.com", "maker123", PrincipalKind::Maker).await,
        Err(AppError::PendingPayment)
    ));

    ctx.maker_service
        .update_approval(
            maker.id,
            MakerApprovalUpdate {
                is_approved: None,
                payment_approved: Some(true),
            },
        )
        .await?;
    let outcome = identity
        .login("maker@example.com", "maker123", PrincipalKind::Maker)
        .await?;
    assert!(matches!(outcome.principal, Principal::Maker(_)));
    assert_eq!(outcome.principal.department_id(), Some(cs.id));

    let session = ctx.auth_service.validate_session(&outcome.token).await?;
    assert_eq!(session.map(|s| s.principal_id), Some(maker.id));

    identity.logout(&outcome.token).await?;
    assert!(ctx.auth_service.validate_session(&outcome.token).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_revoking_approval_ends_sessions() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let maker = eligible_maker(&ctx, "maker@example.com", cs.id).await?;

    let outcome = ctx
        .identity_service
        .login("maker@example.com", "maker123", PrincipalKind::Maker)
        .await?;

    ctx.maker_service
        .update_approval(
            maker.id,
            MakerApprovalUpdate {
                is_approved: Some(false),
                payment_approved: None,
            },
        )
        .await?;

    assert!(ctx.auth_service.validate_session(&outcome.token).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_registration_fee_follows_payment_decision() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;

    let with_receipt = ctx
        .identity_service
        .register_maker(maker_request("paid@example.com", cs.id), Some(png("receipt.png")))
        .await?;
    assert!(with_receipt.payment_screenshot.is_some());

    let payments = ctx.payment_repo.find_by_user(with_receipt.id).await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_type, PaymentType::RegistrationFee);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert_eq!(payments[0].amount, 300);

    ctx.maker_service
        .update_approval(
            with_receipt.id,
            MakerApprovalUpdate {
                is_approved: None,
                payment_approved: Some(true),
            },
        )
        .await?;
    let payments = ctx.payment_repo.find_by_user(with_receipt.id).await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Completed);

    let declined = ctx
        .identity_service
        .register_maker(maker_request("declined@example.com", cs.id), Some(png("receipt.png")))
        .await?;
    ctx.maker_service
        .update_approval(
            declined.id,
            MakerApprovalUpdate {
                is_approved: None,
                payment_approved: Some(false),
            },
        )
        .await?;
    let payments = ctx.payment_repo.find_by_user(declined.id).await?;
    assert_eq!(payments[0].status, PaymentStatus::Failed);

    // Verified without a screenshot: one completed fee is recorded
    let walk_in = ctx
        .identity_service
        .register_maker(maker_request("walkin@example.com", cs.id), None)
        .await?;
    assert!(ctx.payment_repo.find_by_user(walk_in.id).await?.is_empty());
    for _ in 0..2 {
        ctx.maker_service
            .update_approval(
                walk_in.id,
                MakerApprovalUpdate {
                    is_approved: None,
                    payment_approved: Some(true),
                },
            )
            .await?;
    }
    let payments = ctx.payment_repo.find_by_user(walk_in.id).await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Completed);

    Ok(())
}

#[tokio::test]
async fn test_registration_validation() -> anyhow::Result<()> {
    let ctx = context().await?;
    let cs = department(&ctx, "Computer Science", 500).await?;
    let identity = &ctx.identity_service;

    let mut no_channel = maker_request("a@example.com", cs.id);
    no_channel.telegram_username = Some("ab".to_string());
    no_channel.whatsapp_number = Some("1234567".to_string());
    assert!(matches!(
        identity.register_maker(no_channel, None).await,
        Err(AppError::Validation(_))
    ));

    let mut whatsapp_only = maker_request("b@example.com", cs.id);
    whatsapp_only.telegram_username = None;
    whatsapp_only.whatsapp_number = Some("+251911234567".to_string());
    identity.register_maker(whatsapp_only, None).await?;

    assert!(matches!(
        identity
            .register_maker(maker_request("b@example.com", cs.id), None)
            .await,
        Err(AppError::Conflict(_))
    ));

    assert!(matches!(
        identity
            .register_maker(maker_request("c@example.com", uuid::Uuid::new_v4()), None)
            .await,
        Err(AppError::Validation(_))
    ));

    assert!(matches!(
        identity
            .register_maker(maker_request("d@example.com", cs.id), Some(png("receipt.pdf")))
            .await,
        Err(AppError::Validation(_))
    ));
    assert!(ctx.maker_repo.find_by_email("d@example.com").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_admin_registration_can_be_disabled() -> anyhow::Result<()> {
    let mut settings = settings();
    settings.auth.allow_admin_registration = false;
    let ctx = context_with(&settings).await?;

    let request = assignmentpro::domain::CreateAdminRequest {
        email: "admin@example.com".to_string(),
        password: "admin123".to_string(),
        name: None,
    };
    assert!(matches!(
        ctx.identity_service.register_admin(request.clone()).await,
        Err(AppError::Forbidden)
    ));

    let admin = ctx.identity_service.create_admin(request).await?;
    assert_eq!(admin.name, "Admin");

    let outcome = ctx
        .identity_service
        .login("admin@example.com", "admin123", PrincipalKind::Admin)
        .await?;
    assert!(matches!(outcome.principal, Principal::Admin(_)));
    assert_eq!(outcome.principal.department_id(), None);

    Ok(())
}
