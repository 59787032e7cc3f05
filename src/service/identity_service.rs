use std::sync::Arc;

use serde::Serialize;
use validator::Validate;

use crate::{
    auth::{AuthService, Session},
    domain::*,
    error::{AppError, Result},
    repository::{AdminRepository, DepartmentRepository, MakerRepository, NewMaker},
    storage::{FileStore, UploadKind, UploadedFile},
};

/// Who a successful login resolved to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum Principal {
    Admin(Admin),
    Maker(Maker),
}

impl Principal {
    pub fn id(&self) -> uuid::Uuid {
        match self {
            Principal::Admin(admin) => admin.id,
            Principal::Maker(maker) => maker.id,
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Admin(_) => PrincipalKind::Admin,
            Principal::Maker(_) => PrincipalKind::Maker,
        }
    }

    pub fn department_id(&self) -> Option<uuid::Uuid> {
        match self {
            Principal::Admin(_) => None,
            Principal::Maker(maker) => Some(maker.department_id),
        }
    }
}

pub struct LoginOutcome {
    pub principal: Principal,
    pub session: Session,
    pub token: String,
}

pub struct IdentityService {
    makers: Arc<dyn MakerRepository>,
    admins: Arc<dyn AdminRepository>,
    departments: Arc<dyn DepartmentRepository>,
    auth: Arc<AuthService>,
    files: Arc<dyn FileStore>,
    registration_fee: i64,
    allow_admin_registration: bool,
    session_duration_hours: i64,
}

impl IdentityService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        makers: Arc<dyn MakerRepository>,
        admins: Arc<dyn AdminRepository>,
        departments: Arc<dyn DepartmentRepository>,
        auth: Arc<AuthService>,
        files: Arc<dyn FileStore>,
        registration_fee: i64,
        allow_admin_registration: bool,
        session_duration_hours: i64,
    ) -> Self {
        Self {
            makers,
            admins,
            departments,
            auth,
            files,
            registration_fee,
            allow_admin_registration,
            session_duration_hours,
        }
    }

    pub fn session_duration_hours(&self) -> i64 {
        self.session_duration_hours
    }

    /// Creates an unapproved maker. A payment screenshot, if given, is stored
    /// and recorded as a pending registration-fee payment.
    pub async fn register_maker(
        &self,
        request: CreateMakerRequest,
        payment_screenshot: Option<UploadedFile>,
    ) -> Result<Maker> {
        request.validate()?;

        if self.departments.find_by_id(request.department_id).await?.is_none() {
            return Err(AppError::Validation("Selected department does not exist".to_string()));
        }

        if self.makers.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("User with this email already exists".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;

        let screenshot_uri = match payment_screenshot {
            Some(file) => Some(
                self.files
                    .store(UploadKind::PaymentScreenshot, &file.filename, &file.data)
                    .await?,
            ),
            None => None,
        };

        let new_maker = NewMaker {
            request,
            password_hash,
            registration_fee: screenshot_uri.as_ref().map(|_| self.registration_fee),
            payment_screenshot: screenshot_uri.clone(),
        };

        match self.makers.create(new_maker).await {
            Ok(maker) => {
                tracing::info!("Registered maker {} ({})", maker.id, maker.email);
                Ok(maker)
            }
            Err(e) => {
                if let Some(uri) = screenshot_uri {
                    if let Err(cleanup) = self.files.delete(&uri).await {
                        tracing::warn!("Failed to remove orphaned upload {}: {}", uri, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn register_admin(&self, request: CreateAdminRequest) -> Result<Admin> {
        if !self.allow_admin_registration {
            return Err(AppError::Forbidden);
        }
        self.create_admin(request).await
    }

    /// Creates an admin regardless of the registration setting. Used by the seed binary.
    pub async fn create_admin(&self, request: CreateAdminRequest) -> Result<Admin> {
        request.validate()?;

        if self.admins.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Admin with this email already exists".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Admin")
            .to_string();

        let admin = self.admins.create(&request.email, &password_hash, &name).await?;
        tracing::info!("Created admin {} ({})", admin.id, admin.email);
        Ok(admin)
    }

    /// Checks credentials against the store for `kind`. Approval refusals are
    /// only reported once the password has matched.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        kind: PrincipalKind,
    ) -> Result<Principal> {
        match kind {
            PrincipalKind::Admin => {
                let hash = self
                    .admins
                    .password_hash(email)
                    .await?
                    .ok_or(AppError::Unauthorized)?;
                if !AuthService::verify_password(password, &hash).await? {
                    return Err(AppError::Unauthorized);
                }
                let admin = self
                    .admins
                    .find_by_email(email)
                    .await?
                    .ok_or(AppError::Unauthorized)?;
                Ok(Principal::Admin(admin))
            }
            PrincipalKind::Maker => {
                let hash = self
                    .makers
                    .password_hash(email)
                    .await?
                    .ok_or(AppError::Unauthorized)?;
                if !AuthService::verify_password(password, &hash).await? {
                    return Err(AppError::Unauthorized);
                }
                let maker = self
                    .makers
                    .find_by_email(email)
                    .await?
                    .ok_or(AppError::Unauthorized)?;

                if !maker.is_approved {
                    tracing::warn!("Login refused for maker {}: pending approval", maker.id);
                    return Err(AppError::PendingApproval);
                }
                if !maker.payment_approved {
                    tracing::warn!("Login refused for maker {}: pending payment", maker.id);
                    return Err(AppError::PendingPayment);
                }
                Ok(Principal::Maker(maker))
            }
        }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        kind: PrincipalKind,
    ) -> Result<LoginOutcome> {
        let principal = self.authenticate(email, password, kind).await?;

        let (session, token) = self
            .auth
            .create_session(
                principal.id(),
                principal.kind(),
                principal.department_id(),
                self.session_duration_hours,
            )
            .await?;

        tracing::info!("{} {} logged in", principal.kind().as_str(), principal.id());

        Ok(LoginOutcome {
            principal,
            session,
            token,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.auth.invalidate_session(token).await
    }
}
