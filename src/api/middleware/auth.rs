use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::PrincipalKind,
    error::{AppError, Result},
};

/// The session's principal. Handlers trust the declared kind; credentials
/// were checked once at login.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal {
    pub id: Uuid,
    pub kind: PrincipalKind,
    /// Department snapshot taken at login; makers only.
    pub department_id: Option<Uuid>,
    pub session_id: String,
}

impl CurrentPrincipal {
    pub fn is_admin(&self) -> bool {
        self.kind == PrincipalKind::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// The maker's department, or Forbidden for admins.
    pub fn maker_department(&self) -> Result<Uuid> {
        match (self.kind, self.department_id) {
            (PrincipalKind::Maker, Some(department_id)) => Ok(department_id),
            _ => Err(AppError::Forbidden),
        }
    }
}

async fn resolve(state: &AppState, jar: &CookieJar) -> Result<CurrentPrincipal> {
    let session_cookie = jar.get(SESSION_COOKIE).ok_or(AppError::Unauthorized)?;

    let session = state
        .service_context
        .auth_service
        .validate_session(session_cookie.value())
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(CurrentPrincipal {
        id: session.principal_id,
        kind: session.principal_kind,
        department_id: session.department_id,
        session_id: session.id,
    })
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let principal = resolve(&state, &jar).await?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let principal = resolve(&state, &jar).await?;
    principal.require_admin()?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

pub async fn require_maker(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let principal = resolve(&state, &jar).await?;
    if principal.kind != PrincipalKind::Maker {
        return Err(AppError::Forbidden);
    }
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
