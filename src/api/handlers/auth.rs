use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    api::{multipart::MultipartForm, state::AppState},
    auth::{AuthService, SESSION_COOKIE},
    domain::{Admin, CreateAdminRequest, CreateMakerRequest, Maker, PrincipalKind},
    error::{AppError, Result},
    service::Principal,
    storage::UploadedFile,
};

/// JSON registration body, tagged by account kind.
#[derive(Debug, Deserialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum RegisterRequest {
    Admin(CreateAdminRequest),
    #[serde(alias = "user")]
    Maker(CreateMakerRequest),
}

#[derive(Debug, Serialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum RegisteredAccount {
    Admin(Admin),
    Maker(Maker),
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredAccount,
}

const REGISTER_TEXT_FIELDS: &[&str] = &[
    "user_type",
    "email",
    "password",
    "name",
    "phone",
    "telegram_username",
    "whatsapp_number",
    "department_id",
];
const REGISTER_FILE_FIELDS: &[&str] = &["payment_screenshot"];

async fn parse_multipart_registration(
    multipart: Multipart,
) -> Result<(RegisterRequest, Option<UploadedFile>)> {
    let mut form = MultipartForm::collect(multipart, REGISTER_TEXT_FIELDS, REGISTER_FILE_FIELDS).await?;

    let kind = form
        .optional("user_type")
        .map(|k| {
            PrincipalKind::from_str(&k)
                .ok_or_else(|| AppError::Validation(format!("Unknown user type '{}'", k)))
        })
        .transpose()?
        .unwrap_or(PrincipalKind::Maker);

    let request = match kind {
        PrincipalKind::Admin => RegisterRequest::Admin(CreateAdminRequest {
            email: form.required("email")?,
            password: form.required("password")?,
            name: form.optional("name"),
        }),
        PrincipalKind::Maker => RegisterRequest::Maker(CreateMakerRequest {
            email: form.required("email")?,
            password: form.required("password")?,
            name: form.required("name")?,
            phone: form.required("phone")?,
            telegram_username: form.optional("telegram_username"),
            whatsapp_number: form.optional("whatsapp_number"),
            department_id: form.required_uuid("department_id")?,
        }),
    };

    let screenshot = form.file("payment_screenshot");
    form.finish()?;
    Ok((request, screenshot))
}

/// Accepts either a JSON body or a multipart form carrying a payment screenshot.
pub async fn register(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let (register, screenshot) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        parse_multipart_registration(multipart).await?
    } else {
        let Json(body) = Json::<RegisterRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        (body, None)
    };

    let identity = &state.service_context.identity_service;
    let user = match register {
        RegisterRequest::Admin(req) => {
            if screenshot.is_some() {
                return Err(AppError::BadRequest(
                    "Admin registration does not take a payment screenshot".to_string(),
                ));
            }
            RegisteredAccount::Admin(identity.register_admin(req).await?)
        }
        RegisterRequest::Maker(req) => {
            RegisteredAccount::Maker(identity.register_maker(req, screenshot).await?)
        }
    };

    let message = match user {
        RegisteredAccount::Admin(_) => "Admin account created",
        RegisteredAccount::Maker(_) => "Registration submitted; an admin will review your account",
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: message.to_string(),
            user,
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub user_type: PrincipalKind,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: Principal,
    pub expires_at: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let identity = &state.service_context.identity_service;
    let outcome = identity.login(&req.email, &req.password, req.user_type).await?;

    let cookie = AuthService::create_session_cookie(
        &outcome.token,
        state.settings.auth.secure_cookies,
        identity.session_duration_hours(),
    );

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: outcome.principal,
            expires_at: outcome.session.expires_at.to_rfc3339(),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state
            .service_context
            .identity_service
            .logout(session_cookie.value())
            .await
        {
            tracing::warn!("Failed to invalidate session on logout: {}", e);
        }
    }

    let jar = jar.add(AuthService::create_logout_cookie());

    Ok((jar, StatusCode::NO_CONTENT))
}
