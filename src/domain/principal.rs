use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// The two kinds of account that can hold a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    #[serde(alias = "user")]
    Maker,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admin",
            PrincipalKind::Maker => "maker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(PrincipalKind::Admin),
            // the registration form historically sent "user" for makers
            "maker" | "user" => Some(PrincipalKind::Maker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maker {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub telegram_username: Option<String>,
    pub whatsapp_number: Option<String>,
    pub department_id: Uuid,
    pub is_approved: bool,
    pub payment_approved: bool,
    pub payment_screenshot: Option<String>,
    pub balance: i64,
    pub total_earnings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Maker {
    /// Approved by an admin and registration payment verified.
    pub fn is_eligible(&self) -> bool {
        self.is_approved && self.payment_approved
    }
}

pub const MIN_TELEGRAM_LEN: usize = 3;
pub const MIN_WHATSAPP_LEN: usize = 8;

/// At least one usable delivery channel: telegram (3+ chars) or whatsapp (8+ chars).
pub fn has_contact_channel(telegram: Option<&str>, whatsapp: Option<&str>) -> bool {
    let telegram_ok = telegram
        .map(|t| t.trim().chars().count() >= MIN_TELEGRAM_LEN)
        .unwrap_or(false);
    let whatsapp_ok = whatsapp
        .map(|w| w.trim().chars().count() >= MIN_WHATSAPP_LEN)
        .unwrap_or(false);
    telegram_ok || whatsapp_ok
}

pub(crate) fn contact_channel_error() -> ValidationError {
    let mut err = ValidationError::new("contact_channel");
    err.message = Some(Cow::from(
        "Either Telegram username (min 3 characters) or WhatsApp number (min 8 digits) is required",
    ));
    err
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_maker_contact"))]
pub struct CreateMakerRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: String,
    #[validate(length(min = 8, max = 20, message = "Please provide a valid phone number"))]
    pub phone: String,
    pub telegram_username: Option<String>,
    pub whatsapp_number: Option<String>,
    pub department_id: Uuid,
}

fn validate_maker_contact(request: &CreateMakerRequest) -> Result<(), ValidationError> {
    if has_contact_channel(
        request.telegram_username.as_deref(),
        request.whatsapp_number.as_deref(),
    ) {
        Ok(())
    } else {
        Err(contact_channel_error())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateAdminRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub name: Option<String>,
}

/// Admin decision on a maker account. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MakerApprovalUpdate {
    pub is_approved: Option<bool>,
    pub payment_approved: Option<bool>,
}

impl MakerApprovalUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_approved.is_none() && self.payment_approved.is_none()
    }
}
