use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: i64,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub assignment_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    RegistrationFee,
    Commission,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::RegistrationFee => "REGISTRATION_FEE",
            PaymentType::Commission => "COMMISSION",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "REGISTRATION_FEE" => Some(PaymentType::RegistrationFee),
            "COMMISSION" => Some(PaymentType::Commission),
            _ => None,
        }
    }
}

/// Payments are append-only; status only ever leaves PENDING.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// One maker whose earnings accumulator disagrees with their commission rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerDiscrepancy {
    pub maker_id: Uuid,
    pub maker_name: String,
    pub total_earnings: i64,
    pub commission_sum: i64,
}
