use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub service_fee: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Department {
    /// What a maker is credited for completing one assignment in this department.
    pub fn commission(&self) -> Option<i64> {
        commission_for(self.service_fee)
    }
}

/// Share of the service fee paid to the maker, in percent.
pub const COMMISSION_PERCENT: i64 = 80;

/// Largest service fee a department may charge. Keep in step with the `range`
/// validators below.
pub const MAX_SERVICE_FEE: i64 = 1_000_000_000;

/// floor(service_fee * 0.8), computed in integers. `None` when the product
/// does not fit in an i64.
pub fn commission_for(service_fee: i64) -> Option<i64> {
    service_fee
        .checked_mul(COMMISSION_PERCENT)
        .map(|scaled| scaled.div_euclid(100))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 120, message = "Department name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(
        min = 1,
        max = 1_000_000_000,
        message = "Service fee must be a positive amount no larger than 1000000000"
    ))]
    pub service_fee: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 120, message = "Department name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(
        min = 1,
        max = 1_000_000_000,
        message = "Service fee must be a positive amount no larger than 1000000000"
    ))]
    pub service_fee: Option<i64>,
}

/// Default catalog used by the seed binary (name, description, service fee).
pub fn default_departments() -> Vec<(&'static str, &'static str, i64)> {
    vec![
        ("Computer Science", "Programming, algorithms, software development", 500),
        ("Mathematics", "Calculus, algebra, statistics", 400),
        ("Physics", "Mechanics, thermodynamics, quantum physics", 450),
        ("Chemistry", "Organic, inorganic, analytical chemistry", 400),
        ("Biology", "Molecular biology, genetics, ecology", 350),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_is_floored() {
        assert_eq!(commission_for(500), Some(400));
        assert_eq!(commission_for(450), Some(360));
        assert_eq!(commission_for(333), Some(266));
        assert_eq!(commission_for(1), Some(0));
        assert_eq!(commission_for(MAX_SERVICE_FEE), Some(800_000_000));
    }

    #[test]
    fn test_commission_overflow_is_none() {
        assert_eq!(commission_for(i64::MAX), None);
        assert_eq!(commission_for(i64::MAX / 10), None);
    }

    #[test]
    fn test_fee_validators_stop_at_max() {
        let mut request = CreateDepartmentRequest {
            name: "CS".to_string(),
            description: None,
            service_fee: MAX_SERVICE_FEE,
        };
        assert!(request.validate().is_ok());
        request.service_fee = MAX_SERVICE_FEE + 1;
        assert!(request.validate().is_err());

        let update = UpdateDepartmentRequest {
            service_fee: Some(MAX_SERVICE_FEE + 1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_non_positive_fee() {
        let request = CreateDepartmentRequest {
            name: "CS".to_string(),
            description: None,
            service_fee: 0,
        };
        assert!(request.validate().is_err());
    }
}
