use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::{AppError, Result};

pub mod department_repository;
pub mod maker_repository;
pub mod admin_repository;
pub mod assignment_repository;
pub mod payment_repository;
pub mod announcement_repository;
pub mod report_repository;

pub use department_repository::SqliteDepartmentRepository;
pub use maker_repository::SqliteMakerRepository;
pub use admin_repository::SqliteAdminRepository;
pub use assignment_repository::SqliteAssignmentRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use announcement_repository::SqliteAnnouncementRepository;
pub use report_repository::SqliteReportRepository;

/// Outcome of a delete that is refused while other rows still point at the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedDelete {
    Deleted,
    NotFound,
    Referenced { makers: i64, assignments: i64, payments: i64 },
}

/// Everything the completion transaction wrote.
#[derive(Debug, Clone)]
pub struct Completion {
    pub assignment: Assignment,
    pub payment: Payment,
    pub commission: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub assigned_to_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub limit: Option<i64>,
}

/// A maker row to insert, with its already-hashed password.
#[derive(Debug, Clone)]
pub struct NewMaker {
    pub request: CreateMakerRequest,
    pub password_hash: String,
    pub payment_screenshot: Option<String>,
    /// Recorded as a PENDING registration-fee payment when present.
    pub registration_fee: Option<i64>,
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn create(&self, request: CreateDepartmentRequest) -> Result<Department>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Department>>;
    async fn list(&self) -> Result<Vec<Department>>;
    async fn update(&self, id: Uuid, request: UpdateDepartmentRequest) -> Result<Department>;
    async fn delete_unreferenced(&self, id: Uuid) -> Result<GuardedDelete>;
}

#[async_trait]
pub trait MakerRepository: Send + Sync {
    async fn create(&self, maker: NewMaker) -> Result<Maker>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Maker>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Maker>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Maker>>;
    async fn list_eligible(&self, department_id: Uuid) -> Result<Vec<Maker>>;
    async fn count(&self) -> Result<i64>;
    async fn count_approved(&self) -> Result<i64>;
    async fn update_approval(
        &self,
        id: Uuid,
        update: MakerApprovalUpdate,
        registration_fee: i64,
    ) -> Result<Maker>;
    async fn delete_unreferenced(&self, id: Uuid) -> Result<GuardedDelete>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str, name: &str) -> Result<Admin>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create(&self, assignment: NewAssignment) -> Result<Assignment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assignment>>;
    async fn list(&self, filter: AssignmentFilter) -> Result<Vec<Assignment>>;
    async fn list_claimable(&self, department_id: Uuid, maker_id: Uuid) -> Result<Vec<Assignment>>;
    async fn count(&self, status: Option<AssignmentStatus>) -> Result<i64>;
    async fn count_open_for_maker(&self, maker_id: Uuid) -> Result<i64>;

    /// Compare-and-swap claim. `None` when the guard no longer holds.
    async fn claim(&self, id: Uuid, maker_id: Uuid) -> Result<Option<Assignment>>;
    /// Status flip, ledger credit and commission row in one transaction.
    /// `None` when the assignment is no longer completable by this maker.
    async fn complete(&self, id: Uuid, maker_id: Uuid, screenshot: &str) -> Result<Option<Completion>>;
    async fn approve(&self, id: Uuid) -> Result<Option<Assignment>>;
    async fn reject(&self, id: Uuid) -> Result<Option<Assignment>>;
    async fn reassign(&self, id: Uuid, maker_id: Uuid) -> Result<Option<Assignment>>;
    async fn set_status(&self, id: Uuid, status: AssignmentStatus) -> Result<Option<Assignment>>;
    async fn mark_delivered(&self, id: Uuid) -> Result<Option<Assignment>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>>;
    async fn find_commission(&self, assignment_id: Uuid) -> Result<Vec<Payment>>;
    async fn sum_completed(&self, payment_type: PaymentType) -> Result<i64>;
    async fn count_by_status(&self, status: PaymentStatus) -> Result<i64>;
    async fn ledger_discrepancies(&self) -> Result<Vec<LedgerDiscrepancy>>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    /// Inserts the announcement and its fan-out rows. Returns the recipient count.
    async fn create_with_fanout(&self, request: CreateAnnouncementRequest) -> Result<(Announcement, i64)>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    async fn list_with_counts(&self) -> Result<Vec<AnnouncementSummary>>;
    async fn inbox(&self, user_id: Uuid) -> Result<Vec<InboxEntry>>;
    /// `false` when the caller has no fan-out row for the announcement.
    async fn mark_read(&self, user_id: Uuid, announcement_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, request: CreateReportRequest) -> Result<Report>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>>;
    async fn list(&self) -> Result<Vec<Report>>;
    async fn update_status(&self, id: Uuid, request: UpdateReportRequest) -> Result<Report>;
}

pub(crate) fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

pub(crate) fn parse_opt_id(s: Option<String>) -> Result<Option<Uuid>> {
    s.as_deref().map(parse_id).transpose()
}

pub(crate) fn to_utc(dt: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(dt, Utc)
}
