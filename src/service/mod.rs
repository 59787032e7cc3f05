pub mod identity_service;
pub mod department_service;
pub mod maker_service;
pub mod assignment_service;
pub mod ledger_service;
pub mod announcement_service;
pub mod report_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::repository::*;
use crate::storage::FileStore;
use identity_service::IdentityService;
use department_service::DepartmentService;
use maker_service::MakerService;
use assignment_service::AssignmentService;
use ledger_service::LedgerService;
use announcement_service::AnnouncementService;
use report_service::ReportService;

pub use identity_service::{LoginOutcome, Principal};
pub use ledger_service::{AdminOverview, LedgerAudit, MakerBalance};
pub use announcement_service::PublishedAnnouncement;

pub struct ServiceContext {
    pub department_repo: Arc<dyn DepartmentRepository>,
    pub maker_repo: Arc<dyn MakerRepository>,
    pub admin_repo: Arc<dyn AdminRepository>,
    pub assignment_repo: Arc<dyn AssignmentRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub report_repo: Arc<dyn ReportRepository>,
    pub auth_service: Arc<AuthService>,
    pub file_store: Arc<dyn FileStore>,
    pub identity_service: Arc<IdentityService>,
    pub department_service: Arc<DepartmentService>,
    pub maker_service: Arc<MakerService>,
    pub assignment_service: Arc<AssignmentService>,
    pub ledger_service: Arc<LedgerService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub report_service: Arc<ReportService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, file_store: Arc<dyn FileStore>, settings: &Settings) -> Self {
        let department_repo: Arc<dyn DepartmentRepository> =
            Arc::new(SqliteDepartmentRepository::new(db_pool.clone()));
        let maker_repo: Arc<dyn MakerRepository> =
            Arc::new(SqliteMakerRepository::new(db_pool.clone()));
        let admin_repo: Arc<dyn AdminRepository> =
            Arc::new(SqliteAdminRepository::new(db_pool.clone()));
        let assignment_repo: Arc<dyn AssignmentRepository> =
            Arc::new(SqliteAssignmentRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let announcement_repo: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));
        let report_repo: Arc<dyn ReportRepository> =
            Arc::new(SqliteReportRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(db_pool.clone()));

        let identity_service = Arc::new(IdentityService::new(
            maker_repo.clone(),
            admin_repo.clone(),
            department_repo.clone(),
            auth_service.clone(),
            file_store.clone(),
            settings.ledger.registration_fee,
            settings.auth.allow_admin_registration,
            settings.auth.session_duration_hours,
        ));
        let department_service = Arc::new(DepartmentService::new(department_repo.clone()));
        let maker_service = Arc::new(MakerService::new(
            maker_repo.clone(),
            auth_service.clone(),
            settings.ledger.registration_fee,
        ));
        let assignment_service = Arc::new(AssignmentService::new(
            assignment_repo.clone(),
            department_repo.clone(),
            maker_repo.clone(),
            file_store.clone(),
        ));
        let ledger_service = Arc::new(LedgerService::new(
            maker_repo.clone(),
            assignment_repo.clone(),
            payment_repo.clone(),
        ));
        let announcement_service = Arc::new(AnnouncementService::new(
            announcement_repo.clone(),
            maker_repo.clone(),
        ));
        let report_service = Arc::new(ReportService::new(
            report_repo.clone(),
            settings.reports.strict_transitions,
        ));

        Self {
            department_repo,
            maker_repo,
            admin_repo,
            assignment_repo,
            payment_repo,
            announcement_repo,
            report_repo,
            auth_service,
            file_store,
            identity_service,
            department_service,
            maker_service,
            assignment_service,
            ledger_service,
            announcement_service,
            report_service,
            db_pool,
        }
    }
}
