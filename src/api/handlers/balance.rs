use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;

use crate::{
    api::{
        handlers::assignments::{to_dtos, AssignmentDto},
        middleware::auth::CurrentPrincipal,
        state::AppState,
    },
    domain::Payment,
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct AdminBalanceResponse {
    pub total_users: i64,
    pub total_assignments: i64,
    pub completed_assignments: i64,
    pub total_revenue: i64,
    pub pending_payments: i64,
    pub recent_assignments: Vec<AssignmentDto>,
}

#[derive(Debug, Serialize)]
pub struct MakerBalanceResponse {
    pub balance: i64,
    pub total_earnings: i64,
    pub completed_assignments: i64,
    pub pending_assignments: i64,
    pub recent_assignments: Vec<AssignmentDto>,
    /// Registration fee and commission rows, newest first.
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BalanceResponse {
    Admin(AdminBalanceResponse),
    Maker(MakerBalanceResponse),
}

/// Platform aggregate for admins, personal earnings for makers.
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
) -> Result<Json<BalanceResponse>> {
    let ledger = &state.service_context.ledger_service;

    if principal.is_admin() {
        let overview = ledger.admin_overview().await?;
        return Ok(Json(BalanceResponse::Admin(AdminBalanceResponse {
            total_users: overview.total_users,
            total_assignments: overview.total_assignments,
            completed_assignments: overview.completed_assignments,
            total_revenue: overview.total_revenue,
            pending_payments: overview.pending_payments,
            recent_assignments: to_dtos(overview.recent_assignments),
        })));
    }

    let balance = ledger.maker_balance(principal.id).await?;
    let payments = ledger.payments_for(principal.id).await?;
    Ok(Json(BalanceResponse::Maker(MakerBalanceResponse {
        balance: balance.balance,
        total_earnings: balance.total_earnings,
        completed_assignments: balance.completed_assignments,
        pending_assignments: balance.pending_assignments,
        recent_assignments: to_dtos(balance.recent_assignments),
        payments,
    })))
}
