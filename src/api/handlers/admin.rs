use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{
        handlers::assignments::{to_dtos, AssignmentDto},
        state::AppState,
    },
    domain::{AssignmentStatus, Maker, MakerApprovalUpdate},
    error::Result,
    repository::AssignmentFilter,
    service::LedgerAudit,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct MakerListResponse {
    pub makers: Vec<Maker>,
    /// All makers, independent of `limit` and `offset`.
    pub total: i64,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<MakerListResponse>> {
    let service = &state.service_context.maker_service;
    let total = service.count().await?;
    let makers = service.list(params.limit, params.offset).await?;

    Ok(Json(MakerListResponse { makers, total }))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<MakerApprovalUpdate>,
) -> Result<Json<Maker>> {
    let maker = state
        .service_context
        .maker_service
        .update_approval(id, update)
        .await?;
    Ok(Json(maker))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.maker_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    status: Option<AssignmentStatus>,
    #[serde(rename = "departmentId", alias = "department_id")]
    department_id: Option<Uuid>,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentListParams>,
) -> Result<Json<Vec<AssignmentDto>>> {
    let assignments = state
        .service_context
        .assignment_service
        .list(AssignmentFilter {
            status: params.status,
            department_id: params.department_id,
            ..Default::default()
        })
        .await?;

    Ok(Json(to_dtos(assignments)))
}

/// One admin action per request.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum AssignmentAction {
    Approve,
    Reject,
    SetStatus { status: AssignmentStatus },
    Reassign { maker_id: Uuid },
    MarkDelivered,
}

pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<AssignmentAction>,
) -> Result<Json<AssignmentDto>> {
    let service = &state.service_context.assignment_service;

    let assignment = match action {
        AssignmentAction::Approve => service.approve(id).await?,
        AssignmentAction::Reject => service.reject(id).await?,
        AssignmentAction::SetStatus { status } => service.set_status(id, status).await?,
        AssignmentAction::Reassign { maker_id } => service.reassign(id, maker_id).await?,
        AssignmentAction::MarkDelivered => service.mark_delivered(id).await?,
    };

    Ok(Json(assignment.into()))
}

pub async fn ledger_audit(State(state): State<AppState>) -> Result<Json<LedgerAudit>> {
    let audit = state.service_context.ledger_service.audit().await?;
    Ok(Json(audit))
}
