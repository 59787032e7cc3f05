use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{CreateReportRequest, Report, UpdateReportRequest},
    error::Result,
};

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<Report>)> {
    let report = state.service_context.report_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Report>>> {
    let reports = state.service_context.report_service.list().await?;
    Ok(Json(reports))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReportRequest>,
) -> Result<Json<Report>> {
    let report = state
        .service_context
        .report_service
        .update_status(id, request)
        .await?;
    Ok(Json(report))
}
