use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{CreateDepartmentRequest, Department, UpdateDepartmentRequest},
    error::Result,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Department>>> {
    let departments = state.service_context.department_service.list().await?;
    Ok(Json(departments))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Department>> {
    let department = state.service_context.department_service.get(id).await?;
    Ok(Json(department))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>)> {
    let department = state.service_context.department_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDepartmentRequest>,
) -> Result<Json<Department>> {
    let department = state.service_context.department_service.update(id, request).await?;
    Ok(Json(department))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.department_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
