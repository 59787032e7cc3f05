use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentPrincipal, multipart::MultipartForm, state::AppState},
    domain::{Assignment, Payment, SubmitAssignmentRequest},
    error::{AppError, Result},
    repository::AssignmentFilter,
};

/// An assignment with its derived display label.
#[derive(Debug, Serialize)]
pub struct AssignmentDto {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub status_label: &'static str,
}

impl From<Assignment> for AssignmentDto {
    fn from(assignment: Assignment) -> Self {
        Self {
            status_label: assignment.status_label(),
            assignment,
        }
    }
}

pub fn to_dtos(assignments: Vec<Assignment>) -> Vec<AssignmentDto> {
    assignments.into_iter().map(Into::into).collect()
}

const SUBMIT_TEXT_FIELDS: &[&str] = &[
    "title",
    "description",
    "comments",
    "submitter_name",
    "submitter_phone",
    "submitter_email",
    "submitter_telegram",
    "submitter_whatsapp",
    "department_id",
    "assigned_to_id",
];
const SUBMIT_FILE_FIELDS: &[&str] = &["files"];

/// Seeker submission; no session required.
pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AssignmentDto>)> {
    let mut form = MultipartForm::collect(multipart, SUBMIT_TEXT_FIELDS, SUBMIT_FILE_FIELDS).await?;

    let request = SubmitAssignmentRequest {
        title: form.required("title")?,
        description: form.required("description")?,
        comments: form.optional("comments"),
        submitter_name: form.required("submitter_name")?,
        submitter_phone: form.required("submitter_phone")?,
        submitter_email: form.optional("submitter_email"),
        submitter_telegram: form.optional("submitter_telegram"),
        submitter_whatsapp: form.optional("submitter_whatsapp"),
        department_id: form.required_uuid("department_id")?,
        assigned_to_id: form.optional_uuid("assigned_to_id")?,
    };
    let attachments = form.files("files");

    let assignment = state
        .service_context
        .assignment_service
        .submit(request, attachments)
        .await?;

    Ok((StatusCode::CREATED, Json(assignment.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: Option<Uuid>,
}

/// Makers see their own assignments; admins see all, optionally for one maker.
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AssignmentDto>>> {
    let service = &state.service_context.assignment_service;

    let assignments = if principal.is_admin() {
        service
            .list(AssignmentFilter {
                assigned_to_id: query.user_id,
                ..Default::default()
            })
            .await?
    } else {
        if query.user_id.is_some_and(|id| id != principal.id) {
            return Err(AppError::Forbidden);
        }
        service.list_for_maker(principal.id).await?
    };

    Ok(Json(to_dtos(assignments)))
}

pub async fn list_available(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
) -> Result<Json<Vec<AssignmentDto>>> {
    let department_id = principal.maker_department()?;

    let assignments = state
        .service_context
        .assignment_service
        .list_claimable(department_id, principal.id)
        .await?;

    Ok(Json(to_dtos(assignments)))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimRequest {
    pub assignment_id: Uuid,
}

pub async fn claim(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<AssignmentDto>> {
    let assignment = state
        .service_context
        .assignment_service
        .claim(request.assignment_id, principal.id)
        .await?;

    Ok(Json(assignment.into()))
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub assignment: AssignmentDto,
    pub payment: Payment,
    pub commission: i64,
}

const COMPLETE_FILE_FIELDS: &[&str] = &["ai_detection_screenshot"];

pub async fn complete(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<CompletionResponse>> {
    let mut form = MultipartForm::collect(multipart, &[], COMPLETE_FILE_FIELDS).await?;
    let screenshot = form.file("ai_detection_screenshot");

    let completion = state
        .service_context
        .assignment_service
        .complete(id, principal.id, screenshot)
        .await?;

    Ok(Json(CompletionResponse {
        assignment: completion.assignment.into(),
        payment: completion.payment,
        commission: completion.commission,
    }))
}
