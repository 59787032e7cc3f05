use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentPrincipal, state::AppState},
    domain::{AnnouncementSummary, CreateAnnouncementRequest, InboxEntry},
    error::Result,
    service::PublishedAnnouncement,
};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnnouncementList {
    All(Vec<AnnouncementSummary>),
    Inbox(Vec<InboxEntry>),
}

/// Admins get every announcement with read counts; makers get their inbox.
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
) -> Result<Json<AnnouncementList>> {
    let service = &state.service_context.announcement_service;

    let list = if principal.is_admin() {
        AnnouncementList::All(service.list_all().await?)
    } else {
        AnnouncementList::Inbox(service.inbox(principal.id).await?)
    };

    Ok(Json(list))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<PublishedAnnouncement>)> {
    principal.require_admin()?;

    let published = state
        .service_context
        .announcement_service
        .publish(request)
        .await?;

    Ok((StatusCode::CREATED, Json(published)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(principal): Extension<CurrentPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .service_context
        .announcement_service
        .mark_read(principal.id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
