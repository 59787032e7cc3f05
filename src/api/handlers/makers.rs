use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::Maker,
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct MakerQuery {
    #[serde(rename = "departmentId", alias = "department_id")]
    department_id: Option<Uuid>,
}

/// What a seeker sees when choosing a maker. Contact and ledger fields stay private.
#[derive(Debug, Serialize)]
pub struct PublicMakerDto {
    pub id: Uuid,
    pub name: String,
    pub department_id: Uuid,
}

impl From<Maker> for PublicMakerDto {
    fn from(maker: Maker) -> Self {
        Self {
            id: maker.id,
            name: maker.name,
            department_id: maker.department_id,
        }
    }
}

pub async fn list_eligible(
    State(state): State<AppState>,
    Query(query): Query<MakerQuery>,
) -> Result<Json<Vec<PublicMakerDto>>> {
    let department_id = query
        .department_id
        .ok_or_else(|| AppError::BadRequest("departmentId is required".to_string()))?;

    let makers = state
        .service_context
        .maker_service
        .list_eligible(department_id)
        .await?;

    Ok(Json(makers.into_iter().map(Into::into).collect()))
}
