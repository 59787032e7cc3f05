use std::sync::Arc;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{AnnouncementRepository, MakerRepository},
};

#[derive(Debug, Clone, Serialize)]
pub struct PublishedAnnouncement {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub recipients: i64,
}

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
    makers: Arc<dyn MakerRepository>,
}

impl AnnouncementService {
    pub fn new(repo: Arc<dyn AnnouncementRepository>, makers: Arc<dyn MakerRepository>) -> Self {
        Self { repo, makers }
    }

    pub async fn publish(&self, request: CreateAnnouncementRequest) -> Result<PublishedAnnouncement> {
        request.validate()?;

        if request.target_type == AnnouncementTarget::SpecificUser {
            let target = request.target_user_id.ok_or_else(|| {
                AppError::Validation("Target user is required for SPECIFIC_USER announcements".to_string())
            })?;
            if self.makers.find_by_id(target).await?.is_none() {
                return Err(AppError::Validation("Target user does not exist".to_string()));
            }
        }

        let (announcement, recipients) = self.repo.create_with_fanout(request).await?;
        tracing::info!(
            "Announcement {} published to {} recipients",
            announcement.id,
            recipients
        );

        Ok(PublishedAnnouncement { announcement, recipients })
    }

    pub async fn list_all(&self) -> Result<Vec<AnnouncementSummary>> {
        self.repo.list_with_counts().await
    }

    pub async fn inbox(&self, maker_id: Uuid) -> Result<Vec<InboxEntry>> {
        self.repo.inbox(maker_id).await
    }

    /// Only the caller's own delivery row can be marked. Marking twice keeps
    /// the first read time.
    pub async fn mark_read(&self, maker_id: Uuid, announcement_id: Uuid) -> Result<()> {
        if self.repo.mark_read(maker_id, announcement_id).await? {
            return Ok(());
        }

        if self.repo.find_by_id(announcement_id).await?.is_none() {
            return Err(AppError::NotFound("Announcement not found".to_string()));
        }

        tracing::warn!(
            "Maker {} tried to mark announcement {} not addressed to them",
            maker_id,
            announcement_id
        );
        Err(AppError::Forbidden)
    }
}
