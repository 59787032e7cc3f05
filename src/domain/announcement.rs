use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub target_type: AnnouncementTarget,
    pub target_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementTarget {
    #[default]
    All,
    SpecificUser,
}

impl AnnouncementTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementTarget::All => "ALL",
            AnnouncementTarget::SpecificUser => "SPECIFIC_USER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ALL" => Some(AnnouncementTarget::All),
            "SPECIFIC_USER" => Some(AnnouncementTarget::SpecificUser),
            _ => None,
        }
    }
}

/// Per-recipient delivery record created when an announcement is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnnouncement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub announcement_id: Uuid,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A maker's inbox entry: the fan-out row with its announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub delivery: UserAnnouncement,
    pub announcement: Announcement,
}

/// Admin view of an announcement with how far it has been read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementSummary {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub recipients: i64,
    pub read_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub target_type: AnnouncementTarget,
    pub target_user_id: Option<Uuid>,
}
