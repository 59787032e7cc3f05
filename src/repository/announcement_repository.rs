use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        Announcement, AnnouncementSummary, AnnouncementTarget, CreateAnnouncementRequest,
        InboxEntry, UserAnnouncement,
    },
    error::{AppError, Result},
    repository::{parse_id, parse_opt_id, to_utc, AnnouncementRepository},
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    content: String,
    target_type: String,
    target_user_id: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    announcement: AnnouncementRow,
    recipients: i64,
    read_count: i64,
}

#[derive(FromRow)]
struct InboxRow {
    ua_id: String,
    ua_user_id: String,
    ua_is_read: i32,
    ua_read_at: Option<NaiveDateTime>,
    ua_created_at: NaiveDateTime,
    #[sqlx(flatten)]
    announcement: AnnouncementRow,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: parse_id(&row.id)?,
            title: row.title,
            content: row.content,
            target_type: AnnouncementTarget::from_str(&row.target_type).ok_or_else(|| {
                AppError::Database(format!("Invalid announcement target: {}", row.target_type))
            })?,
            target_user_id: parse_opt_id(row.target_user_id)?,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    fn row_to_entry(row: InboxRow) -> Result<InboxEntry> {
        let announcement = Self::row_to_announcement(row.announcement)?;
        Ok(InboxEntry {
            delivery: UserAnnouncement {
                id: parse_id(&row.ua_id)?,
                user_id: parse_id(&row.ua_user_id)?,
                announcement_id: announcement.id,
                is_read: row.ua_is_read != 0,
                read_at: row.ua_read_at.map(to_utc),
                created_at: to_utc(row.ua_created_at),
            },
            announcement,
        })
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create_with_fanout(
        &self,
        request: CreateAnnouncementRequest,
    ) -> Result<(Announcement, i64)> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();
        let target_user_id = match request.target_type {
            AnnouncementTarget::All => None,
            AnnouncementTarget::SpecificUser => request.target_user_id.map(|u| u.to_string()),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO announcements (id, title, content, target_type, target_user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(request.title.trim())
        .bind(&request.content)
        .bind(request.target_type.as_str())
        .bind(&target_user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Recipients are fixed now; makers approved later do not receive it.
        let recipients = match target_user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"
                    INSERT INTO user_announcements (id, user_id, announcement_id, is_read, read_at, created_at)
                    VALUES (?, ?, ?, 0, NULL, ?)
                    "#
                )
                .bind(Uuid::new_v4().to_string())
                .bind(user_id)
                .bind(&id_str)
                .bind(now)
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
            None => {
                let makers: Vec<String> =
                    sqlx::query_scalar("SELECT id FROM makers WHERE is_approved = 1")
                        .fetch_all(&mut *tx)
                        .await?;

                let mut inserted = 0;
                for maker_id in makers {
                    inserted += sqlx::query(
                        r#"
                        INSERT INTO user_announcements (id, user_id, announcement_id, is_read, read_at, created_at)
                        VALUES (?, ?, ?, 0, NULL, ?)
                        "#
                    )
                    .bind(Uuid::new_v4().to_string())
                    .bind(maker_id)
                    .bind(&id_str)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                }
                inserted
            }
        };

        tx.commit().await?;

        let announcement = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })?;

        Ok((announcement, recipients as i64))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, content, target_type, target_user_id, created_at, updated_at
            FROM announcements
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_announcement).transpose()
    }

    async fn list_with_counts(&self) -> Result<Vec<AnnouncementSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT a.id, a.title, a.content, a.target_type, a.target_user_id,
                   a.created_at, a.updated_at,
                   (SELECT COUNT(*) FROM user_announcements ua
                    WHERE ua.announcement_id = a.id) AS recipients,
                   (SELECT COUNT(*) FROM user_announcements ua
                    WHERE ua.announcement_id = a.id AND ua.is_read = 1) AS read_count
            FROM announcements a
            ORDER BY a.created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AnnouncementSummary {
                    announcement: Self::row_to_announcement(row.announcement)?,
                    recipients: row.recipients,
                    read_count: row.read_count,
                })
            })
            .collect()
    }

    async fn inbox(&self, user_id: Uuid) -> Result<Vec<InboxEntry>> {
        let rows = sqlx::query_as::<_, InboxRow>(
            r#"
            SELECT ua.id AS ua_id, ua.user_id AS ua_user_id, ua.is_read AS ua_is_read,
                   ua.read_at AS ua_read_at, ua.created_at AS ua_created_at,
                   a.id, a.title, a.content, a.target_type, a.target_user_id,
                   a.created_at, a.updated_at
            FROM user_announcements ua
            JOIN announcements a ON a.id = ua.announcement_id
            WHERE ua.user_id = ?
            ORDER BY a.created_at DESC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_entry)
            .collect()
    }

    async fn mark_read(&self, user_id: Uuid, announcement_id: Uuid) -> Result<bool> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE user_announcements
            SET is_read = 1, read_at = COALESCE(read_at, ?)
            WHERE user_id = ? AND announcement_id = ?
            "#
        )
        .bind(now)
        .bind(user_id.to_string())
        .bind(announcement_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
