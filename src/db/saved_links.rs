use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        NewSavedLink, PageRequest, SaveOutcome, SavedLink, SavedLinkFilter, SavedLinkUpdate,
    },
};

/// Persistence for owners' saved links.
///
/// Every lookup and mutation is scoped to `owner_id`; another owner's row
/// behaves exactly like a missing one.
#[async_trait]
pub trait SavedLinkStore: Send + Sync {
    /// Save a parsed link, or return the owner's existing row for it.
    async fn save(&self, new: NewSavedLink) -> AppResult<SaveOutcome>;

    async fn get(&self, owner_id: &str, id: Uuid) -> AppResult<Option<SavedLink>>;

    /// Newest first. Returns the page and the total number of matches.
    async fn list(
        &self,
        owner_id: &str,
        filter: SavedLinkFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<SavedLink>, i64)>;

    async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        update: &SavedLinkUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SavedLink>>;

    async fn mark_read(
        &self,
        owner_id: &str,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SavedLink>>;

    async fn toggle_favourite(&self, owner_id: &str, id: Uuid) -> AppResult<Option<SavedLink>>;

    /// `true` if a row was removed.
    async fn delete(&self, owner_id: &str, id: Uuid) -> AppResult<bool>;
}

const SELECT_COLUMNS: &str = "s.id, s.parsed_link_id, s.owner_id, s.custom_note, s.custom_title,
     s.tags, s.status, s.saved_at, s.read_at";

const RETURNING_COLUMNS: &str = "id, parsed_link_id, owner_id, custom_note, custom_title,
     tags, status, saved_at, read_at";

#[derive(Clone)]
pub struct PgSavedLinkStore {
    pool: PgPool,
}

impl PgSavedLinkStore {
    pub fn new(pool: PgPool) -> Self {
        PgSavedLinkStore { pool }
    }

    /// Lock the owner's row, apply `change` to it and write it back.
    async fn modify(
        &self,
        owner_id: &str,
        id: Uuid,
        change: impl FnOnce(&mut SavedLink) + Send,
    ) -> AppResult<Option<SavedLink>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, SavedLink>(&format!(
            "SELECT {SELECT_COLUMNS} FROM saved_links s
             WHERE s.id = $1 AND s.owner_id = $2
             FOR UPDATE"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut link) = current else {
            return Ok(None);
        };
        change(&mut link);

        let row = sqlx::query_as::<_, SavedLink>(&format!(
            "UPDATE saved_links
             SET custom_note = $3, custom_title = $4, tags = $5, status = $6, read_at = $7
             WHERE id = $1 AND owner_id = $2
             RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(link.id)
        .bind(&link.owner_id)
        .bind(&link.custom_note)
        .bind(&link.custom_title)
        .bind(&link.tags)
        .bind(link.status)
        .bind(link.read_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row))
    }
}

#[async_trait]
impl SavedLinkStore for PgSavedLinkStore {
    async fn save(&self, new: NewSavedLink) -> AppResult<SaveOutcome> {
        let link = SavedLink::new(new, Utc::now());

        // The (owner_id, parsed_link_id) unique index settles racing saves.
        let inserted = sqlx::query_as::<_, SavedLink>(&format!(
            "INSERT INTO saved_links
                 (id, parsed_link_id, owner_id, custom_note, custom_title, tags, status, saved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (owner_id, parsed_link_id) DO NOTHING
             RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(link.id)
        .bind(link.parsed_link_id)
        .bind(&link.owner_id)
        .bind(&link.custom_note)
        .bind(&link.custom_title)
        .bind(&link.tags)
        .bind(link.status)
        .bind(link.saved_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(SaveOutcome::Created(row));
        }

        let existing = sqlx::query_as::<_, SavedLink>(&format!(
            "SELECT {SELECT_COLUMNS} FROM saved_links s
             WHERE s.owner_id = $1 AND s.parsed_link_id = $2"
        ))
        .bind(&link.owner_id)
        .bind(link.parsed_link_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SaveOutcome::Existing(existing))
    }

    async fn get(&self, owner_id: &str, id: Uuid) -> AppResult<Option<SavedLink>> {
        let row = sqlx::query_as::<_, SavedLink>(&format!(
            "SELECT {SELECT_COLUMNS} FROM saved_links s WHERE s.id = $1 AND s.owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(
        &self,
        owner_id: &str,
        filter: SavedLinkFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<SavedLink>, i64)> {
        let category = filter.category.map(|c| c.to_string());
        let status = filter.status.map(|s| s.to_string());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM saved_links s
             JOIN parsed_links p ON p.id = s.parsed_link_id
             WHERE s.owner_id = $1
               AND ($2::text IS NULL OR p.category = $2)
               AND ($3::text IS NULL OR s.status = $3)",
        )
        .bind(owner_id)
        .bind(&category)
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, SavedLink>(&format!(
            "SELECT {SELECT_COLUMNS} FROM saved_links s
             JOIN parsed_links p ON p.id = s.parsed_link_id
             WHERE s.owner_id = $1
               AND ($2::text IS NULL OR p.category = $2)
               AND ($3::text IS NULL OR s.status = $3)
             ORDER BY s.saved_at DESC, s.id
             LIMIT $4 OFFSET $5"
        ))
        .bind(owner_id)
        .bind(&category)
        .bind(&status)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        update: &SavedLinkUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SavedLink>> {
        self.modify(owner_id, id, |link| update.apply(link, now)).await
    }

    async fn mark_read(
        &self,
        owner_id: &str,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SavedLink>> {
        self.modify(owner_id, id, |link| link.mark_read(now)).await
    }

    async fn toggle_favourite(&self, owner_id: &str, id: Uuid) -> AppResult<Option<SavedLink>> {
        self.modify(owner_id, id, SavedLink::toggle_favourite).await
    }

    async fn delete(&self, owner_id: &str, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM saved_links WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
