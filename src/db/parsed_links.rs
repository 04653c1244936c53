use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{LinkRecord, ParsedLink},
};

/// Persistence for resolved links, keyed loosely by `original_url`.
///
/// Lookups are exact string matches; no canonicalization happens here.
/// There is no uniqueness constraint, so two racing inserts for the same URL
/// both succeed.
#[async_trait]
pub trait ParsedLinkStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> AppResult<Option<ParsedLink>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ParsedLink>>;

    /// Rows for `ids`, in no particular order; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<ParsedLink>>;

    async fn insert(&self, record: LinkRecord) -> AppResult<ParsedLink>;

    /// Liveness check used by `/health`.
    async fn ping(&self) -> AppResult<()>;
}

const SELECT_COLUMNS: &str = "id, original_url, title, description, image_url, author, site_name,
     domain, content_type, category, parsed_at, is_valid_url, error_message";

#[derive(Clone)]
pub struct PgParsedLinkStore {
    pool: PgPool,
}

impl PgParsedLinkStore {
    pub fn new(pool: PgPool) -> Self {
        PgParsedLinkStore { pool }
    }
}

#[async_trait]
impl ParsedLinkStore for PgParsedLinkStore {
    async fn find_by_url(&self, url: &str) -> AppResult<Option<ParsedLink>> {
        let row = sqlx::query_as::<_, ParsedLink>(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM parsed_links WHERE original_url = $1
             ORDER BY parsed_at ASC
             LIMIT 1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ParsedLink>> {
        let row = sqlx::query_as::<_, ParsedLink>(&format!(
            "SELECT {SELECT_COLUMNS} FROM parsed_links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<ParsedLink>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ParsedLink>(&format!(
            "SELECT {SELECT_COLUMNS} FROM parsed_links WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert(&self, record: LinkRecord) -> AppResult<ParsedLink> {
        let row = sqlx::query_as::<_, ParsedLink>(&format!(
            "INSERT INTO parsed_links
                 (id, original_url, title, description, image_url, author, site_name,
                  domain, content_type, category, parsed_at, is_valid_url, error_message)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&record.original_url)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.image_url)
        .bind(&record.author)
        .bind(&record.site_name)
        .bind(&record.domain)
        .bind(record.content_type)
        .bind(record.category)
        .bind(record.parsed_at)
        .bind(record.is_valid_url)
        .bind(&record.error_message)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn ping(&self) -> AppResult<()> {
        super::health_check(&self.pool).await
    }
}
