use crate::entities::{NewSource, Source, SourceKind, SourceUpdate};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const SOURCE_COLUMNS: &str =
    "id, name, url, kind, active, scraping_config, fetch_interval_secs, last_fetched_at, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceRepositoryTrait: Send + Sync {
    async fn list(&self, active_only: bool) -> Result<Vec<Source>>;
    async fn get(&self, id: Uuid) -> Result<Option<Source>>;
    async fn create(&self, source: NewSource) -> Result<Source>;
    async fn update(&self, id: Uuid, update: SourceUpdate) -> Result<Option<Source>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn touch_last_fetched(&self, id: Uuid) -> Result<()>;
    /// Find a source by exact name, creating it inactive if absent. Used for
    /// the synthetic source that owns historically re-ingested articles.
    async fn ensure_virtual(&self, name: String) -> Result<Source>;
}

#[derive(Clone)]
pub struct SourceRepository {
    pool: Pool<Postgres>,
}

impl SourceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepositoryTrait for SourceRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<Source>> {
        let query = format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE ($1 = FALSE OR active = TRUE) ORDER BY created_at"
        );
        let sources = sqlx::query_as::<_, Source>(&query)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(sources)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Source>> {
        let query = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = $1");
        let source = sqlx::query_as::<_, Source>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(source)
    }

    async fn create(&self, source: NewSource) -> Result<Source> {
        let query = format!(
            r#"
            INSERT INTO sources (name, url, kind, active, scraping_config, fetch_interval_secs)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SOURCE_COLUMNS}
            "#
        );
        let source = sqlx::query_as::<_, Source>(&query)
            .bind(source.name)
            .bind(source.url)
            .bind(source.kind)
            .bind(source.active)
            .bind(source.scraping_config)
            .bind(source.fetch_interval_secs)
            .fetch_one(&self.pool)
            .await?;

        Ok(source)
    }

    async fn update(&self, id: Uuid, update: SourceUpdate) -> Result<Option<Source>> {
        let query = format!(
            r#"
            UPDATE sources SET
                name = COALESCE($2, name),
                url = COALESCE($3, url),
                active = COALESCE($4, active),
                scraping_config = COALESCE($5, scraping_config),
                fetch_interval_secs = COALESCE($6, fetch_interval_secs)
            WHERE id = $1
            RETURNING {SOURCE_COLUMNS}
            "#
        );
        let source = sqlx::query_as::<_, Source>(&query)
            .bind(id)
            .bind(update.name)
            .bind(update.url)
            .bind(update.active)
            .bind(update.scraping_config)
            .bind(update.fetch_interval_secs)
            .fetch_optional(&self.pool)
            .await?;

        Ok(source)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_fetched(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET last_fetched_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ensure_virtual(&self, name: String) -> Result<Source> {
        let query = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE name = $1");
        if let Some(existing) = sqlx::query_as::<_, Source>(&query)
            .bind(&name)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(existing);
        }

        let query = format!(
            r#"
            INSERT INTO sources (name, url, kind, active, fetch_interval_secs)
            VALUES ($1, $2, $3, FALSE, 0)
            RETURNING {SOURCE_COLUMNS}
            "#
        );
        let source = sqlx::query_as::<_, Source>(&query)
            .bind(&name)
            .bind("newsdesk://virtual")
            .bind(SourceKind::Html)
            .fetch_one(&self.pool)
            .await?;

        Ok(source)
    }
}
