use crate::entities::{CurationRecord, CurationStatus, NewCurationRecord};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, item_id, status, suggested_category_id, ai_confidence, \
     ai_reasoning, manual_category_id, curator_notes, curated_title, curated_summary, \
     curated_content, published_article_id, created_at, updated_at";

/// Queue listing row: the record joined with the item it wraps.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CurationQueueRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub status: CurationStatus,
    pub suggested_category_id: Option<Uuid>,
    pub ai_confidence: Option<f64>,
    pub manual_category_id: Option<Uuid>,
    pub curated_title: Option<String>,
    pub published_article_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub item_title: String,
    pub item_url: String,
    pub source_name: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CurationRepositoryTrait: Send + Sync {
    async fn create(&self, record: NewCurationRecord) -> Result<CurationRecord>;
    async fn get(&self, id: Uuid) -> Result<Option<CurationRecord>>;
    async fn get_by_item(&self, item_id: Uuid) -> Result<Option<CurationRecord>>;
    async fn list(
        &self,
        status: Option<CurationStatus>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<CurationQueueRow>, i64)>;
    /// Approve/reject style update: flips status and stores the reviewer's
    /// category override and notes.
    async fn set_review(
        &self,
        id: Uuid,
        status: CurationStatus,
        manual_category_id: Option<Uuid>,
        curator_notes: Option<String>,
    ) -> Result<Option<CurationRecord>>;
    /// Stores curator-supplied overrides and moves the record to `editing`.
    async fn set_editing(
        &self,
        id: Uuid,
        curated_title: Option<String>,
        curated_summary: Option<String>,
        curated_content: Option<String>,
        manual_category_id: Option<Uuid>,
    ) -> Result<Option<CurationRecord>>;
    async fn mark_published(&self, id: Uuid, article_id: Uuid) -> Result<Option<CurationRecord>>;
    /// Re-open a record for another curation pass.
    async fn reopen(&self, id: Uuid, reasoning: String) -> Result<Option<CurationRecord>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn statuses_of(&self, ids: Vec<Uuid>) -> Result<Vec<(Uuid, CurationStatus)>>;
    async fn status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(CurationStatus, i64)>>;
}

#[derive(Clone)]
pub struct CurationRepository {
    pool: Pool<Postgres>,
}

impl CurationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CurationRepositoryTrait for CurationRepository {
    async fn create(&self, record: NewCurationRecord) -> Result<CurationRecord> {
        let query = format!(
            r#"
            INSERT INTO curation_records (item_id, suggested_category_id, ai_confidence, ai_reasoning)
            VALUES ($1, $2, $3, $4)
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(record.item_id)
            .bind(record.suggested_category_id)
            .bind(record.ai_confidence)
            .bind(record.ai_reasoning)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CurationRecord>> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM curation_records WHERE id = $1");
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn get_by_item(&self, item_id: Uuid) -> Result<Option<CurationRecord>> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM curation_records WHERE item_id = $1");
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list(
        &self,
        status: Option<CurationStatus>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<CurationQueueRow>, i64)> {
        let offset = (page.max(1) - 1) * limit;

        let rows = sqlx::query_as::<_, CurationQueueRow>(
            r#"
            SELECT c.id, c.item_id, c.status, c.suggested_category_id, c.ai_confidence,
                   c.manual_category_id, c.curated_title, c.published_article_id, c.created_at,
                   i.title AS item_title, i.original_url AS item_url, s.name AS source_name
            FROM curation_records c
            JOIN scraped_items i ON i.id = c.item_id
            JOIN sources s ON s.id = i.source_id
            WHERE $1::curation_status IS NULL OR c.status = $1
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM curation_records WHERE $1::curation_status IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn set_review(
        &self,
        id: Uuid,
        status: CurationStatus,
        manual_category_id: Option<Uuid>,
        curator_notes: Option<String>,
    ) -> Result<Option<CurationRecord>> {
        let query = format!(
            r#"
            UPDATE curation_records SET
                status = $2,
                manual_category_id = COALESCE($3, manual_category_id),
                curator_notes = COALESCE($4, curator_notes),
                updated_at = now()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(id)
            .bind(status)
            .bind(manual_category_id)
            .bind(curator_notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn set_editing(
        &self,
        id: Uuid,
        curated_title: Option<String>,
        curated_summary: Option<String>,
        curated_content: Option<String>,
        manual_category_id: Option<Uuid>,
    ) -> Result<Option<CurationRecord>> {
        let query = format!(
            r#"
            UPDATE curation_records SET
                status = $2,
                curated_title = COALESCE($3, curated_title),
                curated_summary = COALESCE($4, curated_summary),
                curated_content = COALESCE($5, curated_content),
                manual_category_id = COALESCE($6, manual_category_id),
                updated_at = now()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(id)
            .bind(CurationStatus::Editing)
            .bind(curated_title)
            .bind(curated_summary)
            .bind(curated_content)
            .bind(manual_category_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn mark_published(&self, id: Uuid, article_id: Uuid) -> Result<Option<CurationRecord>> {
        let query = format!(
            r#"
            UPDATE curation_records SET
                status = $2,
                published_article_id = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(id)
            .bind(CurationStatus::Published)
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn reopen(&self, id: Uuid, reasoning: String) -> Result<Option<CurationRecord>> {
        let query = format!(
            r#"
            UPDATE curation_records SET
                status = $2,
                ai_reasoning = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(id)
            .bind(CurationStatus::Pending)
            .bind(reasoning)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM curation_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn statuses_of(&self, ids: Vec<Uuid>) -> Result<Vec<(Uuid, CurationStatus)>> {
        let rows = sqlx::query_as::<_, (Uuid, CurationStatus)>(
            "SELECT id, status FROM curation_records WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(CurationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (CurationStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM curation_records
            WHERE $1::timestamptz IS NULL OR created_at >= $1
            GROUP BY status
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
