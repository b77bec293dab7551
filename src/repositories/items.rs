use crate::entities::{NewScrapedItem, ScrapedItem};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const ITEM_COLUMNS: &str = "id, source_id, title, summary, content, original_url, image_url, \
     author, published_at, raw_metadata, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepositoryTrait: Send + Sync {
    /// Insert-or-ignore keyed on `(source_id, original_url)`. Returns `None`
    /// when the item already exists; the unique constraint is the authority,
    /// so concurrent collectors cannot double-insert.
    async fn insert_if_new(&self, item: NewScrapedItem) -> Result<Option<ScrapedItem>>;
    async fn get(&self, id: Uuid) -> Result<Option<ScrapedItem>>;
    /// Items that have no curation record yet, oldest first.
    async fn unclassified(&self, limit: i64) -> Result<Vec<ScrapedItem>>;
    async fn unclassified_count(&self) -> Result<i64>;
    async fn count_for_source(&self, source_id: Uuid) -> Result<i64>;
    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source_ids: Option<Vec<Uuid>>,
        limit: i64,
    ) -> Result<Vec<ScrapedItem>>;
    async fn count_since(&self, since: Option<DateTime<Utc>>) -> Result<i64>;
}

#[derive(Clone)]
pub struct ItemRepository {
    pool: Pool<Postgres>,
}

impl ItemRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepositoryTrait for ItemRepository {
    async fn insert_if_new(&self, item: NewScrapedItem) -> Result<Option<ScrapedItem>> {
        let query = format!(
            r#"
            INSERT INTO scraped_items
                (source_id, title, summary, content, original_url, image_url, author, published_at, raw_metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_id, original_url) DO NOTHING
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, ScrapedItem>(&query)
            .bind(item.source_id)
            .bind(item.title)
            .bind(item.summary)
            .bind(item.content)
            .bind(item.original_url)
            .bind(item.image_url)
            .bind(item.author)
            .bind(item.published_at)
            .bind(item.raw_metadata)
            .fetch_optional(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ScrapedItem>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM scraped_items WHERE id = $1");
        let item = sqlx::query_as::<_, ScrapedItem>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    async fn unclassified(&self, limit: i64) -> Result<Vec<ScrapedItem>> {
        let items = sqlx::query_as::<_, ScrapedItem>(
            r#"
            SELECT i.id, i.source_id, i.title, i.summary, i.content, i.original_url,
                   i.image_url, i.author, i.published_at, i.raw_metadata, i.created_at
            FROM scraped_items i
            LEFT JOIN curation_records c ON c.item_id = i.id
            WHERE c.id IS NULL
            ORDER BY i.created_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn unclassified_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM scraped_items i
            LEFT JOIN curation_records c ON c.item_id = i.id
            WHERE c.id IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_for_source(&self, source_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM scraped_items WHERE source_id = $1",
        )
        .bind(source_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source_ids: Option<Vec<Uuid>>,
        limit: i64,
    ) -> Result<Vec<ScrapedItem>> {
        let query = format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM scraped_items
            WHERE created_at >= $1 AND created_at <= $2
              AND ($3::uuid[] IS NULL OR source_id = ANY($3))
            ORDER BY created_at DESC
            LIMIT $4
            "#
        );
        let items = sqlx::query_as::<_, ScrapedItem>(&query)
            .bind(start)
            .bind(end)
            .bind(source_ids)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn count_since(&self, since: Option<DateTime<Utc>>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM scraped_items WHERE $1::timestamptz IS NULL OR created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
