use crate::entities::{Article, NewArticle};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const ARTICLE_COLUMNS: &str = "id, title, slug, summary, content, category_id, author_id, \
     status, featured_image, reading_time, views_count, published_at, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepositoryTrait: Send + Sync {
    async fn create(&self, article: NewArticle) -> Result<Article>;
    /// Published articles in a `published_at` window, newest first.
    async fn published_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Article>>;
}

#[derive(Clone)]
pub struct ArticleRepository {
    pool: Pool<Postgres>,
}

impl ArticleRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepositoryTrait for ArticleRepository {
    async fn create(&self, article: NewArticle) -> Result<Article> {
        let query = format!(
            r#"
            INSERT INTO articles
                (title, slug, summary, content, category_id, author_id, status,
                 featured_image, reading_time, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ARTICLE_COLUMNS}
            "#
        );
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(article.title)
            .bind(article.slug)
            .bind(article.summary)
            .bind(article.content)
            .bind(article.category_id)
            .bind(article.author_id)
            .bind(article.status)
            .bind(article.featured_image)
            .bind(article.reading_time)
            .bind(article.published_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(article)
    }

    async fn published_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Article>> {
        let query = format!(
            r#"
            SELECT {ARTICLE_COLUMNS} FROM articles
            WHERE status = 'published'
              AND published_at >= $1 AND published_at <= $2
              AND ($3::uuid IS NULL OR category_id = $3)
            ORDER BY published_at DESC
            LIMIT $4
            "#
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(start)
            .bind(end)
            .bind(category_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(articles)
    }
}
