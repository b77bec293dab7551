use crate::entities::Category;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Category>>;
}

#[derive(Clone)]
pub struct CategoryRepository {
    pool: Pool<Postgres>,
}

impl CategoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    async fn list_active(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, active, created_at
            FROM categories
            WHERE active = TRUE
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}
