use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepositoryTrait: Send + Sync {
    /// Record an audit entry. Callers treat this as a non-critical side
    /// effect: a failure here is logged and never propagated.
    async fn record(
        &self,
        action: String,
        entity: String,
        entity_id: Uuid,
        detail: Option<serde_json::Value>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepositoryTrait for AuditRepository {
    async fn record(
        &self,
        action: String,
        entity: String,
        entity_id: Uuid,
        detail: Option<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO audit_log (action, entity, entity_id, detail) VALUES ($1, $2, $3, $4)",
        )
        .bind(action)
        .bind(entity)
        .bind(entity_id)
        .bind(detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
