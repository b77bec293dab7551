//! The curation state machine.
//!
//! `pending → {approved, rejected, editing}`, `editing → {approved,
//! published}`, `approved → published`. Publishing materializes an article;
//! the record only flips to `published` after the article insert succeeds, so
//! a failed insert leaves the record in its prior reviewable state.

pub mod text;

use crate::entities::{
    Article, ArticleStatus, CurationRecord, CurationStatus, NewArticle, ScrapedItem,
};
use crate::repositories::{
    ArticleRepositoryTrait, AuditRepositoryTrait, CategoryRepositoryTrait,
    CurationRepositoryTrait, ItemRepositoryTrait,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CurationError {
    #[error("curation record not found")]
    NotFound,

    #[error("cannot transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: CurationStatus,
        to: CurationStatus,
    },

    #[error("published records cannot be deleted")]
    PublishedImmutable,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Operator-driven transition request.
#[derive(Debug, Clone)]
pub enum CurationAction {
    Approve {
        manual_category_id: Option<Uuid>,
        curator_notes: Option<String>,
    },
    Reject {
        reason: Option<String>,
    },
    Edit {
        title: Option<String>,
        summary: Option<String>,
        content: Option<String>,
        manual_category_id: Option<Uuid>,
    },
    Publish {
        title: Option<String>,
        summary: Option<String>,
        content: Option<String>,
        category_id: Option<Uuid>,
    },
}

#[derive(Debug)]
pub struct ActionOutcome {
    pub record: CurationRecord,
    pub article: Option<Article>,
}

/// Everything a transition needs, threaded through from the handler layer.
pub struct CurationContext<'a> {
    pub curation: &'a dyn CurationRepositoryTrait,
    pub items: &'a dyn ItemRepositoryTrait,
    pub articles: &'a dyn ArticleRepositoryTrait,
    pub categories: &'a dyn CategoryRepositoryTrait,
    pub audit: &'a dyn AuditRepositoryTrait,
    pub author_id: Uuid,
    pub fallback_category: &'a str,
}

impl CurationContext<'_> {
    #[instrument(skip_all, fields(curation_id = %id))]
    pub async fn apply(&self, id: Uuid, action: CurationAction) -> Result<ActionOutcome, CurationError> {
        let record = self.curation.get(id).await?.ok_or(CurationError::NotFound)?;

        match action {
            CurationAction::Approve {
                manual_category_id,
                curator_notes,
            } => {
                self.check_transition(&record, CurationStatus::Approved)?;
                let record = self
                    .curation
                    .set_review(id, CurationStatus::Approved, manual_category_id, curator_notes)
                    .await?
                    .ok_or(CurationError::NotFound)?;
                Ok(ActionOutcome {
                    record,
                    article: None,
                })
            }
            CurationAction::Reject { reason } => {
                self.check_transition(&record, CurationStatus::Rejected)?;
                let record = self
                    .curation
                    .set_review(id, CurationStatus::Rejected, None, reason)
                    .await?
                    .ok_or(CurationError::NotFound)?;
                Ok(ActionOutcome {
                    record,
                    article: None,
                })
            }
            CurationAction::Edit {
                title,
                summary,
                content,
                manual_category_id,
            } => {
                self.check_transition(&record, CurationStatus::Editing)?;
                let record = self
                    .curation
                    .set_editing(id, title, summary, content, manual_category_id)
                    .await?
                    .ok_or(CurationError::NotFound)?;
                Ok(ActionOutcome {
                    record,
                    article: None,
                })
            }
            CurationAction::Publish {
                title,
                summary,
                content,
                category_id,
            } => self.publish(record, title, summary, content, category_id).await,
        }
    }

    /// Materialize an article from the record, preferring request overrides,
    /// then curated overrides, then the original item fields.
    async fn publish(
        &self,
        record: CurationRecord,
        title: Option<String>,
        summary: Option<String>,
        content: Option<String>,
        category_id: Option<Uuid>,
    ) -> Result<ActionOutcome, CurationError> {
        self.check_transition(&record, CurationStatus::Published)?;

        let item = self
            .curation_item(&record)
            .await?;

        let title = title
            .or_else(|| record.curated_title.clone())
            .unwrap_or_else(|| item.title.clone());
        let content = content
            .or_else(|| record.curated_content.clone())
            .or_else(|| item.content.clone())
            .unwrap_or_default();

        if title.trim().is_empty() {
            return Err(CurationError::MissingField("title"));
        }
        if content.trim().is_empty() {
            return Err(CurationError::MissingField("content"));
        }

        let summary = summary
            .or_else(|| record.curated_summary.clone())
            .or_else(|| item.summary.clone());

        let category_id = match category_id
            .or(record.manual_category_id)
            .or(record.suggested_category_id)
        {
            Some(id) => id,
            None => self.fallback_category_id().await?,
        };

        let slug = text::unique_slug(&title);
        let reading_time = text::reading_time_minutes(&content);

        let article = self
            .articles
            .create(NewArticle {
                title,
                slug,
                summary,
                content,
                category_id,
                author_id: self.author_id,
                status: ArticleStatus::Published,
                featured_image: item.image_url.clone(),
                reading_time,
                published_at: Some(Utc::now()),
            })
            .await?;

        // Only now does the record leave the reviewable states.
        let record = self
            .curation
            .mark_published(record.id, article.id)
            .await?
            .ok_or(CurationError::NotFound)?;

        self.audit_best_effort(
            "curation.publish",
            record.id,
            serde_json::json!({"article_id": article.id, "slug": article.slug}),
        )
        .await;

        info!(article_id = %article.id, "curation record published");
        Ok(ActionOutcome {
            record,
            article: Some(article),
        })
    }

    /// Delete a record (never the underlying item). Published records are
    /// immutable.
    #[instrument(skip_all, fields(curation_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), CurationError> {
        let record = self.curation.get(id).await?.ok_or(CurationError::NotFound)?;
        if record.status == CurationStatus::Published {
            return Err(CurationError::PublishedImmutable);
        }

        if !self.curation.delete(id).await? {
            return Err(CurationError::NotFound);
        }

        self.audit_best_effort(
            "curation.delete",
            id,
            serde_json::json!({"item_id": record.item_id, "status": record.status}),
        )
        .await;

        Ok(())
    }

    /// Delete a set of records. The whole request is validated first: one
    /// published member aborts everything before any deletion happens.
    pub async fn bulk_delete(&self, ids: Vec<Uuid>) -> Result<usize, CurationError> {
        let statuses = self.curation.statuses_of(ids.clone()).await?;
        if statuses
            .iter()
            .any(|(_, status)| *status == CurationStatus::Published)
        {
            return Err(CurationError::PublishedImmutable);
        }

        let mut deleted = 0;
        for (id, status) in statuses {
            if self.curation.delete(id).await? {
                deleted += 1;
                self.audit_best_effort(
                    "curation.delete",
                    id,
                    serde_json::json!({"status": status, "bulk": true}),
                )
                .await;
            }
        }
        Ok(deleted)
    }

    fn check_transition(
        &self,
        record: &CurationRecord,
        to: CurationStatus,
    ) -> Result<(), CurationError> {
        if record.status.can_transition(to) {
            Ok(())
        } else {
            Err(CurationError::InvalidTransition {
                from: record.status,
                to,
            })
        }
    }

    async fn curation_item(&self, record: &CurationRecord) -> Result<ScrapedItem, CurationError> {
        self.items
            .get(record.item_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("item {} missing for record {}", record.item_id, record.id).into())
    }

    async fn fallback_category_id(&self) -> Result<Uuid, CurationError> {
        let categories = self.categories.list_active().await?;
        if categories.is_empty() {
            return Err(CurationError::MissingField("category"));
        }
        Ok(crate::classifier::fallback_category(&categories, self.fallback_category).id)
    }

    /// Audit writes are a non-critical side effect: failure is logged, never
    /// surfaced to the operator.
    async fn audit_best_effort(&self, action: &str, entity_id: Uuid, detail: serde_json::Value) {
        if let Err(e) = self
            .audit
            .record(action.to_string(), "curation_record".to_string(), entity_id, Some(detail))
            .await
        {
            warn!(error = %e, action, "audit log write failed");
        }
    }
}
