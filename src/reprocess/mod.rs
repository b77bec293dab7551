//! Bulk re-ingestion of historical content into the curation queue.
//!
//! Two entry points: previously published articles are re-wrapped as
//! synthetic scraped items under a virtual source, and previously scraped
//! items can be queued again (or re-opened) for another curation pass.

use crate::entities::{NewCurationRecord, NewScrapedItem};
use crate::repositories::{
    ArticleRepositoryTrait, CurationRepositoryTrait, ItemRepositoryTrait, SourceRepositoryTrait,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Name of the virtual source that owns re-ingested articles.
pub const HISTORICAL_SOURCE_NAME: &str = "Historical Articles";

/// Per-item detail lists are capped to keep responses bounded.
const DETAIL_LIMIT: usize = 10;

const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReprocessType {
    #[default]
    Any,
    Processed,
    Unprocessed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReprocessDetail {
    pub id: Uuid,
    pub title: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ReprocessReport {
    pub total_found: usize,
    pub processed: usize,
    pub duplicates_skipped: usize,
    pub errors: usize,
    pub details: Vec<ReprocessDetail>,
    pub details_truncated: bool,
}

impl ReprocessReport {
    fn detail(&mut self, id: Uuid, title: &str, outcome: &str) {
        if self.details.len() < DETAIL_LIMIT {
            self.details.push(ReprocessDetail {
                id,
                title: title.to_string(),
                outcome: outcome.to_string(),
            });
        } else {
            self.details_truncated = true;
        }
    }
}

/// Re-ingest published articles from a `published_at` window as fresh pending
/// curation candidates, preserving each article's category as the suggestion.
#[instrument(skip_all)]
pub async fn from_articles(
    sources: &dyn SourceRepositoryTrait,
    items: &dyn ItemRepositoryTrait,
    curation: &dyn CurationRepositoryTrait,
    articles: &dyn ArticleRepositoryTrait,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    category_id: Option<Uuid>,
    limit: Option<i64>,
) -> Result<ReprocessReport> {
    let found = articles
        .published_in_range(start, end, category_id, limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    let virtual_source = sources
        .ensure_virtual(HISTORICAL_SOURCE_NAME.to_string())
        .await?;

    let mut report = ReprocessReport {
        total_found: found.len(),
        ..Default::default()
    };

    for article in &found {
        let checksum = format!(
            "{:x}",
            md5::compute(format!("{}{}", article.title, article.content))
        );
        let candidate = NewScrapedItem {
            source_id: virtual_source.id,
            title: article.title.clone(),
            summary: article.summary.clone(),
            content: Some(article.content.clone()),
            original_url: format!("newsdesk://historical/{}", article.id),
            image_url: article.featured_image.clone(),
            author: None,
            published_at: article.published_at.unwrap_or(article.created_at),
            raw_metadata: Some(serde_json::json!({
                "historical": true,
                "article_id": article.id,
                "checksum": checksum,
            })),
        };

        let inserted = match items.insert_if_new(candidate).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                report.duplicates_skipped += 1;
                report.detail(article.id, &article.title, "already re-ingested");
                continue;
            }
            Err(e) => {
                warn!(article = %article.id, error = %e, "failed to re-ingest article");
                report.errors += 1;
                report.detail(article.id, &article.title, "error");
                continue;
            }
        };

        let record = NewCurationRecord {
            item_id: inserted.id,
            suggested_category_id: Some(article.category_id),
            ai_confidence: Some(1.0),
            ai_reasoning: Some(
                "Historical reprocessing pass; original category preserved".to_string(),
            ),
        };
        match curation.create(record).await {
            Ok(_) => {
                report.processed += 1;
                report.detail(article.id, &article.title, "queued");
            }
            Err(e) => {
                warn!(article = %article.id, error = %e, "failed to create curation record");
                report.errors += 1;
                report.detail(article.id, &article.title, "error");
            }
        }
    }

    info!(
        found = report.total_found,
        processed = report.processed,
        duplicates = report.duplicates_skipped,
        errors = report.errors,
        "article reprocessing finished"
    );
    Ok(report)
}

/// Queue previously scraped items for another curation pass. `unprocessed`
/// creates records for items that never got one; `processed` re-opens
/// existing records; `any` does both.
#[instrument(skip_all)]
pub async fn from_source_items(
    items: &dyn ItemRepositoryTrait,
    curation: &dyn CurationRepositoryTrait,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    source_ids: Option<Vec<Uuid>>,
    reprocess_type: ReprocessType,
    limit: Option<i64>,
) -> Result<ReprocessReport> {
    let found = items
        .in_range(start, end, source_ids, limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    let mut report = ReprocessReport {
        total_found: found.len(),
        ..Default::default()
    };

    for item in &found {
        let existing = match curation.get_by_item(item.id).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(item = %item.id, error = %e, "failed to look up curation record");
                report.errors += 1;
                report.detail(item.id, &item.title, "error");
                continue;
            }
        };

        let result = match (existing, reprocess_type) {
            (None, ReprocessType::Unprocessed | ReprocessType::Any) => curation
                .create(NewCurationRecord {
                    item_id: item.id,
                    suggested_category_id: None,
                    ai_confidence: None,
                    ai_reasoning: Some("Queued for reprocessing".to_string()),
                })
                .await
                .map(|_| "queued"),
            (Some(record), ReprocessType::Processed | ReprocessType::Any) => curation
                .reopen(record.id, "Re-opened by reprocessing pass".to_string())
                .await
                .map(|_| "re-opened"),
            _ => {
                report.duplicates_skipped += 1;
                report.detail(item.id, &item.title, "skipped");
                continue;
            }
        };

        match result {
            Ok(outcome) => {
                report.processed += 1;
                report.detail(item.id, &item.title, outcome);
            }
            Err(e) => {
                warn!(item = %item.id, error = %e, "reprocessing failed");
                report.errors += 1;
                report.detail(item.id, &item.title, "error");
            }
        }
    }

    info!(
        found = report.total_found,
        processed = report.processed,
        skipped = report.duplicates_skipped,
        errors = report.errors,
        "source item reprocessing finished"
    );
    Ok(report)
}
