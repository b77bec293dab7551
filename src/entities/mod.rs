use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// --- PostgreSQL Enums ---

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "source_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Html,
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "curation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CurationStatus {
    Pending,
    Approved,
    Rejected,
    Editing,
    Published,
}

impl CurationStatus {
    /// Legal state-machine moves. `rejected` and `published` are terminal.
    pub fn can_transition(self, to: CurationStatus) -> bool {
        use CurationStatus::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Editing)
                | (Editing, Approved)
                | (Editing, Published)
                | (Approved, Published)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CurationStatus::Rejected | CurationStatus::Published)
    }
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "article_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

/// --- Tables ---

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    pub active: bool,
    pub scraping_config: Option<serde_json::Value>,
    pub fetch_interval_secs: i32,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScrapedItem {
    pub id: Uuid,
    pub source_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub original_url: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub raw_metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CurationRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub status: CurationStatus,
    pub suggested_category_id: Option<Uuid>,
    pub ai_confidence: Option<f64>,
    pub ai_reasoning: Option<String>,
    pub manual_category_id: Option<Uuid>,
    pub curator_notes: Option<String>,
    pub curated_title: Option<String>,
    pub curated_summary: Option<String>,
    pub curated_content: Option<String>,
    pub published_article_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub status: ArticleStatus,
    pub featured_image: Option<String>,
    pub reading_time: i32,
    pub views_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// --- Insert payloads ---

#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    pub active: bool,
    pub scraping_config: Option<serde_json::Value>,
    pub fetch_interval_secs: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
    pub scraping_config: Option<serde_json::Value>,
    pub fetch_interval_secs: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewScrapedItem {
    pub source_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub original_url: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub raw_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewCurationRecord {
    pub item_id: Uuid,
    pub suggested_category_id: Option<Uuid>,
    pub ai_confidence: Option<f64>,
    pub ai_reasoning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub status: ArticleStatus,
    pub featured_image: Option<String>,
    pub reading_time: i32,
    pub published_at: Option<DateTime<Utc>>,
}
