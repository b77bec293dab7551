use crate::collector::CollectOutcome;
use crate::curation::CurationAction;
use crate::entities::{
    Article, Category, CurationRecord, CurationStatus, ScrapedItem, SourceKind,
};
use crate::reprocess::ReprocessType;
use crate::repositories::CurationQueueRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// --- Collection ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectRequest {
    pub source_id: Option<Uuid>,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub total_found: usize,
    pub collected: usize,
    pub duplicates_skipped: usize,
    pub outcomes: Vec<CollectOutcome>,
}

impl CollectResponse {
    pub fn from_outcomes(outcomes: Vec<CollectOutcome>) -> Self {
        Self {
            total_found: outcomes.iter().map(|o| o.total_found).sum(),
            collected: outcomes.iter().map(|o| o.collected).sum(),
            duplicates_skipped: outcomes.iter().map(|o| o.duplicates_skipped).sum(),
            outcomes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub timeframe: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub timeframe: String,
    pub sources_total: usize,
    pub sources_active: usize,
    pub items_collected: i64,
    pub status_counts: HashMap<CurationStatus, i64>,
}

/// --- Classification ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassifyRequest {
    pub news_id: Option<Uuid>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyInfoResponse {
    pub unclassified_count: i64,
    pub categories: Vec<Category>,
}

/// --- Curation ---

#[derive(Debug, Deserialize)]
pub struct CurationListQuery {
    pub status: Option<CurationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CurationListResponse {
    pub records: Vec<CurationQueueRow>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CurationVerb {
    Approve,
    Reject,
    Edit,
    Publish,
}

/// Single flat payload shared by every verb; each verb reads the fields it
/// cares about.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CurationActionData {
    pub manual_category_id: Option<Uuid>,
    pub curator_notes: Option<String>,
    pub reason: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Uuid>,
}

impl CurationActionData {
    pub fn into_action(self, verb: CurationVerb) -> CurationAction {
        match verb {
            CurationVerb::Approve => CurationAction::Approve {
                manual_category_id: self.manual_category_id,
                curator_notes: self.curator_notes,
            },
            CurationVerb::Reject => CurationAction::Reject {
                reason: self.reason.or(self.curator_notes),
            },
            CurationVerb::Edit => CurationAction::Edit {
                title: self.title,
                summary: self.summary,
                content: self.content,
                manual_category_id: self.manual_category_id,
            },
            CurationVerb::Publish => CurationAction::Publish {
                title: self.title,
                summary: self.summary,
                content: self.content,
                category_id: self.category_id.or(self.manual_category_id),
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CurationActionRequest {
    pub action: CurationVerb,
    pub curation_id: Uuid,
    #[serde(default)]
    pub data: CurationActionData,
}

/// Body for `PUT /curation/{id}` where the id travels in the path.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CurationTransitionRequest {
    pub action: CurationVerb,
    #[serde(default)]
    pub data: CurationActionData,
}

#[derive(Debug, Serialize)]
pub struct CurationActionResponse {
    pub record: CurationRecord,
    pub article: Option<Article>,
}

#[derive(Debug, Serialize)]
pub struct CurationDetailResponse {
    pub record: CurationRecord,
    pub item: ScrapedItem,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}

/// --- Historical reprocessing ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoricalRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SourcesHistoricalRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub source_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub reprocess_type: ReprocessType,
    pub limit: Option<i64>,
}

/// --- Source registry ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSourceRequest {
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    #[serde(default = "default_active")]
    pub active: bool,
    pub scraping_config: Option<serde_json::Value>,
    pub fetch_interval_secs: Option<i32>,
}

fn default_active() -> bool {
    true
}

impl CreateSourceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Source name must not be empty".to_string());
        }
        validate_source_url(&self.url)?;
        if self.fetch_interval_secs.is_some_and(|secs| secs < 0) {
            return Err("Fetch interval must not be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSourceRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
    pub scraping_config: Option<serde_json::Value>,
    pub fetch_interval_secs: Option<i32>,
}

impl UpdateSourceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("Source name must not be empty".to_string());
        }
        if let Some(url) = &self.url {
            validate_source_url(url)?;
        }
        if self.fetch_interval_secs.is_some_and(|secs| secs < 0) {
            return Err("Fetch interval must not be negative".to_string());
        }
        Ok(())
    }
}

fn validate_source_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid source URL: {e}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err("Source URL must use http or https".to_string());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DeleteSourceResponse {
    /// True when the row was actually removed.
    pub deleted: bool,
    /// True when the source still owns items and was deactivated instead.
    pub deactivated: bool,
}
