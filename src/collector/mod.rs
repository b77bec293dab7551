pub mod html;
pub mod rss;

use crate::entities::{NewScrapedItem, Source, SourceKind};
use crate::fetcher::{self, FetchError};
use crate::repositories::{ItemRepositoryTrait, SourceRepositoryTrait};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Upper bound on candidates taken from a single source per run.
pub const MAX_ITEMS_PER_SOURCE: usize = 20;

/// A normalized candidate article, common to both collection modes.
#[derive(Debug, Clone)]
pub struct CandidateDraft {
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("feed parse error: {0}")]
    Feed(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Per-source result of a collection run.
#[derive(Debug, Clone, Serialize)]
pub struct CollectOutcome {
    pub source_id: Uuid,
    pub source_name: String,
    pub total_found: usize,
    pub collected: usize,
    pub duplicates_skipped: usize,
    pub failed: usize,
    /// True when the politeness window suppressed the fetch.
    pub skipped: bool,
    pub error: Option<String>,
}

impl CollectOutcome {
    fn empty(source: &Source) -> Self {
        Self {
            source_id: source.id,
            source_name: source.name.clone(),
            total_found: 0,
            collected: 0,
            duplicates_skipped: 0,
            failed: 0,
            skipped: false,
            error: None,
        }
    }
}

/// Politeness window: a source is not refetched before
/// `last_fetched_at + fetch_interval_secs` unless the caller forces it.
pub fn should_skip(source: &Source, now: DateTime<Utc>, force: bool) -> bool {
    if force {
        return false;
    }
    match source.last_fetched_at {
        Some(last) if source.fetch_interval_secs > 0 => {
            last + Duration::seconds(i64::from(source.fetch_interval_secs)) > now
        }
        _ => false,
    }
}

/// Collect one source. Failures are folded into the outcome rather than
/// propagated so that a batch run over many sources is never aborted by one
/// bad feed.
#[instrument(skip_all, fields(source = %source.name, kind = ?source.kind))]
pub async fn collect_source(
    sources: &dyn SourceRepositoryTrait,
    items: &dyn ItemRepositoryTrait,
    source: &Source,
    force: bool,
) -> CollectOutcome {
    let mut outcome = CollectOutcome::empty(source);

    if should_skip(source, Utc::now(), force) {
        info!("within politeness window, skipping");
        outcome.skipped = true;
        return outcome;
    }

    let drafts = match gather(source).await {
        Ok(drafts) => drafts,
        Err(e) => {
            warn!(error = %e, "collection failed");
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    outcome.total_found = drafts.len();
    let (collected, duplicates, failed) = persist_drafts(items, source, drafts).await;
    outcome.collected = collected;
    outcome.duplicates_skipped = duplicates;
    outcome.failed = failed;

    if let Err(e) = sources.touch_last_fetched(source.id).await {
        warn!(error = %e, "failed to update last_fetched_at");
    }

    info!(
        found = outcome.total_found,
        collected = outcome.collected,
        duplicates = outcome.duplicates_skipped,
        "collection finished"
    );
    outcome
}

/// Collect every active source in registry order. One source failing never
/// stops the others; its outcome carries the error string instead.
pub async fn collect_all(
    sources: &dyn SourceRepositoryTrait,
    items: &dyn ItemRepositoryTrait,
    force: bool,
) -> Vec<CollectOutcome> {
    let active = match sources.list(true).await {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "failed to list sources");
            return Vec::new();
        }
    };

    let mut outcomes = Vec::with_capacity(active.len());
    for source in &active {
        outcomes.push(collect_source(sources, items, source, force).await);
    }
    outcomes
}

async fn gather(source: &Source) -> Result<Vec<CandidateDraft>, CollectError> {
    let page = fetcher::fetch_page(&source.url).await?;
    match source.kind {
        SourceKind::Rss => {
            let mut drafts =
                rss::parse_feed(&page.body).map_err(|e| CollectError::Feed(e.to_string()))?;
            drafts.truncate(MAX_ITEMS_PER_SOURCE);
            Ok(drafts)
        }
        SourceKind::Html => {
            let selectors = html::ScrapeSelectors::from_config(source.scraping_config.as_ref());
            Ok(html::extract_candidates(
                &page.body,
                &page.url_final,
                &selectors,
                MAX_ITEMS_PER_SOURCE,
            ))
        }
    }
}

/// Write drafts through the insert-or-ignore path, counting saves and
/// duplicates. Per-item storage failures are logged and counted, never fatal.
pub async fn persist_drafts(
    items: &dyn ItemRepositoryTrait,
    source: &Source,
    drafts: Vec<CandidateDraft>,
) -> (usize, usize, usize) {
    let mut collected = 0;
    let mut duplicates = 0;
    let mut failed = 0;

    for draft in drafts {
        let new_item = NewScrapedItem {
            source_id: source.id,
            title: draft.title,
            summary: draft.summary,
            content: draft.content,
            original_url: draft.link,
            image_url: draft.image_url,
            author: draft.author,
            published_at: draft.published_at,
            raw_metadata: None,
        };
        match items.insert_if_new(new_item).await {
            Ok(Some(_)) => collected += 1,
            Ok(None) => duplicates += 1,
            Err(e) => {
                warn!(error = %e, "failed to store candidate");
                failed += 1;
            }
        }
    }

    (collected, duplicates, failed)
}
