//! LLM-backed category classification.
//!
//! Every processed item ends with exactly one pending curation record. When
//! the model cannot be trusted (transport failure, malformed JSON, a category
//! name we do not know) the item falls back to the configured default
//! category at a fixed low confidence instead of being dropped.

pub mod client;

pub use client::{ChatApi, ChatClient};

use crate::entities::{Category, NewCurationRecord, ScrapedItem};
use crate::repositories::{CategoryRepositoryTrait, CurationRepositoryTrait, ItemRepositoryTrait};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Confidence recorded when classification falls back to the default category.
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

const CONTENT_PROMPT_LIMIT: usize = 1500;

/// The strict JSON shape requested from the model.
#[derive(Debug, Deserialize)]
pub struct RawVerdict {
    pub category_name: String,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// A resolved classification for one item.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub category_id: Uuid,
    pub category_name: String,
    pub confidence: f64,
    pub reasoning: String,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub item_id: Uuid,
    pub title: String,
    pub category_name: String,
    pub confidence: f64,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ClassifyReport {
    pub processed: usize,
    pub fallbacks: usize,
    pub skipped: usize,
    pub errors: usize,
    pub outcomes: Vec<ItemOutcome>,
}

#[derive(Debug, Clone, Copy)]
pub enum ClassifyTarget {
    Single(Uuid),
    Batch(usize),
}

/// Classify a target set of unclassified items, creating one pending curation
/// record per item, with a fixed delay between completion calls.
#[instrument(skip_all)]
pub async fn run(
    chat: &dyn ChatApi,
    items: &dyn ItemRepositoryTrait,
    curation: &dyn CurationRepositoryTrait,
    categories: &dyn CategoryRepositoryTrait,
    fallback_name: &str,
    delay: Duration,
    target: ClassifyTarget,
) -> Result<ClassifyReport> {
    let categories = categories.list_active().await?;
    if categories.is_empty() {
        bail!("no active categories to classify into");
    }
    let fallback = fallback_category(&categories, fallback_name);

    let batch = match target {
        ClassifyTarget::Single(id) => {
            let Some(item) = items.get(id).await? else {
                bail!("item {} not found", id);
            };
            vec![item]
        }
        ClassifyTarget::Batch(size) => items.unclassified(size as i64).await?,
    };

    let mut report = ClassifyReport::default();
    for (idx, item) in batch.iter().enumerate() {
        if idx > 0 {
            // Fixed-rate throttle between completion calls.
            tokio::time::sleep(delay).await;
        }

        if curation.get_by_item(item.id).await?.is_some() {
            report.skipped += 1;
            continue;
        }

        let verdict = classify_item(chat, &categories, fallback, item).await;
        if verdict.used_fallback {
            report.fallbacks += 1;
        }

        let record = NewCurationRecord {
            item_id: item.id,
            suggested_category_id: Some(verdict.category_id),
            ai_confidence: Some(verdict.confidence),
            ai_reasoning: Some(verdict.reasoning.clone()),
        };
        match curation.create(record).await {
            Ok(_) => {
                report.processed += 1;
                report.outcomes.push(ItemOutcome {
                    item_id: item.id,
                    title: item.title.clone(),
                    category_name: verdict.category_name,
                    confidence: verdict.confidence,
                    used_fallback: verdict.used_fallback,
                });
            }
            Err(e) => {
                warn!(item = %item.id, error = %e, "failed to store curation record");
                report.errors += 1;
            }
        }
    }

    info!(
        processed = report.processed,
        fallbacks = report.fallbacks,
        skipped = report.skipped,
        "classification run finished"
    );
    Ok(report)
}

/// Classify one item. Infallible by construction: every failure mode resolves
/// to the fallback category with [`FALLBACK_CONFIDENCE`].
pub async fn classify_item(
    chat: &dyn ChatApi,
    categories: &[Category],
    fallback: &Category,
    item: &ScrapedItem,
) -> Verdict {
    let (system, user) = build_prompt(item, categories);

    let raw = match chat.complete(system, user).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(item = %item.id, error = %e, "completion call failed");
            return fallback_verdict(fallback, format!("completion call failed: {e}"));
        }
    };

    let Some(parsed) = parse_verdict(&raw) else {
        warn!(item = %item.id, "model returned malformed verdict");
        return fallback_verdict(fallback, "model returned malformed JSON".to_string());
    };

    match match_category(categories, &parsed.category_name) {
        Some(category) => Verdict {
            category_id: category.id,
            category_name: category.name.clone(),
            confidence: parsed.confidence.clamp(0.0, 1.0),
            reasoning: parsed.reasoning.unwrap_or_default(),
            used_fallback: false,
        },
        None => fallback_verdict(
            fallback,
            format!("model suggested unknown category '{}'", parsed.category_name),
        ),
    }
}

fn fallback_verdict(fallback: &Category, reasoning: String) -> Verdict {
    Verdict {
        category_id: fallback.id,
        category_name: fallback.name.clone(),
        confidence: FALLBACK_CONFIDENCE,
        reasoning,
        used_fallback: true,
    }
}

/// The configured fallback by name, else the first active category.
pub fn fallback_category<'a>(categories: &'a [Category], configured: &str) -> &'a Category {
    match_category(categories, configured).unwrap_or(&categories[0])
}

fn match_category<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    let needle = name.trim();
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(needle))
}

fn build_prompt(item: &ScrapedItem, categories: &[Category]) -> (String, String) {
    let system = "You are a news desk assistant that assigns exactly one category to an \
                  article. Respond with strict JSON only, no prose and no markdown: \
                  {\"category_name\": \"<one of the listed categories>\", \
                  \"confidence\": <number between 0 and 1>, \
                  \"reasoning\": \"<one short sentence>\"}"
        .to_string();

    let mut category_listing = String::new();
    for category in categories {
        category_listing.push_str("- ");
        category_listing.push_str(&category.name);
        if let Some(description) = &category.description {
            category_listing.push_str(": ");
            category_listing.push_str(description);
        }
        category_listing.push('\n');
    }

    let content: String = item
        .content
        .as_deref()
        .or(item.summary.as_deref())
        .unwrap_or_default()
        .chars()
        .take(CONTENT_PROMPT_LIMIT)
        .collect();

    let user = format!(
        "Categories:\n{category_listing}\nArticle title: {}\nArticle summary: {}\nArticle text:\n{}",
        item.title,
        item.summary.as_deref().unwrap_or("(none)"),
        content,
    );

    (system, user)
}

/// Parse the model's reply into a [`RawVerdict`], tolerating markdown code
/// fences and surrounding chatter but nothing structurally wrong.
pub fn parse_verdict(raw: &str) -> Option<RawVerdict> {
    let trimmed = raw.trim();

    if let Ok(verdict) = serde_json::from_str(trimmed) {
        return Some(verdict);
    }

    // Models love fences; take the region between the outermost braces.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}
