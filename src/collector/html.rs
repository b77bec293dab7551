//! Selector-driven HTML scraping.
//!
//! Applies a configurable CSS selector set (with generic defaults) to find
//! repeated article blocks on a listing page, extracting a title, an absolute
//! link, a summary, and an image from each block.

use crate::collector::CandidateDraft;
use chrono::Utc;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::warn;
use url::Url;

const DEFAULT_BLOCK: &str = "article, .article-item, .news-item, .post, .card";
const DEFAULT_TITLE: &str = "h1 a, h2 a, h3 a, a[href]";
const DEFAULT_SUMMARY: &str = "p, .summary, .excerpt";
const DEFAULT_IMAGE: &str = "img";

/// CSS selectors used to carve a listing page into candidates. Sources can
/// override any of them through their `scraping_config` JSON.
#[derive(Debug, Clone)]
pub struct ScrapeSelectors {
    pub block: String,
    pub title: String,
    pub summary: String,
    pub image: String,
}

impl Default for ScrapeSelectors {
    fn default() -> Self {
        Self {
            block: DEFAULT_BLOCK.to_string(),
            title: DEFAULT_TITLE.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
            image: DEFAULT_IMAGE.to_string(),
        }
    }
}

impl ScrapeSelectors {
    pub fn from_config(config: Option<&serde_json::Value>) -> Self {
        let mut selectors = Self::default();
        let Some(config) = config else {
            return selectors;
        };
        if let Some(block) = config.get("block").and_then(|v| v.as_str()) {
            selectors.block = block.to_string();
        }
        if let Some(title) = config.get("title").and_then(|v| v.as_str()) {
            selectors.title = title.to_string();
        }
        if let Some(summary) = config.get("summary").and_then(|v| v.as_str()) {
            selectors.summary = summary.to_string();
        }
        if let Some(image) = config.get("image").and_then(|v| v.as_str()) {
            selectors.image = image.to_string();
        }
        selectors
    }
}

/// Parse a selector string, falling back to a known-good default when the
/// configured value does not parse.
fn parse_selector(raw: &str, default: &str) -> Selector {
    Selector::parse(raw).unwrap_or_else(|_| {
        warn!(selector = raw, "invalid css selector, using default");
        Selector::parse(default).expect("default selector parses")
    })
}

/// Extract up to `max` candidates from a listing page. Blocks without a
/// non-empty title and resolvable link are skipped; links are deduplicated
/// within the page.
pub fn extract_candidates(
    body: &str,
    base_url: &Url,
    selectors: &ScrapeSelectors,
    max: usize,
) -> Vec<CandidateDraft> {
    let document = Html::parse_document(body);

    let block_sel = parse_selector(&selectors.block, DEFAULT_BLOCK);
    let title_sel = parse_selector(&selectors.title, DEFAULT_TITLE);
    let summary_sel = parse_selector(&selectors.summary, DEFAULT_SUMMARY);
    let image_sel = parse_selector(&selectors.image, DEFAULT_IMAGE);

    let mut seen_links = HashSet::new();
    let mut drafts = Vec::new();

    for block in document.select(&block_sel) {
        if drafts.len() >= max {
            break;
        }

        let Some(anchor) = block.select(&title_sel).find(|el| {
            el.value().attr("href").is_some() && !element_text(el).is_empty()
        }) else {
            continue;
        };

        let title = element_text(&anchor);
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| base_url.join(href).ok())
        else {
            continue;
        };
        let link = link.to_string();
        if !seen_links.insert(link.clone()) {
            continue;
        }

        let summary = block
            .select(&summary_sel)
            .map(|el| element_text(&el))
            .find(|text| !text.is_empty());

        let image_url = block
            .select(&image_sel)
            .find_map(|el| el.value().attr("src"))
            .and_then(|src| base_url.join(src).ok())
            .map(|u| u.to_string());

        drafts.push(CandidateDraft {
            title,
            summary,
            content: None,
            link,
            image_url,
            author: None,
            published_at: Utc::now(),
        });
    }

    drafts
}

fn element_text(element: &scraper::ElementRef<'_>) -> String {
    let text: Vec<_> = element.text().map(str::trim).filter(|t| !t.is_empty()).collect();
    text.join(" ")
}
