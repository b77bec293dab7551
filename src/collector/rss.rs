//! RSS feed parsing.
//!
//! Deserializes an RSS 2.0 channel with quick-xml and normalizes each entry
//! into a [`CandidateDraft`]. Image discovery walks the usual suspects in
//! order: `media:content` / `media:thumbnail`, an image-typed `enclosure`,
//! and finally the first `<img>` inside the HTML description or content.

use crate::collector::CandidateDraft;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    author: Option<String>,
    #[serde(rename = "dc:creator", alias = "creator", default)]
    creator: Option<String>,
    #[serde(rename = "content:encoded", alias = "encoded", default)]
    content_encoded: Option<String>,
    #[serde(default)]
    enclosure: Option<Enclosure>,
    #[serde(rename = "media:content", default)]
    media_content: Vec<MediaRef>,
    #[serde(rename = "media:thumbnail", alias = "thumbnail", default)]
    media_thumbnail: Option<MediaRef>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaRef {
    #[serde(rename = "@url")]
    url: Option<String>,
}

static IMG_SRC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap());

/// Parse a feed body into candidate drafts. Entries without a title or link
/// are dropped; a missing or unparseable publish date defaults to now.
pub fn parse_feed(xml: &str) -> Result<Vec<CandidateDraft>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let mut drafts = Vec::with_capacity(rss.channel.items.len());
    for item in rss.channel.items {
        let Some(title) = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let Some(link) = item.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) else {
            continue;
        };

        let image_url = discover_image(&item);
        let published_at = item
            .pub_date
            .as_deref()
            .and_then(parse_feed_date)
            .unwrap_or_else(Utc::now);

        let summary = item
            .description
            .as_deref()
            .map(|d| ammonia::clean(d))
            .filter(|s| !s.trim().is_empty());
        let content = item
            .content_encoded
            .as_deref()
            .map(|c| ammonia::clean(c))
            .filter(|c| !c.trim().is_empty());

        drafts.push(CandidateDraft {
            title: title.to_string(),
            summary,
            content,
            link: link.to_string(),
            image_url,
            author: item.author.or(item.creator),
            published_at,
        });
    }

    Ok(drafts)
}

fn discover_image(item: &FeedItem) -> Option<String> {
    if let Some(url) = item.media_content.iter().find_map(|m| m.url.clone()) {
        return Some(url);
    }
    if let Some(url) = item.media_thumbnail.as_ref().and_then(|m| m.url.clone()) {
        return Some(url);
    }
    if let Some(enclosure) = &item.enclosure
        && enclosure
            .kind
            .as_deref()
            .is_some_and(|k| k.starts_with("image/"))
        && let Some(url) = enclosure.url.clone()
    {
        return Some(url);
    }
    for html in [item.description.as_deref(), item.content_encoded.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Some(captures) = IMG_SRC_REGEX.captures(html) {
            return Some(captures[1].to_string());
        }
    }
    None
}

fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Feeds routinely embed HTML entities that are not valid XML entities.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
