use crate::fetcher::errors::FetchError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::instrument;
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Markers that indicate a bot-challenge interstitial rather than content.
/// Matched case-insensitively against the response body.
const BLOCK_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "cf_chl_opt",
    "attention required! | cloudflare",
    "checking your browser before accessing",
    "are you a robot",
    "access denied",
    "captcha-delivery.com",
];

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                    .parse()
                    .unwrap(),
            );
            headers.insert(
                reqwest::header::ACCEPT_LANGUAGE,
                "en-US,en;q=0.9".parse().unwrap(),
            );
            headers
        })
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

#[derive(Debug)]
pub struct FetchedPage {
    pub url_final: Url,
    pub status: reqwest::StatusCode,
    pub content_type: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

/// Fetch a feed or page as text.
///
/// Enforces the body-size cap, gates on content type (HTML and XML/feed
/// flavors pass), and refuses bodies that look like a bot-challenge wall with
/// a descriptive [`FetchError::Blocked`] instead of silently returning markup
/// that contains no articles.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_page(url: &str) -> Result<FetchedPage, FetchError> {
    let parsed_url = Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let final_url = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Http { status });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !is_supported_content_type(&content_type) {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Io(e.to_string()))?;

    // Check body size after download (in case Content-Length was missing)
    if body.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body.len() as u64));
    }

    if let Some(marker) = detect_block_marker(&body) {
        return Err(FetchError::Blocked(marker.to_string()));
    }

    Ok(FetchedPage {
        url_final: final_url,
        status,
        content_type,
        body,
        fetched_at: Utc::now(),
    })
}

fn is_supported_content_type(content_type: &str) -> bool {
    const SUPPORTED: &[&str] = &[
        "text/html",
        "application/xhtml",
        "application/rss+xml",
        "application/atom+xml",
        "application/xml",
        "text/xml",
    ];
    SUPPORTED.iter().any(|s| content_type.contains(s))
}

/// Scan the first chunk of the body for bot-challenge markers.
pub fn detect_block_marker(body: &str) -> Option<&'static str> {
    let head: String = body.chars().take(8192).collect::<String>().to_lowercase();
    BLOCK_MARKERS
        .iter()
        .find(|marker| head.contains(&marker.to_lowercase()))
        .copied()
}
