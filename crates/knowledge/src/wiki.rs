//! External knowledge lookup against the Wikipedia REST search API.
//!
//! API: https://api.wikimedia.org/wiki/Core_REST_API/Reference/Search/Search_content

use crate::types::ExternalResult;
use async_trait::async_trait;
use localai_core::{AppError, AppResult};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_WIKI_API_URL: &str = "https://en.wikipedia.org/w/rest.php/v1";

const DEFAULT_RESULT_LIMIT: usize = 3;

/// Wikimedia asks API clients to identify themselves.
const USER_AGENT: &str = concat!("localai/", env!("CARGO_PKG_VERSION"));

/// Encyclopedic search used to supplement document evidence.
#[async_trait]
pub trait ExternalKnowledge: Send + Sync {
    /// Name used in logs.
    fn source_name(&self) -> &str;

    /// Search for `text`, best match first.
    async fn search(&self, text: &str) -> AppResult<Vec<ExternalResult>>;
}

/// `/search/page` response format.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    key: String,
    title: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Wikipedia search client.
pub struct WikipediaClient {
    /// REST API root, e.g. `https://en.wikipedia.org/w/rest.php/v1`
    base_url: String,

    /// Maximum pages requested per search
    limit: usize,

    client: reqwest::Client,
}

impl WikipediaClient {
    /// Client for English Wikipedia.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_WIKI_API_URL)
    }

    /// Client for a custom REST API root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, DEFAULT_RESULT_LIMIT, Duration::from_secs(10))
    }

    /// Client with explicit result limit and request timeout.
    pub fn with_options(base_url: impl Into<String>, limit: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit: limit.max(1),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalKnowledge for WikipediaClient {
    fn source_name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, text: &str) -> AppResult<Vec<ExternalResult>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/search/page", self.base_url);
        let limit = self.limit.to_string();
        tracing::debug!("Wikipedia search: {} (q={:?}, limit={})", url, text, self.limit);

        let response = self
            .client
            .get(&url)
            .query(&[("q", text), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to reach Wikipedia: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Knowledge(format!(
                "Wikipedia search failed (HTTP {}): {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Wikipedia response: {}", e)))?;

        let results = convert_pages(body.pages, &site_origin(&self.base_url));
        tracing::debug!("Wikipedia returned {} pages", results.len());
        Ok(results)
    }
}

/// Scheme and host of the API root; page links live under `/wiki/`.
fn site_origin(base_url: &str) -> String {
    Url::parse(base_url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| "https://en.wikipedia.org".to_string())
}

fn convert_pages(pages: Vec<SearchPage>, origin: &str) -> Vec<ExternalResult> {
    let total = pages.len();
    pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| ExternalResult {
            url: page_url(origin, &page.key),
            extract: strip_markup(page.excerpt.as_deref().unwrap_or_default()),
            description: page.description.filter(|d| !d.trim().is_empty()),
            thumbnail: page.thumbnail.map(|t| absolute_url(&t.url)),
            relevance_score: Some(1.0 - i as f32 / total as f32),
            title: page.title,
        })
        .collect()
}

fn page_url(origin: &str, key: &str) -> String {
    match Url::parse(origin) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.clear().push("wiki").push(key);
            }
            url.to_string()
        }
        Err(_) => format!("{}/wiki/{}", origin, key),
    }
}

/// Thumbnails come back protocol-relative (`//upload.wikimedia.org/...`).
fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Remove search-highlight tags and decode the common HTML entities.
fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "pages": [
            {
                "id": 22989,
                "key": "Paris",
                "title": "Paris",
                "excerpt": "<span class=\"searchmatch\">Paris</span> is the capital and largest city of France",
                "matched_title": null,
                "description": "Capital city of France",
                "thumbnail": {
                    "mimetype": "image/jpeg",
                    "width": 60,
                    "height": 40,
                    "url": "//upload.wikimedia.org/wikipedia/commons/thumb/paris.jpg"
                }
            },
            {
                "id": 5843419,
                "key": "France",
                "title": "France",
                "excerpt": "<span class=\"searchmatch\">capital</span> &amp; largest city is Paris",
                "description": null,
                "thumbnail": null
            }
        ]
    }"#;

    #[test]
    fn test_convert_sample_response() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let results = convert_pages(response.pages, "https://en.wikipedia.org");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Paris");
        assert_eq!(
            results[0].extract,
            "Paris is the capital and largest city of France"
        );
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Paris");
        assert_eq!(
            results[0].thumbnail.as_deref(),
            Some("https://upload.wikimedia.org/wikipedia/commons/thumb/paris.jpg")
        );
        assert_eq!(results[0].description.as_deref(), Some("Capital city of France"));
        assert_eq!(results[0].relevance_score, Some(1.0));

        assert_eq!(results[1].extract, "capital & largest city is Paris");
        assert_eq!(results[1].thumbnail, None);
        assert_eq!(results[1].description, None);
        assert_eq!(results[1].relevance_score, Some(0.5));
    }

    #[test]
    fn test_missing_pages_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(convert_pages(response.pages, "https://en.wikipedia.org").is_empty());
    }

    #[test]
    fn test_site_origin() {
        assert_eq!(
            site_origin("https://en.wikipedia.org/w/rest.php/v1"),
            "https://en.wikipedia.org"
        );
        assert_eq!(
            site_origin("http://localhost:8080/w/rest.php/v1"),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_page_url_encodes_key() {
        assert_eq!(
            page_url("https://en.wikipedia.org", "Rust_(programming_language)"),
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
        assert_eq!(
            page_url("https://en.wikipedia.org", "What?"),
            "https://en.wikipedia.org/wiki/What%3F"
        );
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("a <b>bold</b> move"), "a bold move");
        assert_eq!(strip_markup("&quot;x&quot; &lt;y&gt;"), "\"x\" <y>");
        assert_eq!(strip_markup("plain"), "plain");
    }

    #[test]
    fn test_client_configuration() {
        let client =
            WikipediaClient::with_options("https://de.wikipedia.org/w/rest.php/v1/", 0, Duration::from_secs(1));
        assert_eq!(client.base_url(), "https://de.wikipedia.org/w/rest.php/v1");
        assert_eq!(client.limit(), 1);
        assert_eq!(client.source_name(), "wikipedia");
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_call() {
        // Unreachable endpoint: any request would fail
        let client =
            WikipediaClient::with_options("http://127.0.0.1:9", 3, Duration::from_secs(2));
        assert!(client.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_typed_error() {
        let client =
            WikipediaClient::with_options("http://127.0.0.1:9", 3, Duration::from_secs(2));
        let err = client.search("capital of France").await.unwrap_err();
        assert!(matches!(err, AppError::Knowledge(_)));
    }
}
