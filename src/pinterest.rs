//! # Pinterest Search Module
//!
//! Client for Pinterest's internal `BaseSearchResource` endpoint. One GET per
//! query, no retries. The response is read through serde structs whose
//! levels are all optional, so a missing level is told apart from a level of
//! the wrong type.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::errors::SearchError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// A single pin returned by a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub image_url: String,
    /// May be empty
    pub title: String,
    /// May be empty
    pub link: String,
}

/// Anything that can turn a text query into ranked image results
#[async_trait]
pub trait PinSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    resource_response: Option<ResourceResponse>,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    data: Option<ResourceData>,
}

#[derive(Debug, Deserialize)]
struct ResourceData {
    results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawPin {
    images: Option<PinImages>,
    title: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinImages {
    orig: Option<PinImage>,
}

#[derive(Debug, Deserialize)]
struct PinImage {
    url: Option<String>,
}

impl RawPin {
    fn into_result(self) -> Option<SearchResult> {
        let image_url = self.images?.orig?.url.filter(|url| !url.is_empty())?;
        Some(SearchResult {
            image_url,
            title: self.title.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
        })
    }
}

/// Build the two query parameters the endpoint expects
pub fn build_search_params(query: &str) -> [(&'static str, String); 2] {
    let data = json!({
        "options": {
            "query": query,
            "scope": "pins",
            "no_pinterest_filter": false,
        },
        "context": {},
    });
    [
        ("source_url", format!("/search/pins/?q={query}")),
        ("data", data.to_string()),
    ]
}

/// Extract at most `max_results` usable pins from a decoded response body.
///
/// A missing `resource_response.data.results` path yields an empty list.
/// Candidates without `images.orig.url` are skipped; upstream order is kept.
pub fn parse_search_response(body: Value, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let envelope: SearchEnvelope =
        serde_json::from_value(body).map_err(|e| SearchError::UnexpectedShape(e.to_string()))?;

    let Some(candidates) = envelope
        .resource_response
        .and_then(|response| response.data)
        .and_then(|data| data.results)
    else {
        warn!("Search response has no resource_response.data.results, treating as empty");
        return Ok(Vec::new());
    };

    let total = candidates.len();
    let results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|candidate| match serde_json::from_value::<RawPin>(candidate) {
            Ok(pin) => pin.into_result(),
            Err(e) => {
                debug!(error = %e, "Skipping malformed pin");
                None
            }
        })
        .take(max_results)
        .collect();

    debug!(candidates = total, kept = results.len(), "Parsed search response");
    Ok(results)
}

/// HTTP client for the Pinterest search endpoint
#[derive(Debug, Clone)]
pub struct PinterestClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PinterestClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert("x-app-version", HeaderValue::from_static("1.0.0"));
        headers.insert("x-pinterest-appversion", HeaderValue::from_static("1.0.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PinSearch for PinterestClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        info!(query = %query, max_results, "Searching Pinterest");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&build_search_params(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(query = %query, status = %status, "Pinterest search returned an error status");
            return Err(SearchError::Status(status));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        let results = parse_search_response(body, max_results)?;

        info!(query = %query, results = results.len(), "Pinterest search completed");
        Ok(results)
    }
}
