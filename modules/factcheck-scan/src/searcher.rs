use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use factcheck_common::{Config, SearchResult};

use crate::traits::WebSearcher;

pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESULTS: usize = 5;

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(SEARCH_TIMEOUT)
        .build()
        .context("Failed to build search HTTP client")
}

/// Deterministic stand-in results for environments without a search provider.
pub fn mock_results(query: &str) -> Vec<SearchResult> {
    vec![SearchResult {
        title: format!("Background information on: {query}"),
        snippet: "Mock result because no search API key is configured.".to_string(),
        url: "https://example.com/mock-info".to_string(),
        domain: "example.com".to_string(),
    }]
}

// --- Brave Search ---

pub struct BraveSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, serde::Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, serde::Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    meta_url: Option<BraveMetaUrl>,
}

#[derive(Debug, serde::Deserialize)]
struct BraveMetaUrl {
    #[serde(default)]
    hostname: String,
}

impl BraveSearcher {
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl WebSearcher for BraveSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        info!(query, "Brave search");

        let count = MAX_RESULTS.to_string();
        let resp = self
            .client
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .context("Brave API request failed")?
            .error_for_status()
            .context("Brave API returned an error status")?;

        let data: BraveResponse = resp
            .json()
            .await
            .context("Failed to parse Brave response")?;

        let results: Vec<SearchResult> = data
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| SearchResult {
                domain: r
                    .domain
                    .or_else(|| r.meta_url.map(|m| m.hostname))
                    .unwrap_or_default(),
                title: r.title,
                snippet: r.description,
                url: r.url,
            })
            .collect();

        info!(query, count = results.len(), "Brave search complete");
        Ok(results)
    }
}

// --- SerpAPI (Google) ---

pub struct SerpApiSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiResult>,
}

#[derive(Debug, serde::Deserialize)]
struct SerpApiResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    displayed_link: String,
}

impl SerpApiSearcher {
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl WebSearcher for SerpApiSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        info!(query, "SerpAPI search");

        let num = MAX_RESULTS.to_string();
        let resp = self
            .client
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .context("SerpAPI request failed")?
            .error_for_status()
            .context("SerpAPI returned an error status")?;

        let data: SerpApiResponse = resp
            .json()
            .await
            .context("Failed to parse SerpAPI response")?;

        let results: Vec<SearchResult> = data
            .organic_results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                snippet: r.snippet,
                url: r.link,
                domain: r.displayed_link,
            })
            .collect();

        info!(query, count = results.len(), "SerpAPI search complete");
        Ok(results)
    }
}

// --- Provider selection with mock fallback ---

/// Uses the configured provider (Brave before SerpAPI). Falls back to
/// [`mock_results`] when none is configured or the provider call fails, so
/// this searcher never returns an error.
pub struct FallbackSearcher {
    provider: Option<Box<dyn WebSearcher>>,
}

impl FallbackSearcher {
    pub fn new(provider: Option<Box<dyn WebSearcher>>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Option<Box<dyn WebSearcher>> =
            match (&config.brave_api_key, &config.serpapi_api_key) {
                (Some(key), _) => Some(Box::new(BraveSearcher::new(key)?) as Box<dyn WebSearcher>),
                (None, Some(key)) => {
                    Some(Box::new(SerpApiSearcher::new(key)?) as Box<dyn WebSearcher>)
                }
                (None, None) => None,
            };
        Ok(Self::new(provider))
    }
}

#[async_trait]
impl WebSearcher for FallbackSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let Some(provider) = &self.provider else {
            warn!("No search API key found; returning mock results");
            return Ok(mock_results(query));
        };
        match provider.search(query).await {
            Ok(results) => Ok(results),
            Err(e) => {
                warn!(query, error = %e, "Search API call failed; returning mock results");
                Ok(mock_results(query))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSearcher;

    #[test]
    fn mock_results_are_deterministic() {
        let a = mock_results("moon cheese");
        assert_eq!(a, mock_results("moon cheese"));
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].title, "Background information on: moon cheese");
        assert_eq!(a[0].domain, "example.com");
    }

    #[test]
    fn parses_brave_payload() {
        let raw = r#"{"web": {"results": [
            {"title": "T", "description": "D", "url": "https://x.org/a", "meta_url": {"hostname": "x.org"}}
        ]}}"#;
        let data: BraveResponse = serde_json::from_str(raw).unwrap();
        let web = data.web.unwrap();
        let first = &web.results[0];
        assert_eq!(first.description, "D");
        assert_eq!(first.meta_url.as_ref().unwrap().hostname, "x.org");
    }

    #[test]
    fn parses_serpapi_payload_without_results() {
        let data: SerpApiResponse = serde_json::from_str(r#"{"search_metadata": {}}"#).unwrap();
        assert!(data.organic_results.is_empty());
    }

    #[tokio::test]
    async fn no_provider_returns_mock() {
        let results = FallbackSearcher::new(None).search("q").await.unwrap();
        assert_eq!(results, mock_results("q"));
    }

    #[tokio::test]
    async fn failing_provider_returns_mock() {
        let searcher = FallbackSearcher::new(Some(Box::new(MockSearcher::failing())));
        let results = searcher.search("q").await.unwrap();
        assert_eq!(results, mock_results("q"));
    }

    #[tokio::test]
    async fn healthy_provider_results_pass_through() {
        let provider = MockSearcher::new().on_query(
            "q",
            vec![SearchResult {
                title: "Real".into(),
                snippet: "s".into(),
                url: "https://real.example".into(),
                domain: "real.example".into(),
            }],
        );
        let results = FallbackSearcher::new(Some(Box::new(provider)))
            .search("q")
            .await
            .unwrap();
        assert_eq!(results[0].title, "Real");
    }
}
