use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::SearchResult;

/// Web search collaborator consumed by the search stage.
///
/// Best effort: no results means an empty list, not an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Configuration for the Serper search API client
#[derive(Debug, Clone)]
pub struct SerperConfig {
    /// API key (from SERPER_API_KEY env var)
    pub api_key: String,
    pub endpoint: String,
    /// Maximum results to request per query
    pub num_results: u32,
}

impl SerperConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SERPER_API_KEY")
            .context("SERPER_API_KEY environment variable not set")?;

        Ok(Self {
            api_key,
            endpoint: "https://google.serper.dev/search".to_string(),
            num_results: 10,
        })
    }
}

/// Serper-backed web search client
pub struct SerperClient {
    client: Client,
    config: SerperConfig,
}

impl SerperClient {
    pub fn new(config: SerperConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let request = SerperRequest {
            q: query.to_string(),
            num: self.config.num_results,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-API-KEY", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to search API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search API error: {} - {}", status, body);
        }

        let response: SerperResponse = response
            .json()
            .await
            .context("Failed to parse search API response")?;

        debug!("search for '{}' returned {} hits", query, response.organic.len());

        Ok(response
            .organic
            .into_iter()
            .map(|hit| SearchResult {
                title: hit.title,
                link: hit.link,
                snippet: hit.snippet,
            })
            .collect())
    }
}

#[derive(Debug, serde::Serialize)]
struct SerperRequest {
    q: String,
    num: u32,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicHit>,
}

#[derive(Debug, Deserialize)]
struct OrganicHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: String,
}
