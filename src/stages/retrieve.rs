use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::flow::{Action, BatchStage, RetryPolicy, SharedContext, DEFAULT_ACTION};
use crate::providers::{ContentFetcher, FetchedPage};

/// Fetches page content for every linked search result.
///
/// A URL that stays unreachable through all retries falls back to a
/// content-less marker; only successfully retrieved pages are stored as
/// `web_contents`, so a dead link is never fatal to the run.
pub struct RetrieveStage {
    fetcher: Arc<dyn ContentFetcher>,
    retry: RetryPolicy,
}

impl RetrieveStage {
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            fetcher,
            retry: RetryPolicy::new(1, Duration::from_secs(2)),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl BatchStage for RetrieveStage {
    type Item = String;
    type ItemOutput = Option<FetchedPage>;

    fn name(&self) -> &'static str {
        "retrieve"
    }

    fn retry(&self) -> RetryPolicy {
        self.retry
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<Vec<String>> {
        let urls: Vec<String> = ctx
            .search_results
            .iter()
            .filter_map(|result| result.link.clone())
            .collect();
        info!("retrieving content from {} URLs", urls.len());
        Ok(urls)
    }

    async fn execute_item(&self, url: &String) -> Result<Option<FetchedPage>> {
        let page = self.fetcher.fetch(url).await?;
        Ok(Some(page))
    }

    async fn fallback_item(
        &self,
        url: &String,
        error: anyhow::Error,
    ) -> Result<Option<FetchedPage>> {
        warn!(
            "failed to retrieve content from {} after all retries: {:#}",
            url, error
        );
        Ok(None)
    }

    fn postprocess(
        &self,
        ctx: &mut SharedContext,
        urls: Vec<String>,
        pages: Vec<Option<FetchedPage>>,
    ) -> Result<Action> {
        let total = urls.len();
        let contents: Vec<_> = urls
            .into_iter()
            .zip(pages)
            .filter_map(|(url, page)| page.map(|p| p.into_web_content(&url)))
            .collect();
        info!(
            "retrieved content from {}/{} URLs successfully",
            contents.len(),
            total
        );
        ctx.web_contents = contents;
        Ok(DEFAULT_ACTION.to_string())
    }
}
