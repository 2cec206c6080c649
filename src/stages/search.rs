use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::flow::{Action, SharedContext, Stage, DEFAULT_ACTION};
use crate::models::SearchResult;
use crate::providers::SearchProvider;

/// Searches the web for the target person and stores the hits as
/// `search_results`. No fallback: if the search collaborator fails every
/// attempt, the run aborts.
pub struct SearchStage {
    provider: Arc<dyn SearchProvider>,
}

impl SearchStage {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage for SearchStage {
    type Input = String;
    type Output = Vec<SearchResult>;

    fn name(&self) -> &'static str {
        "search"
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<String> {
        let input = &ctx.input;
        let query = format!(
            "{} {} {}",
            input.first_name, input.last_name, input.keywords
        )
        .trim()
        .to_string();
        info!("prepared search query: '{}'", query);
        Ok(query)
    }

    async fn execute(&self, query: &String) -> Result<Vec<SearchResult>> {
        self.provider.search(query).await
    }

    fn postprocess(
        &self,
        ctx: &mut SharedContext,
        _query: String,
        results: Vec<SearchResult>,
    ) -> Result<Action> {
        info!("stored {} search results", results.len());
        ctx.search_results = results;
        Ok(DEFAULT_ACTION.to_string())
    }
}
