use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::flow::{Action, BatchStage, RetryPolicy, SharedContext, DEFAULT_ACTION};
use crate::llm::{build_analysis_prompt, decode_findings, LlmClient};
use crate::models::{merge_findings, FactorFinding, PersonalizationFactor, WebContent};

/// Per-run configuration shared by every analysis item, fixed at prepare
/// time. Items carry it explicitly so item execution needs no mutable stage
/// state.
#[derive(Debug)]
pub struct AnalysisRunConfig {
    pub first_name: String,
    pub last_name: String,
    pub factors: Vec<PersonalizationFactor>,
}

/// One page to analyze, paired with the run configuration.
pub struct AnalysisItem {
    pub page: WebContent,
    pub run: Arc<AnalysisRunConfig>,
}

/// Analyzes every retrieved page against the personalization factors via the
/// LLM collaborator.
///
/// A malformed response is an execute failure like any other; a source that
/// fails every attempt falls back to an empty finding list and drops out of
/// the merge without affecting other sources.
pub struct AnalyzeStage {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl AnalyzeStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::new(1, Duration::from_secs(10)),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl BatchStage for AnalyzeStage {
    type Item = AnalysisItem;
    type ItemOutput = Vec<FactorFinding>;

    fn name(&self) -> &'static str {
        "analyze"
    }

    fn retry(&self) -> RetryPolicy {
        self.retry
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<Vec<AnalysisItem>> {
        let run = Arc::new(AnalysisRunConfig {
            first_name: ctx.input.first_name.clone(),
            last_name: ctx.input.last_name.clone(),
            factors: ctx.input.personalization_factors.clone(),
        });

        let items: Vec<AnalysisItem> = ctx
            .web_contents
            .iter()
            .map(|page| AnalysisItem {
                page: page.clone(),
                run: Arc::clone(&run),
            })
            .collect();
        info!("analyzing content from {} web pages", items.len());
        Ok(items)
    }

    async fn execute_item(&self, item: &AnalysisItem) -> Result<Vec<FactorFinding>> {
        let prompt = build_analysis_prompt(
            &item.run.first_name,
            &item.run.last_name,
            &item.run.factors,
            &item.page,
        );
        let response = self.llm.complete(&prompt).await?;
        decode_findings(&response)
    }

    async fn fallback_item(
        &self,
        item: &AnalysisItem,
        error: anyhow::Error,
    ) -> Result<Vec<FactorFinding>> {
        warn!(
            "failed to analyze content from {} after all retries: {:#}",
            item.page.url, error
        );
        Ok(vec![])
    }

    fn postprocess(
        &self,
        ctx: &mut SharedContext,
        items: Vec<AnalysisItem>,
        findings: Vec<Vec<FactorFinding>>,
    ) -> Result<Action> {
        let merged = merge_findings(&ctx.input.personalization_factors, &findings);
        info!(
            "analysis complete: {} factors actionable across {} sources",
            merged.len(),
            items.len()
        );
        ctx.personalization = merged;
        Ok(DEFAULT_ACTION.to_string())
    }
}
