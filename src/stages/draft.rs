use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::flow::{Action, RetryPolicy, SharedContext, Stage, DEFAULT_ACTION};
use crate::llm::{build_draft_prompt, LlmClient};
use crate::models::PersonalizationEntry;

/// Everything the draft prompt needs, gathered once during prepare.
pub struct DraftInput {
    pub first_name: String,
    pub last_name: String,
    pub personalization: BTreeMap<String, PersonalizationEntry>,
    pub style: String,
}

/// Drafts the opening message from the merged personalization findings.
///
/// An empty personalization map is a normal input, not an error. There is no
/// fallback here: if the LLM fails every attempt, the run fails.
pub struct DraftStage {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl DraftStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::new(2, Duration::from_secs(10)),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Stage for DraftStage {
    type Input = DraftInput;
    type Output = String;

    fn name(&self) -> &'static str {
        "draft"
    }

    fn retry(&self) -> RetryPolicy {
        self.retry
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<DraftInput> {
        info!(
            "drafting opening message for {} {} with {} personalization factors",
            ctx.input.first_name,
            ctx.input.last_name,
            ctx.personalization.len()
        );
        Ok(DraftInput {
            first_name: ctx.input.first_name.clone(),
            last_name: ctx.input.last_name.clone(),
            personalization: ctx.personalization.clone(),
            style: ctx.input.style.clone(),
        })
    }

    async fn execute(&self, input: &DraftInput) -> Result<String> {
        let prompt = build_draft_prompt(
            &input.first_name,
            &input.last_name,
            &input.personalization,
            &input.style,
        );
        self.llm.complete(&prompt).await
    }

    fn postprocess(
        &self,
        ctx: &mut SharedContext,
        _input: DraftInput,
        message: String,
    ) -> Result<Action> {
        ctx.output.opening_message = Some(message);
        info!("stored drafted opening message");
        Ok(DEFAULT_ACTION.to_string())
    }
}
