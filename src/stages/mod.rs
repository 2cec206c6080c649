pub mod analyze;
pub mod draft;
pub mod retrieve;
pub mod search;

pub use analyze::*;
pub use draft::*;
pub use retrieve::*;
pub use search::*;

use std::sync::Arc;

use crate::flow::{BatchNode, Flow, FlowError, SharedContext, StageNode, DEFAULT_ACTION};
use crate::llm::LlmClient;
use crate::models::RunInput;
use crate::providers::{ContentFetcher, SearchProvider};

/// Wire the four business stages into the outreach pipeline:
/// search → retrieve → analyze → draft, all on default action labels.
pub fn outreach_flow(
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    llm: Arc<dyn LlmClient>,
) -> Result<Flow, FlowError> {
    Flow::builder()
        .start(StageNode::new(SearchStage::new(search)))
        .node(BatchNode::new(RetrieveStage::new(fetcher)))
        .node(BatchNode::new(AnalyzeStage::new(Arc::clone(&llm))))
        .node(StageNode::new(DraftStage::new(llm)))
        .edge("search", DEFAULT_ACTION, "retrieve")
        .edge("retrieve", DEFAULT_ACTION, "analyze")
        .edge("analyze", DEFAULT_ACTION, "draft")
        .build()
}

/// Validate the input, build the pipeline, and run it to completion.
///
/// On success the returned context carries `output.opening_message` and the
/// merged `personalization` map.
pub async fn run_outreach(
    input: RunInput,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    llm: Arc<dyn LlmClient>,
) -> Result<SharedContext, FlowError> {
    let mut ctx = SharedContext::new(input)?;
    let flow = outreach_flow(search, fetcher, llm)?;
    flow.run(&mut ctx).await?;
    Ok(ctx)
}
