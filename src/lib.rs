pub mod flow;
pub mod io;
pub mod llm;
pub mod models;
pub mod providers;
pub mod stages;

pub use flow::{
    BatchStage, Flow, FlowBuilder, FlowError, RetryPolicy, SharedContext, Stage, DEFAULT_ACTION,
};
pub use llm::{AnthropicClient, AnthropicConfig, LlmClient};
pub use models::{
    FactorFinding, PersonalizationEntry, PersonalizationFactor, RunInput, RunOutput, SearchResult,
    WebContent,
};
pub use providers::{
    ContentFetcher, FetchedPage, HttpFetcher, SearchProvider, SerperClient, SerperConfig,
};
pub use stages::{
    outreach_flow, run_outreach, AnalyzeStage, DraftStage, RetrieveStage, SearchStage,
};
