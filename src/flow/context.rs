use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::flow::FlowError;
use crate::models::{PersonalizationEntry, RunInput, RunOutput, SearchResult, WebContent};

/// The single mutable store threaded by reference through every stage of a
/// flow run.
///
/// Field ownership is part of each stage's contract: a stage reads only
/// fields written by earlier stages and writes only its own field.
///
/// - `input` — set once at construction, read-only afterwards
/// - `search_results` — written by the search stage
/// - `web_contents` — written by content retrieval (failed URLs excluded)
/// - `personalization` — written by analysis
/// - `output` — written by the draft stage; terminal value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedContext {
    pub input: RunInput,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
    #[serde(default)]
    pub web_contents: Vec<WebContent>,
    #[serde(default)]
    pub personalization: BTreeMap<String, PersonalizationEntry>,
    #[serde(default)]
    pub output: RunOutput,
}

impl SharedContext {
    /// Validate the caller-supplied input and build a fresh context.
    ///
    /// Out-of-contract input is rejected here, before any stage runs.
    pub fn new(input: RunInput) -> Result<Self, FlowError> {
        input.validate().map_err(FlowError::Validation)?;
        Ok(Self {
            input,
            search_results: Vec::new(),
            web_contents: Vec::new(),
            personalization: BTreeMap::new(),
            output: RunOutput::default(),
        })
    }
}
