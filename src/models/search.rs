use serde::{Deserialize, Serialize};

/// One hit returned by the search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    /// Not every hit carries a link; linkless hits are skipped by retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

/// Successfully retrieved page content; URLs whose retrieval failed never
/// become a `WebContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebContent {
    pub url: String,
    pub title: String,
    pub text: String,
}
