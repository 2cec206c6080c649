use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::PersonalizationFactor;

/// Default style preference applied when the caller supplies none.
pub const DEFAULT_STYLE: &str = "Be concise, specific, and casual in 30 words or less. \
For example: 'Heard about your talk on the future of space exploration - loved your take \
on creating a more sustainable path for space travel.'";

/// One row of the batch input table.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub first_name: String,
    pub last_name: String,
    pub keywords: String,
}

/// Read the batch input CSV; requires `first_name,last_name,keywords` columns.
pub fn read_batch_input(path: &Path) -> Result<Vec<BatchRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open input CSV {path:?}"))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: BatchRow = record.context("invalid row in input CSV")?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load personalization factors from a JSON file (an array of
/// `{name, description, action}` objects), or fall back to the built-in set.
pub fn load_factors(path: Option<&Path>) -> Result<Vec<PersonalizationFactor>> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read factors file {path:?}"))?;
            serde_json::from_str(&content).context("failed to parse factors JSON")
        }
        None => Ok(default_factors()),
    }
}

/// Built-in personalization factors used when no factors file is given.
pub fn default_factors() -> Vec<PersonalizationFactor> {
    vec![
        PersonalizationFactor {
            name: "personal_connection".to_string(),
            description: "Check if the target person has a Columbia University affiliation"
                .to_string(),
            action: "If they do, mention the shared connection to Columbia".to_string(),
        },
        PersonalizationFactor {
            name: "recent_promotion".to_string(),
            description: "Check if the target person was recently promoted".to_string(),
            action: "If they were, congratulate them on their new role".to_string(),
        },
        PersonalizationFactor {
            name: "recent_talks".to_string(),
            description: "Check if the target person gave talks recently".to_string(),
            action: "If they did, mention enjoying their insights".to_string(),
        },
    ]
}
