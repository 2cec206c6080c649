use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::flow::SharedContext;
use crate::io::BatchRow;
use crate::models::PersonalizationEntry;

/// One row of the batch output table: the input columns, the outcome, and
/// the per-factor findings.
#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub first_name: String,
    pub last_name: String,
    pub keywords: String,
    pub opening_message: String,
    /// Comma-joined URLs of the search hits that carried links.
    pub search_results: String,
    pub personalization: BTreeMap<String, PersonalizationEntry>,
}

impl BatchRecord {
    /// Build a success row from a completed run.
    pub fn from_context(ctx: &SharedContext) -> Self {
        let urls: Vec<&str> = ctx
            .search_results
            .iter()
            .filter_map(|result| result.link.as_deref())
            .collect();

        Self {
            first_name: ctx.input.first_name.clone(),
            last_name: ctx.input.last_name.clone(),
            keywords: ctx.input.keywords.clone(),
            opening_message: ctx.output.opening_message.clone().unwrap_or_default(),
            search_results: urls.join(","),
            personalization: ctx.personalization.clone(),
        }
    }

    /// Build a failure row: the error marker goes in `opening_message` and
    /// every factor column stays empty, so one bad record never aborts the
    /// batch.
    pub fn from_failure(row: &BatchRow, error: &str) -> Self {
        Self {
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            keywords: row.keywords.clone(),
            opening_message: format!("ERROR: {error}"),
            search_results: String::new(),
            personalization: BTreeMap::new(),
        }
    }
}

/// Write the batch output CSV.
///
/// Columns: the five fixed columns, then `{name}_actionable` and
/// `{name}_details` for every input factor, in input factor order.
pub fn write_batch_output(
    path: &Path,
    factor_names: &[String],
    records: &[BatchRecord],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create output CSV {path:?}"))?;

    let mut header = vec![
        "first_name".to_string(),
        "last_name".to_string(),
        "keywords".to_string(),
        "opening_message".to_string(),
        "search_results".to_string(),
    ];
    for name in factor_names {
        header.push(format!("{name}_actionable"));
        header.push(format!("{name}_details"));
    }
    writer.write_record(&header).context("failed to write CSV header")?;

    for record in records {
        let mut row = vec![
            record.first_name.clone(),
            record.last_name.clone(),
            record.keywords.clone(),
            record.opening_message.clone(),
            record.search_results.clone(),
        ];
        for name in factor_names {
            match record.personalization.get(name) {
                Some(entry) => {
                    row.push(entry.actionable.to_string());
                    row.push(entry.details.clone());
                }
                None => {
                    row.push("false".to_string());
                    row.push(String::new());
                }
            }
        }
        writer.write_record(&row).context("failed to write CSV row")?;
    }

    writer.flush().context("failed to flush output CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(details: &str, action: &str) -> PersonalizationEntry {
        PersonalizationEntry {
            actionable: true,
            details: details.to_string(),
            action: action.to_string(),
        }
    }

    #[test]
    fn test_write_batch_output_columns() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let factor_names = vec!["alumni_tie".to_string()];

        let mut personalization = BTreeMap::new();
        personalization.insert("alumni_tie".to_string(), entry("shared school", "mention it"));

        let records = vec![
            BatchRecord {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                keywords: "computing".to_string(),
                opening_message: "Hi Ada!".to_string(),
                search_results: "https://a.example,https://b.example".to_string(),
                personalization,
            },
            BatchRecord::from_failure(
                &BatchRow {
                    first_name: "Grace".to_string(),
                    last_name: "Hopper".to_string(),
                    keywords: "compilers".to_string(),
                },
                "search stage failed",
            ),
        ];

        write_batch_output(file.path(), &factor_names, &records).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "first_name,last_name,keywords,opening_message,search_results,alumni_tie_actionable,alumni_tie_details"
        );

        let ada = lines.next().unwrap();
        assert!(ada.contains("Hi Ada!"));
        assert!(ada.contains("true"));
        assert!(ada.contains("shared school"));

        let grace = lines.next().unwrap();
        assert!(grace.contains("ERROR: search stage failed"));
        assert!(grace.contains("false"));
    }
}
