use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{FactorFinding, PersonalizationEntry, PersonalizationFactor, WebContent};

/// Cap on page text embedded in the analysis prompt.
const MAX_PAGE_TEXT_CHARS: usize = 6_000;

/// Build the per-source analysis prompt: person, factor list, page content,
/// and the required fenced JSON output shape.
pub fn build_analysis_prompt(
    first_name: &str,
    last_name: &str,
    factors: &[PersonalizationFactor],
    page: &WebContent,
) -> String {
    let text = truncate_chars(&page.text, MAX_PAGE_TEXT_CHARS);

    format!(
        r#"Analyze the following webpage content about {first_name} {last_name}.
Look for the following personalization factors:
{factor_list}
Content from {url}:
Title: {title}

Text:
{text}

For each factor, return whether you found relevant information and details.
Format your response as a fenced JSON block:
```json
{{
  "factors": [
    {{"name": "factor_name", "action": "action to take", "actionable": true, "details": "supporting details if actionable"}}
  ]
}}
```
Use exactly the factor names given above. Return one entry per factor."#,
        factor_list = format_factor_list(factors),
        url = page.url,
        title = page.title,
    )
}

/// Build the draft prompt from the person, the merged personalization
/// findings, and the caller's style preferences.
pub fn build_draft_prompt(
    first_name: &str,
    last_name: &str,
    personalization: &BTreeMap<String, PersonalizationEntry>,
    style: &str,
) -> String {
    format!(
        r#"Generate a personalized opening message for a cold outreach email to {first_name} {last_name}.

Based on our research, we found the following personalization factors:
{findings}
Style preferences: {style}

Write a concise opening paragraph (1-3 sentences) that:
1. Addresses the person by first name
2. Includes the personalization points we found
3. Matches the requested style
4. Feels authentic and not forced

If no personalization factors were found, write a tasteful generic opener instead.
Only return the opening message, nothing else."#,
        findings = format_personalization(personalization),
    )
}

fn format_factor_list(factors: &[PersonalizationFactor]) -> String {
    let mut out = String::new();
    for (i, factor) in factors.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}: {}\n   Action: {}\n",
            i + 1,
            factor.name,
            factor.description,
            factor.action
        ));
    }
    out
}

fn format_personalization(personalization: &BTreeMap<String, PersonalizationEntry>) -> String {
    if personalization.is_empty() {
        return "No specific personalization factors were actionable.\n".to_string();
    }

    let mut out = String::new();
    for (name, entry) in personalization {
        out.push_str(&format!(
            "- {}: {}\n  Action: {}\n",
            name, entry.details, entry.action
        ));
    }
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[derive(Debug, Deserialize)]
struct FindingsBlock {
    #[serde(default)]
    factors: Vec<FactorFinding>,
}

/// Extract the fenced ```json block from an LLM response.
pub fn extract_json_block(response: &str) -> Result<&str> {
    let after_fence = response
        .split_once("```json")
        .context("response contains no ```json block")?
        .1;
    let block = after_fence
        .split_once("```")
        .context("```json block is not closed")?
        .0;
    Ok(block.trim())
}

/// Strictly decode the analysis response into typed findings.
///
/// Any miss — missing fence, malformed JSON, wrong shape — is an error, and
/// callers treat it exactly like a transport failure for retry purposes.
pub fn decode_findings(response: &str) -> Result<Vec<FactorFinding>> {
    let block = extract_json_block(response)?;
    let parsed: FindingsBlock =
        serde_json::from_str(block).context("failed to decode findings JSON")?;
    Ok(parsed.factors)
}
