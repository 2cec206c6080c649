use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A caller-defined criterion to research, and the action to take when the
/// research finds it applies. Immutable once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationFactor {
    /// Unique key within a run.
    pub name: String,
    /// What to look for, phrased for the analysis prompt.
    pub description: String,
    /// What the drafted message should do when the factor is actionable.
    pub action: String,
}

/// One source's assessment of one personalization factor, decoded from the
/// analysis LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorFinding {
    pub name: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub actionable: bool,
    #[serde(default)]
    pub details: String,
}

/// Merged, actionable view of a factor across every analyzed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationEntry {
    pub actionable: bool,
    /// Details from each contributing source, joined with `" | "` in the
    /// order sources were analyzed.
    pub details: String,
    /// Copied from the input factor definition, never from LLM output.
    pub action: String,
}

/// Separator between per-source details in a merged entry.
pub const DETAILS_SEPARATOR: &str = " | ";

/// Merge per-source findings into the final personalization map.
///
/// Only actionable findings contribute. A finding whose name matches no
/// input factor is silently ignored, so the result keys are always a subset
/// of the input factor names. Details accumulate in source order; the entry's
/// `action` comes from the input factor definition.
pub fn merge_findings(
    factors: &[PersonalizationFactor],
    per_source: &[Vec<FactorFinding>],
) -> BTreeMap<String, PersonalizationEntry> {
    let mut details: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for findings in per_source {
        for finding in findings {
            if !finding.actionable {
                continue;
            }
            let Some(factor) = factors.iter().find(|f| f.name == finding.name) else {
                continue;
            };
            details
                .entry(factor.name.as_str())
                .or_default()
                .push(finding.details.as_str());
        }
    }

    details
        .into_iter()
        .map(|(name, parts)| {
            let action = factors
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.action.clone())
                .unwrap_or_default();
            (
                name.to_string(),
                PersonalizationEntry {
                    actionable: true,
                    details: parts.join(DETAILS_SEPARATOR),
                    action,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(name: &str, action: &str) -> PersonalizationFactor {
        PersonalizationFactor {
            name: name.to_string(),
            description: format!("check {name}"),
            action: action.to_string(),
        }
    }

    fn finding(name: &str, actionable: bool, details: &str) -> FactorFinding {
        FactorFinding {
            name: name.to_string(),
            action: "llm-invented action".to_string(),
            actionable,
            details: details.to_string(),
        }
    }

    #[test]
    fn test_merge_joins_details_in_source_order() {
        let factors = vec![factor("alumni_tie", "mention shared school")];
        let per_source = vec![
            vec![finding("alumni_tie", true, "A")],
            vec![finding("alumni_tie", true, "B")],
        ];

        let merged = merge_findings(&factors, &per_source);
        let entry = &merged["alumni_tie"];
        assert!(entry.actionable);
        assert_eq!(entry.details, "A | B");
    }

    #[test]
    fn test_merge_copies_action_from_input_factor() {
        let factors = vec![factor("alumni_tie", "mention shared school")];
        let per_source = vec![vec![finding("alumni_tie", true, "details")]];

        let merged = merge_findings(&factors, &per_source);
        assert_eq!(merged["alumni_tie"].action, "mention shared school");
    }

    #[test]
    fn test_non_actionable_findings_excluded() {
        let factors = vec![factor("alumni_tie", "act")];
        let per_source = vec![vec![finding("alumni_tie", false, "weak signal")]];

        assert!(merge_findings(&factors, &per_source).is_empty());
    }

    #[test]
    fn test_unmatched_name_silently_ignored() {
        let factors = vec![factor("alumni_tie", "act")];
        let per_source = vec![vec![
            finding("alumni_tie", true, "real"),
            finding("hallucinated_factor", true, "made up"),
        ]];

        let merged = merge_findings(&factors, &per_source);
        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("alumni_tie"));
    }

    #[test]
    fn test_keys_subset_of_input_names() {
        let factors = vec![factor("a", "x"), factor("b", "y")];
        let per_source = vec![vec![finding("b", true, "found b")]];

        let merged = merge_findings(&factors, &per_source);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["b"].details, "found b");
    }
}
