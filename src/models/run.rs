use serde::{Deserialize, Serialize};

use crate::models::PersonalizationFactor;

/// Caller-supplied input for one pipeline run; set once, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    pub first_name: String,
    pub last_name: String,
    /// Extra search terms appended to the person's name.
    pub keywords: String,
    pub personalization_factors: Vec<PersonalizationFactor>,
    /// Style preferences for the drafted opening message.
    pub style: String,
}

impl RunInput {
    /// Check the input against the run contract: names 1–30 chars, keywords
    /// up to 100 chars, 1–5 factors with unique non-empty names, style
    /// 10–500 chars. All violations are reported in one message.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if !(1..=30).contains(&self.first_name.chars().count()) {
            problems.push("first_name must be 1-30 characters".to_string());
        }
        if !(1..=30).contains(&self.last_name.chars().count()) {
            problems.push("last_name must be 1-30 characters".to_string());
        }
        if self.keywords.chars().count() > 100 {
            problems.push("keywords must be at most 100 characters".to_string());
        }
        if !(10..=500).contains(&self.style.chars().count()) {
            problems.push("style must be 10-500 characters".to_string());
        }

        let factors = &self.personalization_factors;
        if !(1..=5).contains(&factors.len()) {
            problems.push("between 1 and 5 personalization factors are required".to_string());
        }
        for (i, factor) in factors.iter().enumerate() {
            if factor.name.trim().is_empty() {
                problems.push(format!("factor {} has an empty name", i + 1));
            }
        }
        let mut names: Vec<&str> = factors.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != factors.len() {
            problems.push("personalization factor names must be unique".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Terminal output of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutput {
    /// The drafted opening message; set only by the draft stage on success.
    pub opening_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> RunInput {
        RunInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            keywords: "computing".to_string(),
            personalization_factors: vec![PersonalizationFactor {
                name: "alumni_tie".to_string(),
                description: "Check for a shared school".to_string(),
                action: "mention shared school".to_string(),
            }],
            style: "Concise and casual, 30 words or less.".to_string(),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_empty_first_name_rejected() {
        let mut input = valid_input();
        input.first_name = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_long_keywords_rejected() {
        let mut input = valid_input();
        input.keywords = "k".repeat(101);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_factor_count_bounds() {
        let mut input = valid_input();
        input.personalization_factors.clear();
        assert!(input.validate().is_err());

        let factor = valid_input().personalization_factors.remove(0);
        input.personalization_factors = (0..6)
            .map(|i| {
                let mut f = factor.clone();
                f.name = format!("factor_{i}");
                f
            })
            .collect();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_duplicate_factor_names_rejected() {
        let mut input = valid_input();
        let dup = input.personalization_factors[0].clone();
        input.personalization_factors.push(dup);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_short_style_rejected() {
        let mut input = valid_input();
        input.style = "terse".to_string();
        assert!(input.validate().is_err());
    }
}
