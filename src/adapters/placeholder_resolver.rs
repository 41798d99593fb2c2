//! `%Placeholder%` resolution against a dataset row.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::adapters::similarity::{jaccard, normalize, sequence_ratio, word_set};
use crate::adapters::value_generator::strip_wrapping_quotes;
use crate::config::ResolverSettings;
use crate::domain::DataRow;

/// Row value meaning "this field does not apply to the scenario".
pub const NOT_APPLICABLE: &str = "N/A";

const WORD_WEIGHT: f64 = 0.7;
const SEQUENCE_WEIGHT: f64 = 0.3;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"%([^%\r\n]+)%").expect("placeholder pattern is valid"))
}

/// Token bodies between `%` delimiters, distinct, in first-seen order.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(text) {
        let token = &caps[1];
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

fn is_not_applicable(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(NOT_APPLICABLE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Replaced with the value of `label`.
    Substituted { label: String },
    /// No label scored above the threshold.
    Unmatched,
    /// Matched `label`, whose value is intentionally empty.
    Empty { label: String },
    /// Matched `label`, whose value is the not-applicable marker.
    NotApplicable { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderOutcome {
    pub token: String,
    pub resolution: Resolution,
}

/// Result of [`PlaceholderResolver::substitute_detailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub outcomes: Vec<PlaceholderOutcome>,
}

impl Substitution {
    /// Tokens that matched no field.
    pub fn unmatched(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.resolution == Resolution::Unmatched)
            .map(|o| o.token.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o.resolution, Resolution::Substituted { .. }))
    }
}

#[derive(Debug, Clone)]
pub struct PlaceholderResolver {
    threshold: f64,
}

impl PlaceholderResolver {
    pub fn new() -> Self {
        Self::with_threshold(ResolverSettings::default().match_threshold)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self::with_threshold(settings.match_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn extract_placeholders(&self, text: &str) -> Vec<String> {
        extract_placeholders(text)
    }

    /// Best label for `token`, or `None` when nothing scores at least the
    /// threshold. An exact match after normalization wins immediately.
    pub fn find_matching_field<'a, I>(&self, token: &str, labels: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let token_norm = normalize(token);
        let token_words = word_set(&token_norm);

        let mut best: Option<(&'a str, f64)> = None;
        for label in labels {
            let label_norm = normalize(label);
            if label_norm == token_norm {
                return Some(label);
            }
            let label_words = word_set(&label_norm);
            let score = WORD_WEIGHT * jaccard(&token_words, &label_words)
                + SEQUENCE_WEIGHT * sequence_ratio(&token_norm, &label_norm);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((label, score));
            }
        }

        match best {
            Some((label, score)) if score >= self.threshold => {
                debug!(token, label, score, "Fuzzy placeholder match");
                Some(label)
            }
            Some((label, score)) => {
                debug!(token, closest = label, score, "No placeholder match above threshold");
                None
            }
            None => None,
        }
    }

    /// Replace every resolvable placeholder in `text` with its row value.
    /// Unmatched, empty and not-applicable placeholders are left verbatim.
    pub fn substitute(&self, text: &str, row: &DataRow) -> String {
        self.substitute_detailed(text, row).text
    }

    pub fn substitute_detailed(&self, text: &str, row: &DataRow) -> Substitution {
        let mut replacements: HashMap<String, String> = HashMap::new();
        let mut outcomes = Vec::new();

        for token in extract_placeholders(text) {
            let resolution = match self.find_matching_field(&token, row.labels()) {
                None => Resolution::Unmatched,
                Some(label) => {
                    let value = row.get(label).unwrap_or_default();
                    if value.is_empty() {
                        Resolution::Empty {
                            label: label.to_string(),
                        }
                    } else if is_not_applicable(value) {
                        Resolution::NotApplicable {
                            label: label.to_string(),
                        }
                    } else {
                        replacements.insert(token.clone(), strip_wrapping_quotes(value).to_string());
                        Resolution::Substituted {
                            label: label.to_string(),
                        }
                    }
                }
            };
            outcomes.push(PlaceholderOutcome { token, resolution });
        }

        let text = placeholder_regex()
            .replace_all(text, |caps: &Captures| match replacements.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned();

        Substitution { text, outcomes }
    }
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::new()
    }
}
