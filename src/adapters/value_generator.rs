//! Correct and incorrect value synthesis for a single [`FieldSchema`].
//!
//! Correct values satisfy every declared constraint; incorrect values break
//! exactly the kind of constraint the field declares (required-ness, pattern,
//! option membership, numeric type, or length bounds). Random draws are
//! biased toward short lengths, small numbers and few options, with rare
//! boundary cases (whitespace-only, exact min/max length) mixed in.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::adapters::lorem_filler::LoremFiller;
use crate::adapters::regex_sampler::{full_match, RegexSampler};
use crate::config::GeneratorSettings;
use crate::domain::{
    FieldSchema, FieldType, FillerText, PatternSampler, MAX_TEXT_LENGTH, NO_VALID_DATA,
};
use crate::error::SampleError;

/// Separator between picks of a multi-valued selection.
pub const OPTION_SEPARATOR: &str = " | ";

/// Returned for an incorrect value when the field declares nothing that can
/// be violated.
pub const UNCONSTRAINED_INVALID_TOKEN: &str = "INVALID_VALUE";

const SINGLE_SAMPLE_PROBABILITY: f64 = 0.3;
const OPTION_COUNT_EXPONENT: f64 = 2.5;
const SELECT_ALL_PROBABILITY: f64 = 0.1;
const NUMBER_EXPONENT: f64 = 1.5;
const NUMBER_MAX: u32 = 9999;
const DEFAULT_LENGTH_BOUNDS: (usize, usize) = (5, 15);
const WHITESPACE_PROBABILITY: f64 = 0.05;
const COLLAPSE_PROBABILITY: f64 = 0.025;
const REQUIRED_EMPTY_PROBABILITY: f64 = 0.07;
const SWAP_PROBABILITY: f64 = 0.3;
const MAX_MUTATION_ROUNDS: usize = 64;
/// Inserted when character-level mutations cannot leave the pattern's
/// character class.
const FOREIGN_CHARS: &[char] = &['!', '#', '%', '7', ' ', '~'];
const RANDOM_TOKEN_LEN: usize = 7;
/// Below this many missing characters the fill uses random characters
/// instead of another filler chunk.
const SHORT_TAIL: usize = 5;
const CHUNK_CHARS: usize = 200;

const ALPHANUMERIC_SPACE: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 ";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ALPHABETIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generator handle. Owns its RNG so that a seeded generator reproduces the
/// same dataset.
pub struct ValueGenerator<S = RegexSampler, F = LoremFiller> {
    rng: StdRng,
    sampler: S,
    filler: F,
    pattern_draws: usize,
    optional_empty_probability: f64,
}

impl ValueGenerator {
    pub fn new() -> Self {
        Self::with_parts(RegexSampler::default(), LoremFiller, StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_parts(
            RegexSampler::default(),
            LoremFiller,
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_parts(RegexSampler::new(settings.max_repeat), LoremFiller, rng)
            .with_pattern_draws(settings.pattern_draws)
            .with_optional_empty_probability(settings.optional_empty_probability)
    }
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PatternSampler, F: FillerText> ValueGenerator<S, F> {
    pub fn with_parts(sampler: S, filler: F, rng: StdRng) -> Self {
        let defaults = GeneratorSettings::default();
        Self {
            rng,
            sampler,
            filler,
            pattern_draws: defaults.pattern_draws,
            optional_empty_probability: defaults.optional_empty_probability,
        }
    }

    pub fn with_pattern_draws(mut self, draws: usize) -> Self {
        self.pattern_draws = draws.max(1);
        self
    }

    pub fn with_optional_empty_probability(mut self, probability: f64) -> Self {
        self.optional_empty_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// A value that satisfies every constraint of `schema`.
    pub fn generate_correct(&mut self, schema: &FieldSchema) -> String {
        let field = schema.normalized();

        if !field.required && self.rng.gen_bool(self.optional_empty_probability) {
            debug!(field = %field.key, "leaving optional field empty");
            return field.empty_representation();
        }

        if let Some(pattern) = field.pattern.as_deref() {
            match self.pattern_value(pattern) {
                Ok(value) => return value,
                Err(e) => warn!(
                    field = %field.key,
                    "Pattern sampling failed, falling back to type-based generation: {}",
                    e
                ),
            }
        }

        match field.field_type {
            FieldType::Select | FieldType::Multiselect => self.correct_choice(&field),
            FieldType::Number => self.correct_number(),
            FieldType::Text | FieldType::Textarea => self.correct_text(&field),
        }
    }

    /// A value that violates a constraint of `schema`.
    pub fn generate_incorrect(&mut self, schema: &FieldSchema) -> String {
        let field = schema.normalized();

        if field.required && self.rng.gen_bool(REQUIRED_EMPTY_PROBABILITY) {
            debug!(field = %field.key, "violating required with empty value");
            return field.empty_representation();
        }

        if let Some(pattern) = field.pattern.as_deref() {
            match self.mutated_pattern_value(pattern) {
                Ok(value) => return value,
                Err(e) => warn!(
                    field = %field.key,
                    "Pattern mutation failed, falling back to type-based generation: {}",
                    e
                ),
            }
        }

        match field.field_type {
            FieldType::Select | FieldType::Multiselect => self.incorrect_choice(&field),
            FieldType::Number => {
                let len = self.rng.gen_range(1..=5);
                self.random_string(ALPHABETIC, len)
            }
            FieldType::Text | FieldType::Textarea => self.incorrect_text(&field),
        }
    }

    fn pattern_value(&mut self, pattern: &str) -> Result<String, SampleError> {
        if self.rng.gen_bool(SINGLE_SAMPLE_PROBABILITY) {
            return self.sampler.sample(pattern, &mut self.rng);
        }
        let samples = self
            .sampler
            .sample_many(pattern, self.pattern_draws, &mut self.rng)?;
        rarest(samples, &mut self.rng).ok_or_else(|| SampleError::Unsatisfiable(pattern.to_string()))
    }

    fn mutated_pattern_value(&mut self, pattern: &str) -> Result<String, SampleError> {
        let matcher = full_match(pattern)?;
        let base = self.sampler.sample(pattern, &mut self.rng)?;
        let mut chars: Vec<char> = base.chars().collect();

        for _ in 0..MAX_MUTATION_ROUNDS {
            self.mutate(&mut chars);
            let candidate: String = chars.iter().collect();
            if !matcher.is_match(&candidate) {
                return Ok(candidate);
            }
        }

        if let Some(value) = self.insert_foreign_char(&chars, &matcher) {
            debug!(pattern = %pattern, "escaped pattern with a foreign character");
            return Ok(value);
        }

        debug!(
            pattern = %pattern,
            "No mutation escaped the pattern after {} rounds",
            MAX_MUTATION_ROUNDS
        );
        Err(SampleError::Unsatisfiable(pattern.to_string()))
    }

    fn insert_foreign_char(&mut self, chars: &[char], matcher: &Regex) -> Option<String> {
        let mut candidates = FOREIGN_CHARS.to_vec();
        candidates.shuffle(&mut self.rng);
        for c in candidates {
            let mut attempt = chars.to_vec();
            let idx = self.rng.gen_range(0..=attempt.len());
            attempt.insert(idx, c);
            let candidate: String = attempt.into_iter().collect();
            if !matcher.is_match(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn mutate(&mut self, chars: &mut Vec<char>) {
        for _ in 0..self.rng.gen_range(0..=2) {
            if !chars.is_empty() {
                let idx = self.rng.gen_range(0..chars.len());
                chars.remove(idx);
            }
        }

        for _ in 0..self.rng.gen_range(0..=2) {
            if !chars.is_empty() {
                let idx = self.rng.gen_range(0..chars.len());
                let c = chars[idx];
                chars.insert(idx, c);
            }
        }

        for _ in 0..self.rng.gen_range(1..=3) {
            if !chars.is_empty() {
                let idx = self.rng.gen_range(0..chars.len());
                if let Some(upper) = chars[idx].to_uppercase().next() {
                    chars[idx] = upper;
                }
            }
        }

        if chars.len() >= 2 && self.rng.gen_bool(SWAP_PROBABILITY) {
            let idx = self.rng.gen_range(0..chars.len() - 1);
            chars.swap(idx, idx + 1);
        }

        if chars.is_empty() {
            let c = ALPHANUMERIC[self.rng.gen_range(0..ALPHANUMERIC.len())] as char;
            chars.push(c);
        }
    }

    /// Number of picks in `[1, max]`, biased toward 1.
    fn biased_count(&mut self, max: usize) -> usize {
        let u: f64 = self.rng.gen();
        let k = 1 + (u.powf(OPTION_COUNT_EXPONENT) * max as f64).floor() as usize;
        k.clamp(1, max.max(1))
    }

    fn correct_choice(&mut self, field: &FieldSchema) -> String {
        let pool = field.usable_options();
        if pool.is_empty() {
            warn!(field = %field.key, "No usable options for choice field");
            return NO_VALID_DATA.to_string();
        }

        let multi = field.field_type == FieldType::Multiselect;
        let max = if multi { pool.len() } else { 1 };
        let mut k = self.biased_count(max);
        if multi && self.rng.gen_bool(SELECT_ALL_PROBABILITY) {
            k = max;
        }

        let mut picked = rand::seq::index::sample(&mut self.rng, pool.len(), k).into_vec();
        picked.sort_unstable();
        picked
            .into_iter()
            .map(|i| pool[i])
            .collect::<Vec<_>>()
            .join(OPTION_SEPARATOR)
    }

    fn incorrect_choice(&mut self, field: &FieldSchema) -> String {
        let pool = field.usable_options();
        let max = if field.field_type == FieldType::Multiselect {
            pool.len()
        } else {
            1
        };
        let k = self.biased_count(max);

        let mut picks = Vec::with_capacity(k);
        for _ in 0..k {
            let token = self.random_string(ALPHANUMERIC, RANDOM_TOKEN_LEN);
            // With nothing valid to decorate only the standalone forms apply.
            let strategy = if pool.is_empty() {
                self.rng.gen_range(2..4)
            } else {
                self.rng.gen_range(0..4)
            };
            let pick = match strategy {
                0 => format!("{}_{}", pool.choose(&mut self.rng).copied().unwrap_or_default(), token),
                1 => format!("{}_{}", token, pool.choose(&mut self.rng).copied().unwrap_or_default()),
                2 => format!("INVALID_{}", token),
                _ => format!("{}_INVALID", token),
            };
            picks.push(pick);
        }
        picks.join(OPTION_SEPARATOR)
    }

    fn correct_number(&mut self) -> String {
        let u: f64 = self.rng.gen();
        let value = (u.powf(NUMBER_EXPONENT) * (NUMBER_MAX + 1) as f64).floor() as u32;
        value.min(NUMBER_MAX).to_string()
    }

    fn correct_text(&mut self, field: &FieldSchema) -> String {
        let (mut min, mut max) = resolve_length_bounds(field.minlength, field.maxlength);
        // Emptiness is produced by the optional-field branch only.
        if min == 0 {
            min = 1;
            max = max.max(1);
        }

        if self.rng.gen_bool(WHITESPACE_PROBABILITY) {
            return " ".repeat(min);
        } else if self.rng.gen_bool(COLLAPSE_PROBABILITY) {
            max = min;
        }
        if self.rng.gen_bool(WHITESPACE_PROBABILITY) {
            return " ".repeat(max);
        } else if self.rng.gen_bool(COLLAPSE_PROBABILITY) {
            min = max;
        }

        let exponent = self.rng.gen_range(3.0..4.0);
        let u: f64 = self.rng.gen();
        let span = max - min;
        let offset = ((u.powf(exponent) * (span + 1) as f64).floor() as usize).min(span);
        self.filler_of_length(min + offset)
    }

    fn incorrect_text(&mut self, field: &FieldSchema) -> String {
        let min = field.minlength.unwrap_or(1).min(MAX_TEXT_LENGTH);
        // A bound at or beyond the ceiling cannot be exceeded in practice.
        let maxlength = field.maxlength.filter(|max| *max < MAX_TEXT_LENGTH);
        let target = match maxlength {
            Some(max) if min >= 2 => {
                if self.rng.gen_bool(0.5) {
                    self.below_min(min)
                } else {
                    max.saturating_add(self.rng.gen_range(1..=5))
                }
            }
            Some(max) => max.saturating_add(self.rng.gen_range(1..=5)),
            None if min >= 2 => self.below_min(min),
            None => {
                debug!(field = %field.key, "no length bound to violate");
                return if field.required {
                    field.empty_representation()
                } else {
                    UNCONSTRAINED_INVALID_TOKEN.to_string()
                };
            }
        };
        self.filler_of_length(target)
    }

    fn below_min(&mut self, min: usize) -> usize {
        let offset = self.rng.gen_range(1..=min - 1);
        min.saturating_sub(offset).max(1)
    }

    /// Readable text of exactly `len` characters on a single line.
    fn filler_of_length(&mut self, len: usize) -> String {
        let mut text = String::new();
        let mut count = 0;
        while count < len {
            let remaining = len - count;
            let chunk = if remaining < SHORT_TAIL {
                self.random_string(ALPHANUMERIC_SPACE, remaining)
            } else {
                let chunk = self.filler.text(remaining.min(CHUNK_CHARS), &mut self.rng);
                if chunk.is_empty() {
                    self.random_string(ALPHANUMERIC_SPACE, SHORT_TAIL)
                } else {
                    format!("{} ", chunk)
                }
            };
            count += chunk.chars().count();
            text.push_str(&chunk);
        }

        let truncated: String = text
            .chars()
            .take(len)
            .filter(|c| *c != '\n' && *c != '\r')
            .collect();
        let mut value = strip_wrapping_quotes(&truncated).to_string();

        let shortfall = len.saturating_sub(value.chars().count());
        if shortfall > 0 {
            let pad = self.random_string(ALPHANUMERIC_SPACE, shortfall);
            value.push_str(&pad);
        }
        value
    }

    fn random_string(&mut self, charset: &[u8], len: usize) -> String {
        (0..len)
            .map(|_| charset[self.rng.gen_range(0..charset.len())] as char)
            .collect()
    }
}

/// Effective `(min, max)` for length-bounded text, clamped to
/// [`MAX_TEXT_LENGTH`].
pub fn resolve_length_bounds(minlength: Option<usize>, maxlength: Option<usize>) -> (usize, usize) {
    let (min, max) = match (minlength, maxlength) {
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) => (min, (min as f64 * 1.5).floor() as usize),
        (None, Some(max)) => ((max as f64 * 2.0 / 3.0).floor() as usize, max),
        (None, None) => DEFAULT_LENGTH_BOUNDS,
    };
    let max = max.max(min).min(MAX_TEXT_LENGTH);
    (min.min(max), max)
}

/// Uniform pick among the strings that occur least often in `samples`.
pub(crate) fn rarest(samples: Vec<String>, rng: &mut StdRng) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for sample in &samples {
        let count = counts.entry(sample.as_str()).or_insert(0);
        if *count == 0 {
            order.push(sample.as_str());
        }
        *count += 1;
    }

    let min = counts.values().copied().min()?;
    let candidates: Vec<&str> = order.into_iter().filter(|s| counts[s] == min).collect();
    candidates.choose(rng).map(|s| s.to_string())
}

/// Remove one layer of matching single or double quotes around `value`.
pub fn strip_wrapping_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
