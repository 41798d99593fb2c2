use rand::distributions::Distribution;
use rand::rngs::StdRng;
use regex::Regex;

use crate::domain::PatternSampler;
use crate::error::SampleError;

/// Draws per sample before giving up on a pattern whose generator keeps
/// producing non-matching strings (look-arounds, word boundaries).
const DEFAULT_ATTEMPTS: usize = 32;

/// Compile `pattern` so that it only accepts whole-string matches, the way
/// an HTML `pattern` attribute is evaluated.
pub fn full_match(pattern: &str) -> Result<Regex, SampleError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| SampleError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Remove one leading `^` and one unescaped trailing `$`.
pub fn strip_anchors(pattern: &str) -> &str {
    let mut p = pattern.strip_prefix('^').unwrap_or(pattern);
    if let Some(rest) = p.strip_suffix('$') {
        let escapes = rest.chars().rev().take_while(|c| *c == '\\').count();
        if escapes % 2 == 0 {
            p = rest;
        }
    }
    p
}

/// [`PatternSampler`] backed by `rand_regex`, with every sample checked
/// against the full-match form of the pattern.
#[derive(Debug, Clone)]
pub struct RegexSampler {
    max_repeat: u32,
    attempts: usize,
}

impl RegexSampler {
    pub fn new(max_repeat: u32) -> Self {
        Self {
            max_repeat,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    fn compile(&self, pattern: &str) -> Result<(rand_regex::Regex, Regex), SampleError> {
        let matcher = full_match(pattern)?;
        let core = strip_anchors(pattern);
        // Prefer ASCII classes for `\d`, `\w`; patterns that need Unicode
        // mode (`.`, negated classes) are compiled as written.
        let generator = rand_regex::Regex::compile(&format!("(?-u:{})", core), self.max_repeat)
            .or_else(|_| rand_regex::Regex::compile(core, self.max_repeat))
            .map_err(|e| SampleError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok((generator, matcher))
    }

    fn draw(
        &self,
        pattern: &str,
        generator: &rand_regex::Regex,
        matcher: &Regex,
        rng: &mut StdRng,
    ) -> Result<String, SampleError> {
        for _ in 0..self.attempts {
            let candidate: String = generator.sample(rng);
            if matcher.is_match(&candidate) {
                return Ok(candidate);
            }
        }
        Err(SampleError::Unsatisfiable(pattern.to_string()))
    }
}

impl Default for RegexSampler {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PatternSampler for RegexSampler {
    fn sample(&self, pattern: &str, rng: &mut StdRng) -> Result<String, SampleError> {
        let (generator, matcher) = self.compile(pattern)?;
        self.draw(pattern, &generator, &matcher, rng)
    }

    fn sample_many(
        &self,
        pattern: &str,
        count: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<String>, SampleError> {
        let (generator, matcher) = self.compile(pattern)?;
        (0..count)
            .map(|_| self.draw(pattern, &generator, &matcher, rng))
            .collect()
    }
}
