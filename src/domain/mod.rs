use rand::rngs::StdRng;

use crate::error::SampleError;

pub mod field;
pub mod row;

pub use field::{
    is_clear_sentinel, FieldSchema, FieldType, SchemaDocument, SchemaPage, MAX_TEXT_LENGTH,
    NO_VALID_DATA,
};
pub use row::{DataRow, ScenarioFilter, ScenarioType};

/// Produces strings that fully match a regular expression.
pub trait PatternSampler {
    fn sample(&self, pattern: &str, rng: &mut StdRng) -> Result<String, SampleError>;

    fn sample_many(
        &self,
        pattern: &str,
        count: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<String>, SampleError> {
        (0..count).map(|_| self.sample(pattern, rng)).collect()
    }
}

/// Produces human-readable text of at most `max_chars` characters.
pub trait FillerText {
    fn text(&self, max_chars: usize, rng: &mut StdRng) -> String;
}
