use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;

use crate::domain::FillerText;

/// [`FillerText`] built from `fake`'s English lorem generators.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoremFiller;

impl FillerText for LoremFiller {
    fn text(&self, max_chars: usize, rng: &mut StdRng) -> String {
        if max_chars == 0 {
            return String::new();
        }

        let text: String = if max_chars < 12 {
            Word().fake_with_rng(rng)
        } else if max_chars < 80 || rng.gen_bool(0.5) {
            Sentence(1..10).fake_with_rng(rng)
        } else {
            Paragraph(1..3).fake_with_rng(rng)
        };

        text.chars().take(max_chars).collect()
    }
}
