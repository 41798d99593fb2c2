//! Assembles generated values into dataset rows.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::adapters::value_generator::ValueGenerator;
use crate::domain::{DataRow, FieldSchema, FillerText, PatternSampler, ScenarioType};

/// Rows plus the column labels they use, ready for
/// [`DatasetStore::replace_rows`](crate::adapters::dataset_store::DatasetStore::replace_rows).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDataset {
    pub labels: Vec<String>,
    pub rows: Vec<DataRow>,
}

/// Unique column labels for `fields`, in field order. Blank labels fall back
/// to the key; repeated labels get the key appended.
pub fn column_labels(fields: &[FieldSchema]) -> Vec<String> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for field in fields {
        *occurrences.entry(field.display_label()).or_insert(0) += 1;
    }

    fields
        .iter()
        .map(|field| {
            let label = field.display_label();
            if occurrences[label] > 1 && label != field.key {
                format!("{} ({})", label, field.key)
            } else {
                label.to_string()
            }
        })
        .collect()
}

pub struct DatasetBuilder<'g, S, F> {
    generator: &'g mut ValueGenerator<S, F>,
}

impl<'g, S: PatternSampler, F: FillerText> DatasetBuilder<'g, S, F> {
    pub fn new(generator: &'g mut ValueGenerator<S, F>) -> Self {
        Self { generator }
    }

    /// `positive` rows of all-correct values followed by `negative` rows in
    /// which exactly one field is incorrect. The incorrect field cycles, in
    /// order, through the fields that have a constraint to break; with no
    /// such field no negative rows are produced.
    pub fn build_rows(
        &mut self,
        fields: &[FieldSchema],
        positive: usize,
        negative: usize,
    ) -> GeneratedDataset {
        let labels = column_labels(fields);
        let mut rows = Vec::with_capacity(positive + negative);

        for _ in 0..positive {
            rows.push(self.row(fields, &labels, ScenarioType::Positive, None));
        }

        let targets: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.can_be_violated())
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            if negative > 0 {
                warn!(
                    fields = fields.len(),
                    "No field has a constraint to violate, skipping negative rows"
                );
            }
        } else {
            for n in 0..negative {
                let target = targets[n % targets.len()];
                rows.push(self.row(fields, &labels, ScenarioType::Negative, Some(target)));
            }
        }

        info!(
            fields = fields.len(),
            positive,
            negative = rows.len() - positive,
            "Generated dataset rows"
        );
        GeneratedDataset { labels, rows }
    }

    /// Correct values for new columns, one inner vector per existing row.
    pub fn column_values(
        &mut self,
        fields: &[FieldSchema],
        scenarios: &[ScenarioType],
    ) -> Vec<Vec<String>> {
        scenarios
            .iter()
            .map(|_| {
                fields
                    .iter()
                    .map(|field| self.generator.generate_correct(field))
                    .collect()
            })
            .collect()
    }

    fn row(
        &mut self,
        fields: &[FieldSchema],
        labels: &[String],
        scenario: ScenarioType,
        invalid_field: Option<usize>,
    ) -> DataRow {
        let mut row = DataRow::new(scenario);
        for (i, (field, label)) in fields.iter().zip(labels).enumerate() {
            let value = if invalid_field == Some(i) {
                self.generator.generate_incorrect(field)
            } else {
                self.generator.generate_correct(field)
            };
            row.push(label.clone(), value);
        }
        row
    }
}
