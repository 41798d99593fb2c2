//! # formseed - form test data engine
//!
//! formseed turns declarative form field descriptions into test data and
//! hands that data out across repeated test runs.
//!
//! ## Features
//!
//! - **Value generation**: constraint-satisfying and constraint-violating
//!   values for text, textarea, select, multiselect and number fields,
//!   including regex-conformant sampling biased toward rare branches
//! - **Dataset store**: CSV row file plus a usage ledger, with
//!   at-most-once consumption per run and atomic writes
//! - **Placeholder resolution**: fuzzy `%Label%` matching against row labels
//! - **Configuration**: layered settings from file and environment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formseed::adapters::dataset_builder::DatasetBuilder;
//! use formseed::adapters::dataset_store::DatasetStore;
//! use formseed::adapters::placeholder_resolver::PlaceholderResolver;
//! use formseed::adapters::value_generator::ValueGenerator;
//! use formseed::config::Settings;
//! use formseed::domain::{FieldSchema, FieldType, ScenarioFilter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let fields = vec![FieldSchema::new("org", "Organization Name", FieldType::Text)
//!         .required(true)
//!         .with_lengths(Some(3), Some(40))];
//!
//!     let mut store = DatasetStore::open(&settings.dataset)?;
//!     if !store.data_exists() {
//!         let mut generator = ValueGenerator::from_settings(&settings.generator);
//!         let dataset = DatasetBuilder::new(&mut generator).build_rows(&fields, 5, 5);
//!         store.replace_rows(dataset.labels, dataset.rows)?;
//!     }
//!
//!     if let Some(selection) = store.get_next_available_row(ScenarioFilter::Positive)? {
//!         let resolver = PlaceholderResolver::from_settings(&settings.resolver);
//!         let step = resolver.substitute("Type %Organization Name%", &selection.row);
//!         println!("{}", step);
//!         store.mark_row_used(selection.index)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: field schemas, rows and the sampler/filler ports
//! - **Adapters**: generator, store, resolver and their file formats
//! - **Config**: settings and validation

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
