pub mod dataset_builder;
pub mod dataset_store;
pub mod lorem_filler;
pub mod placeholder_resolver;
pub mod regex_sampler;
pub mod row_file;
pub mod schema_loader;
pub mod similarity;
pub mod usage_ledger;
pub mod value_generator;

#[cfg(test)]
mod dataset_store_test;
