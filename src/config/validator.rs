use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{DatasetSettings, GeneratorSettings, LoggingSettings, ResolverSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Conflicting values: {0}")]
    Conflict(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_dataset(&settings.dataset) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_generator(&settings.generator) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_resolver(&settings.resolver) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_logging(&settings.logging) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_dataset(dataset: &DatasetSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if dataset.row_file.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("dataset.row_file".to_string()));
        }

        if dataset.ledger_file.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("dataset.ledger_file".to_string()));
        }

        if !dataset.row_file.as_os_str().is_empty() && dataset.row_file == dataset.ledger_file {
            errors.push(ValidationError::Conflict(
                "dataset.row_file and dataset.ledger_file must be different files".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_generator(generator: &GeneratorSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if generator.pattern_draws == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.pattern_draws".to_string(),
                reason: "Must draw at least one sample".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&generator.optional_empty_probability) {
            errors.push(ValidationError::InvalidValue {
                field: "generator.optional_empty_probability".to_string(),
                reason: "Probability must be between 0 and 1".to_string(),
            });
        }

        if generator.max_repeat == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_repeat".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_resolver(resolver: &ResolverSettings) -> Result<(), Vec<ValidationError>> {
        if (0.0..=1.0).contains(&resolver.match_threshold) {
            Ok(())
        } else {
            Err(vec![ValidationError::InvalidValue {
                field: "resolver.match_threshold".to_string(),
                reason: "Threshold must be between 0 and 1".to_string(),
            }])
        }
    }

    fn validate_logging(logging: &LoggingSettings) -> Result<(), Vec<ValidationError>> {
        if logging.level.trim().is_empty() {
            return Err(vec![ValidationError::MissingField("logging.level".to_string())]);
        }
        EnvFilter::try_new(&logging.level).map(|_| ()).map_err(|e| {
            vec![ValidationError::InvalidValue {
                field: "logging.level".to_string(),
                reason: e.to_string(),
            }]
        })
    }
}
