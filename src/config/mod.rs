use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub dataset: DatasetSettings,
    pub generator: GeneratorSettings,
    pub resolver: ResolverSettings,
    pub logging: LoggingSettings,
}

/// Locations of the two persisted dataset records
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DatasetSettings {
    pub row_file: PathBuf,
    pub ledger_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GeneratorSettings {
    /// Fixed RNG seed for reproducible datasets
    #[serde(default)]
    pub seed: Option<u64>,
    /// Number of regex samples drawn when picking a rare production
    pub pattern_draws: usize,
    /// Chance that an optional field is left empty in a correct value
    pub optional_empty_probability: f64,
    /// Upper bound for unbounded regex repetition (`*`, `+`, `{n,}`)
    pub max_repeat: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResolverSettings {
    /// Minimum score for a fuzzy placeholder match
    pub match_threshold: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            row_file: PathBuf::from("data/dataset.csv"),
            ledger_file: PathBuf::from("data/usage_ledger.json"),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            seed: None,
            pattern_draws: 100,
            optional_empty_probability: 0.1,
            max_repeat: 10,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            match_threshold: 0.75,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset: DatasetSettings::default(),
            generator: GeneratorSettings::default(),
            resolver: ResolverSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Load `formseed.{toml,yaml,json}` from `root`, then apply
    /// `FORMSEED__SECTION__KEY` environment overrides.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let config_path = root.as_ref().join("formseed");
        Self::build(File::from(config_path).required(false))
    }

    /// Load from an explicit file path (which must exist).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(source: S) -> Result<Self, anyhow::Error>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Settings::default();
        let s = Config::builder()
            .set_default(
                "dataset.row_file",
                defaults.dataset.row_file.to_string_lossy().to_string(),
            )?
            .set_default(
                "dataset.ledger_file",
                defaults.dataset.ledger_file.to_string_lossy().to_string(),
            )?
            .set_default("generator.pattern_draws", defaults.generator.pattern_draws as i64)?
            .set_default(
                "generator.optional_empty_probability",
                defaults.generator.optional_empty_probability,
            )?
            .set_default("generator.max_repeat", defaults.generator.max_repeat as i64)?
            .set_default("resolver.match_threshold", defaults.resolver.match_threshold)?
            .set_default("logging.level", defaults.logging.level)?
            .add_source(source)
            .add_source(Environment::with_prefix("FORMSEED").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(settings)
    }
}
