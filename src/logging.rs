//! Tracing subscriber setup for hosts that embed the engine.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install a global fmt subscriber. `RUST_LOG` takes precedence over
/// `settings.level`. Fails if a global subscriber is already set.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
