//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level when it is set and valid.
//! Output goes to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::error::TwcorrError;
use crate::domain::settings::{LogFormat, LogSettings};

pub fn env_filter(level: &str) -> Result<EnvFilter, TwcorrError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| TwcorrError::config_invalid("logging", "level", e.to_string()))
}

pub fn init_logging(settings: &LogSettings) -> Result<(), TwcorrError> {
    let filter = env_filter(&settings.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match settings.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| TwcorrError::Io(std::io::Error::other(e)))?;

    tracing::debug!(format = ?settings.format, level = %settings.level, "logging initialized");
    Ok(())
}
