//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Call [`init_logging`] once at startup. `RUST_LOG` overrides the
//! configured level. The terminal front end should log to a file, since
//! stderr is hidden behind the alternate screen.

use crate::config::{LogFormat, LogSettings};
use crate::error::LoggingError;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the global subscriber described by `settings`.
///
/// # Errors
///
/// Fails if the log file cannot be opened, the level is not a valid filter
/// directive, or a subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = build_env_filter(&settings.level)?;

    let (writer, ansi) = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File {
                    path: path.clone(),
                    source,
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_ansi(ansi).with_writer(writer))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer))
            .try_init(),
    };

    installed.map_err(|_| LoggingError::AlreadyInitialised)
}

fn build_env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_env_filter("dex_board=loud").unwrap_err();
        assert!(matches!(err, LoggingError::Filter(_)));
    }

    #[test]
    fn test_valid_level_accepted() {
        assert!(build_env_filter("dex_board=debug,warn").is_ok());
    }
}
