// src/logging.rs - Tracing subscriber setup

//! Structured logging for the storefront. Console output honors the
//! configured env-filter directive; an optional non-blocking file layer can
//! be added on top. The returned guard must be held for as long as file
//! logging should keep flushing.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Keeps the background log writer alive; dropping it stops file flushing
#[derive(Default)]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("file_logging", &self._file_guard.is_some())
            .finish()
    }
}

/// Installs the global tracing subscriber from the logging configuration.
/// Fails if a subscriber is already installed for this process.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("invalid logging.level directive: {}", e)))?;

    let mut guard = LogGuard::default();

    let file_layer = match &config.file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "seftec-store.log".to_string());

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, file_guard) = tracing_appender::non_blocking(appender);
            guard._file_guard = Some(file_guard);

            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let installed = if config.json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| {
        Error::config(format!("failed to install tracing subscriber: {}", e))
    })?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_directive_is_rejected() {
        let config = LoggingConfig {
            level: "not==a==filter".to_string(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
