//! Tracing subscriber setup

use crate::config::{EngineConfig, LogFormat};
use crate::error::{Result, SdkError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATES: [&str; 3] = ["plinth_sdk", "plinth_runtime", "plinth_core"];

/// Filter directive applying `level` to the engine's crates
pub fn default_filter(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber; `RUST_LOG` takes precedence over `default_filter`
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
    };

    result.map_err(|e| SdkError::LoggingError(format!("Failed to initialize tracing: {}", e)))
}

/// Install the global subscriber described by `config`
pub fn init_from_config(config: &EngineConfig) -> Result<()> {
    init_tracing(&default_filter(&config.log_level), config.log_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(
            default_filter("debug"),
            "plinth_sdk=debug,plinth_runtime=debug,plinth_core=debug"
        );
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_tracing("warn", LogFormat::Text);
        assert!(init_tracing("warn", LogFormat::Json).is_err());
    }
}
