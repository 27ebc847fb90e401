//! Engine configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! `config/plinth.{toml,json,yaml}` file and `PLINTH_*` environment variables
//! (a `.env` file is loaded first when present).

use crate::error::Result;
use plinth_core::diagnostics::Environment;
use plinth_runtime::registry::DEFAULT_OUTLETS;
use serde::{Deserialize, Serialize};
use std::path::Path;

const CONFIG_FILE: &str = "config/plinth";
const ENV_PREFIX: &str = "PLINTH";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether registration errors are raised or reported
    pub environment: Environment,

    /// Log every condition evaluated while rendering outlets
    pub debug: bool,

    /// Default tracing filter level when `RUST_LOG` is unset
    pub log_level: String,

    pub log_format: LogFormat,

    /// Built-in outlet names
    pub outlets: Vec<String>,
}

impl EngineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            environment: Environment::Development,
            debug: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            outlets: DEFAULT_OUTLETS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Load configuration from `.env`, the config file and the environment
    ///
    /// Falls back to defaults when the sources cannot be read.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>());

        match config_result {
            Ok(config) => config,
            Err(e) => {
                tracing::info!("Using default configuration ({})", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file; errors are returned
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file {} not found", path.display()),
            )
            .into());
        }

        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Enable condition-trace logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Replace the built-in outlet names
    pub fn with_outlets<I, S>(mut self, outlets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlets = outlets.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
