//! SDK error types

use plinth_core::error::BlockError;
use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration could not be read or deserialized
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Registry, validation or resolution error from the engine
    #[error("Block engine error: {0}")]
    EngineError(#[from] BlockError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    LoggingError(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::error::ErrorKind;

    #[test]
    fn test_engine_error_conversion() {
        let err: SdkError = BlockError::new(ErrorKind::UnregisteredBlock {
            name: "hero".to_string(),
        })
        .into();
        assert!(err.to_string().contains("Block engine error"));
        assert!(err.to_string().contains("\"hero\" is not registered"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SdkError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bad value"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SdkError = io_error.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_error_debug_format() {
        let err = SdkError::LoggingError("already set".to_string());
        assert!(format!("{:?}", err).contains("LoggingError"));
    }
}
