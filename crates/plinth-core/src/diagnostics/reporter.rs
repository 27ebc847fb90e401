//! Error reporting policy
//!
//! In development and test builds registration errors are returned to the
//! caller so they surface in CI. In production the same error is logged and
//! handed to an [`ErrorNotifier`] instead, so one misconfigured extension
//! cannot take the page down.

use crate::error::{BlockError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

/// Side channel receiving errors that are not raised
pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, error: &BlockError);
}

impl<F> ErrorNotifier for F
where
    F: Fn(&BlockError) + Send + Sync,
{
    fn notify(&self, error: &BlockError) {
        self(error)
    }
}

/// Decides whether an error is raised or dispatched as a notification
#[derive(Clone, Default)]
pub struct ErrorReporter {
    environment: Environment,
    notifier: Option<Arc<dyn ErrorNotifier>>,
}

impl ErrorReporter {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ErrorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Return `error` to the caller, or in production notify and swallow it
    pub fn raise(&self, error: BlockError) -> Result<()> {
        if self.is_production() {
            self.notify(&error);
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Log `error` and forward it to the notifier without raising
    pub fn notify(&self, error: &BlockError) {
        error!("{}", error.report());
        if let Some(notifier) = &self.notifier {
            notifier.notify(error);
        }
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("environment", &self.environment)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use parking_lot::Mutex;

    fn sample_error() -> BlockError {
        BlockError::new(ErrorKind::UnregisteredBlock {
            name: "hero".to_string(),
        })
    }

    #[test]
    fn test_development_raises() {
        let reporter = ErrorReporter::new(Environment::Development);
        let result = reporter.raise(sample_error());
        assert!(result.is_err());
    }

    #[test]
    fn test_production_notifies_instead_of_raising() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ErrorReporter::new(Environment::Production)
            .with_notifier(Arc::new(move |err: &BlockError| sink.lock().push(err.to_string())));

        assert!(reporter.raise(sample_error()).is_ok());
        assert_eq!(seen.lock().as_slice(), ["block \"hero\" is not registered".to_string()]);
    }
}
