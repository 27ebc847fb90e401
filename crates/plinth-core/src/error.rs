//! Error types for Plinth
//!
//! Every failure the engine raises is a [`BlockError`]: an [`ErrorKind`] from
//! the taxonomy below plus optional structural context (the path of the
//! offending key, the rule tree it lives in, and the call site that raised it
//! in debug builds).

use crate::diagnostics::{format_tree, ErrorPath};
use crate::types::Value;
use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// Which registry an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Block,
    Outlet,
    ConditionType,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::Block => f.write_str("block"),
            RegistryKind::Outlet => f.write_str("outlet"),
            RegistryKind::ConditionType => f.write_str("condition type"),
        }
    }
}

/// Error taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Registration attempted after the registry was frozen
    #[error("cannot register {kind} \"{name}\": the {kind} registry is frozen")]
    RegistryFrozen { kind: RegistryKind, name: String },

    /// Name does not have a valid shape
    #[error("invalid {kind} name \"{name}\": {reason}")]
    InvalidName {
        kind: RegistryKind,
        name: String,
        reason: String,
    },

    /// Block implementation is unusable (e.g. has no name)
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    /// A block reference passed to resolution is unusable
    #[error("invalid block reference: {0}")]
    InvalidReference(String),

    /// Name already registered
    #[error("{kind} \"{name}\" is already registered")]
    DuplicateName { kind: RegistryKind, name: String },

    /// Block name not present in the registry
    #[error("block \"{name}\" is not registered")]
    UnregisteredBlock { name: String },

    /// Factory produced a block with a different name
    #[error("factory registered as \"{expected}\" resolved to a block named \"{actual}\"")]
    NameMismatch { expected: String, actual: String },

    /// Registering source used the wrong namespace
    #[error("namespace violation for \"{name}\" registered by {origin}: {reason}")]
    NamespaceViolation {
        name: String,
        origin: String,
        reason: String,
    },

    /// Condition was not produced by the condition decorator
    #[error("condition type \"{name}\" was not produced by the condition decorator")]
    NotDecorated { name: String },

    /// Condition decorator configuration is malformed
    #[error("invalid condition config for \"{type_name}\": {message}")]
    InvalidConditionConfig { type_name: String, message: String },

    /// Condition arguments failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Block factory failed (memoized)
    #[error("block \"{name}\" failed to resolve: {message}")]
    ResolutionFailure { name: String, message: String },
}

/// Argument validation failure raised by a condition's `validate`
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// What is wrong
    pub message: String,
    /// Argument key the failure refers to, if any
    pub key: Option<String>,
    /// "Did you mean" suggestion, if any
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: None,
            suggestion: None,
        }
    }

    /// Attach the argument key the failure refers to
    pub fn at(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " Did you mean \"{}\"?", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Structural context attached to an error
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorContext {
    /// Location of the failure inside the rule/block tree
    pub path: Option<ErrorPath>,
    /// The tree the path points into
    pub tree: Option<Value>,
    /// Where the error was raised (debug builds only)
    pub call_site: Option<&'static Location<'static>>,
}

/// Engine error: a kind plus diagnostics context
#[derive(Debug, Clone, PartialEq)]
pub struct BlockError {
    kind: ErrorKind,
    context: ErrorContext,
}

impl BlockError {
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        let call_site = if cfg!(debug_assertions) {
            Some(Location::caller())
        } else {
            None
        };

        let path = match &kind {
            ErrorKind::Validation(err) => err.key.as_ref().map(|k| ErrorPath::new().key(k)),
            _ => None,
        };

        Self {
            kind,
            context: ErrorContext {
                path,
                tree: None,
                call_site,
            },
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn path(&self) -> Option<&ErrorPath> {
        self.context.path.as_ref()
    }

    pub fn tree(&self) -> Option<&Value> {
        self.context.tree.as_ref()
    }

    pub fn call_site(&self) -> Option<&'static Location<'static>> {
        self.context.call_site
    }

    pub fn with_path(mut self, path: ErrorPath) -> Self {
        self.context.path = Some(path);
        self
    }

    /// Prepend `prefix` to the current path (used while unwinding nested trees)
    pub fn prefix_path(mut self, prefix: &ErrorPath) -> Self {
        let current = self.context.path.take().unwrap_or_default();
        self.context.path = Some(prefix.join(&current));
        self
    }

    /// Attach the tree the path points into
    pub fn with_tree(mut self, tree: Value) -> Self {
        self.context.tree = Some(tree);
        self
    }

    /// Multi-line human report: message, location, annotated tree, call site
    pub fn report(&self) -> String {
        let mut out = self.kind.to_string();

        if let Some(path) = self.path().filter(|p| !p.is_empty()) {
            out.push_str(&format!("\n  at: {}", path));
        }

        if let Some(tree) = self.tree() {
            let path = self.context.path.clone().unwrap_or_default();
            let note = match &self.kind {
                ErrorKind::Validation(err) => err.message.as_str(),
                _ => "here",
            };
            for line in format_tree(tree, &path, note).lines() {
                out.push_str("\n    ");
                out.push_str(line);
            }
        }

        if let Some(location) = self.call_site() {
            out.push_str(&format!("\n  raised at {}", location));
        }

        out
    }
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(path) = self.path().filter(|p| !p.is_empty()) {
            write!(f, " (at {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for BlockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ErrorKind> for BlockError {
    #[track_caller]
    fn from(kind: ErrorKind) -> Self {
        BlockError::new(kind)
    }
}

impl From<ValidationError> for BlockError {
    #[track_caller]
    fn from(err: ValidationError) -> Self {
        BlockError::new(ErrorKind::Validation(err))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, BlockError>;
