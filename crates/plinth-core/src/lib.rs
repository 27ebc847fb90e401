//! Plinth Core - Core types and contracts for the Plinth block engine
//!
//! This crate provides the pieces shared by every layer of the engine:
//! - `Value`, the dynamic type for arguments, settings and metadata
//! - The error taxonomy and its diagnostics (paths, annotated trees, reporter)
//! - Pattern matchers used by the built-in conditions
//! - The condition contract, argument schema and registration decorator

pub mod condition;
pub mod diagnostics;
pub mod error;
pub mod matchers;
pub mod types;

// Re-export commonly used types
pub use condition::{
    decorate, Condition, ConditionConfig, ConditionDefinition, ConditionHandler, DecoratedCondition,
    EvaluationContext, SourceLookup, SourceType,
};
pub use diagnostics::{Environment, ErrorNotifier, ErrorReporter};
pub use error::{BlockError, ErrorKind, RegistryKind, Result, ValidationError};
pub use types::{Args, Value};
