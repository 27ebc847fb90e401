//! Condition contract
//!
//! A condition type is authored as a [`ConditionHandler`] and registered via
//! [`decorate`], which checks its declared config and produces a
//! [`DecoratedCondition`]. The registry and evaluator only see the
//! object-safe [`Condition`] trait.

pub mod context;
pub mod decorator;
pub mod schema;
pub mod source;

pub use context::EvaluationContext;
pub use decorator::{
    decorate, ConditionConfig, ConditionDefinition, CustomValidator, DecoratedCondition,
};
pub use schema::{ArgKind, ArgSpec, Constraint, ConstraintKind};
pub use source::{parse_context_path, SourceLookup, SourceType, CONTEXT_SOURCE_PREFIX, SOURCE_KEY};

use crate::error::ValidationError;
use crate::types::{Args, Value};
use std::fmt;

/// Author-provided body of a condition type
pub trait ConditionHandler: Send + Sync + 'static {
    /// Rule-specific checks beyond the declared schema
    fn validate(&self, _args: &Args) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Decide whether the condition passes; must be pure
    fn evaluate(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> bool;

    /// Value shown next to the condition in debug traces
    fn resolved_value_for_logging(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> Option<Value> {
        match definition.resolve_source(args, ctx) {
            SourceLookup::Resolved(value) => value,
            SourceLookup::Ambient => None,
        }
    }
}

/// Registry-facing condition
pub trait Condition: Send + Sync {
    fn type_name(&self) -> &str;

    /// Decorator-produced definition; `None` for conditions built by hand
    fn definition(&self) -> Option<&ConditionDefinition> {
        None
    }

    fn validate(&self, args: &Args) -> Result<(), ValidationError>;

    fn evaluate(&self, args: &Args, ctx: &EvaluationContext) -> bool;

    fn resolved_value_for_logging(&self, _args: &Args, _ctx: &EvaluationContext) -> Option<Value> {
        None
    }
}

impl fmt::Debug for dyn Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("type_name", &self.type_name())
            .field("decorated", &self.definition().is_some())
            .finish()
    }
}
