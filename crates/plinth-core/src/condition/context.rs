//! Evaluation context handed to conditions by the orchestrator

use crate::types::Value;
use std::sync::Arc;

/// Per-render context owned by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    /// Arguments the outlet passed to its blocks (an object), shared by nested contexts
    pub outlet_args: Arc<Value>,
    /// Debug tooling enabled (conditions may be evaluated more than once)
    pub debug: bool,
    /// Nesting depth inside a condition tree, for diagnostics
    pub depth: usize,
}

impl EvaluationContext {
    pub fn new(outlet_args: impl Into<Value>) -> Self {
        Self {
            outlet_args: Arc::new(outlet_args.into()),
            debug: false,
            depth: 0,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Copy of this context one level deeper
    pub fn nested(&self) -> Self {
        Self {
            outlet_args: Arc::clone(&self.outlet_args),
            debug: self.debug,
            depth: self.depth + 1,
        }
    }

    /// Null-safe dotted-path lookup in the outlet arguments
    pub fn outlet_arg(&self, path: &str) -> Option<&Value> {
        self.outlet_args.get_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_shares_outlet_args() {
        let ctx = EvaluationContext::new(Value::from("args")).with_debug(true);
        let nested = ctx.nested().nested();

        assert!(Arc::ptr_eq(&ctx.outlet_args, &nested.outlet_args));
        assert_eq!(nested.depth, 2);
        assert!(nested.debug);
    }
}
