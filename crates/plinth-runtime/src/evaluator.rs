//! Condition-tree evaluator
//!
//! A block's `conditions` value is one of:
//! - `{ "type": "<name>", ...args }`: a single condition
//! - `[spec, spec, ...]`: every spec must pass (AND)
//! - `{ "any": [spec, ...] }`: at least one spec must pass (OR)
//! - `{ "not": spec }`: the inner spec must fail
//!
//! Validation errors carry the structural path of the offending key and the
//! whole tree, so [`BlockError::report`] can point at the exact entry.

use crate::registry::ConditionTypeRegistry;
use plinth_core::condition::EvaluationContext;
use plinth_core::diagnostics::{did_you_mean, format_value, ErrorPath};
use plinth_core::error::{BlockError, ErrorKind, Result, ValidationError};
use plinth_core::types::{Args, Value};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

const ANY_KEY: &str = "any";
const NOT_KEY: &str = "not";
const TYPE_KEY: &str = "type";

/// One evaluated node of a condition tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    /// Nesting depth, 0 for the root
    pub depth: usize,
    /// Condition type, or `all` / `any` / `not` for combinators
    pub condition_type: String,
    /// Arguments of a leaf condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
    /// Value the condition looked at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<Value>,
    pub passed: bool,
}

/// Result of a traced evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationTrace {
    pub passed: bool,
    /// Entries in evaluation order
    pub entries: Vec<TraceEntry>,
}

enum Node<'a> {
    All(&'a [Value]),
    Any(&'a Value),
    Not(&'a Value),
    Leaf(&'a HashMap<String, Value>),
}

fn classify(spec: &Value) -> Option<Node<'_>> {
    match spec {
        Value::Array(items) => Some(Node::All(items)),
        Value::Object(map) if map.len() == 1 && map.contains_key(ANY_KEY) => {
            map.get(ANY_KEY).map(Node::Any)
        }
        Value::Object(map) if map.len() == 1 && map.contains_key(NOT_KEY) => {
            map.get(NOT_KEY).map(Node::Not)
        }
        Value::Object(map) => Some(Node::Leaf(map)),
        _ => None,
    }
}

fn leaf_args(map: &HashMap<String, Value>) -> Args {
    map.iter()
        .filter(|(key, _)| key.as_str() != TYPE_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[track_caller]
fn invalid(path: ErrorPath, error: ValidationError) -> BlockError {
    BlockError::new(ErrorKind::Validation(error)).with_path(path)
}

/// Validates and evaluates condition trees against registered condition types
#[derive(Debug, Clone)]
pub struct ConditionEvaluator {
    registry: ConditionTypeRegistry,
}

impl ConditionEvaluator {
    pub fn new(registry: ConditionTypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConditionTypeRegistry {
        &self.registry
    }

    /// Validate every condition in the tree
    pub fn validate(&self, spec: &Value) -> Result<()> {
        self.validate_node(spec, ErrorPath::new())
            .map_err(|err| err.with_tree(spec.clone()))
    }

    fn validate_node(&self, spec: &Value, path: ErrorPath) -> Result<()> {
        let Some(node) = classify(spec) else {
            return Err(invalid(
                path,
                ValidationError::new(format!(
                    "expected a condition object, an array, {{ any: [...] }} or {{ not: ... }}, \
                         got {}.",
                    spec.type_name()
                )),
            ));
        };

        match node {
            Node::All(items) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| self.validate_node(item, path.clone().index(i))),
            Node::Any(Value::Array(items)) => {
                if items.is_empty() {
                    return Err(invalid(
                        path.key(ANY_KEY),
                        ValidationError::new("\"any\" must list at least one condition."),
                    ));
                }
                items
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, item)| {
                        self.validate_node(item, path.clone().key(ANY_KEY).index(i))
                    })
            }
            Node::Any(other) => Err(invalid(
                path.key(ANY_KEY),
                ValidationError::new(format!(
                    "\"any\" must be an array, got {}.",
                    other.type_name()
                )),
            )),
            Node::Not(inner) => self.validate_node(inner, path.key(NOT_KEY)),
            Node::Leaf(map) => self.validate_leaf(map, path),
        }
    }

    fn validate_leaf(&self, map: &HashMap<String, Value>, path: ErrorPath) -> Result<()> {
        let type_name = match map.get(TYPE_KEY) {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(invalid(
                    path.key(TYPE_KEY),
                    ValidationError::new(format!(
                        "\"type\" must be a string, got {}.",
                        other.type_name()
                    )),
                ))
            }
            None => {
                return Err(invalid(
                    path.key(TYPE_KEY),
                    ValidationError::new("condition is missing its \"type\"."),
                ))
            }
        };

        let Some(condition) = self.registry.get_condition_type(type_name) else {
            let known = self.registry.type_names();
            let suggestion = did_you_mean(type_name, known.iter().map(String::as_str));
            return Err(invalid(
                path.key(TYPE_KEY),
                ValidationError::new(format!(
                    "unknown condition type \"{}\". Registered types: {}.",
                    type_name,
                    known.join(", ")
                ))
                .with_suggestion(suggestion),
            ));
        };

        condition
            .validate(&leaf_args(map))
            .map_err(|err| BlockError::from(err).prefix_path(&path))
    }

    /// Evaluate the tree; unknown condition types evaluate to false
    pub fn evaluate(&self, spec: &Value, ctx: &EvaluationContext) -> bool {
        Walk {
            registry: &self.registry,
            trace: None,
        }
        .eval(spec, ctx)
    }

    /// Evaluate the tree and record every node visited
    pub fn evaluate_with_trace(&self, spec: &Value, ctx: &EvaluationContext) -> EvaluationTrace {
        let mut walk = Walk {
            registry: &self.registry,
            trace: Some(Vec::new()),
        };
        let passed = walk.eval(spec, ctx);
        EvaluationTrace {
            passed,
            entries: walk.trace.unwrap_or_default(),
        }
    }
}

struct Walk<'a> {
    registry: &'a ConditionTypeRegistry,
    trace: Option<Vec<TraceEntry>>,
}

impl Walk<'_> {
    fn eval(&mut self, spec: &Value, ctx: &EvaluationContext) -> bool {
        let Some(node) = classify(spec) else {
            debug!("Ignoring malformed condition {}", format_value(spec));
            return false;
        };

        match node {
            Node::All(items) => {
                let slot = self.open("all", ctx);
                let nested = ctx.nested();
                let passed = items.iter().all(|item| self.eval(item, &nested));
                self.close(slot, "all", passed, ctx)
            }
            Node::Any(inner) => {
                let slot = self.open(ANY_KEY, ctx);
                let nested = ctx.nested();
                let passed = match inner {
                    Value::Array(items) => items.iter().any(|item| self.eval(item, &nested)),
                    other => self.eval(other, &nested),
                };
                self.close(slot, ANY_KEY, passed, ctx)
            }
            Node::Not(inner) => {
                let slot = self.open(NOT_KEY, ctx);
                let passed = !self.eval(inner, &ctx.nested());
                self.close(slot, NOT_KEY, passed, ctx)
            }
            Node::Leaf(map) => self.leaf(map, ctx),
        }
    }

    fn leaf(&mut self, map: &HashMap<String, Value>, ctx: &EvaluationContext) -> bool {
        let type_name = map.get(TYPE_KEY).and_then(Value::as_str).unwrap_or_default();
        let args = leaf_args(map);

        let (passed, condition) = match self.registry.get_condition_type(type_name) {
            Some(condition) => (condition.evaluate(&args, ctx), Some(condition)),
            None => {
                debug!("Unknown condition type \"{}\" evaluates to false", type_name);
                (false, None)
            }
        };

        if ctx.debug {
            let rendered = format_value(&Value::Object(args.clone()));
            debug!(
                "{:indent$}{} {} {}",
                "",
                if passed { "✓" } else { "✗" },
                type_name,
                rendered,
                indent = ctx.depth * 2
            );
        }

        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceEntry {
                depth: ctx.depth,
                condition_type: type_name.to_string(),
                resolved_value: condition.and_then(|c| c.resolved_value_for_logging(&args, ctx)),
                args: Some(args),
                passed,
            });
        }

        passed
    }

    /// Reserve a trace slot for a combinator so it precedes its children
    fn open(&mut self, kind: &str, ctx: &EvaluationContext) -> Option<usize> {
        let trace = self.trace.as_mut()?;
        trace.push(TraceEntry {
            depth: ctx.depth,
            condition_type: kind.to_string(),
            args: None,
            resolved_value: None,
            passed: false,
        });
        Some(trace.len() - 1)
    }

    fn close(
        &mut self,
        slot: Option<usize>,
        kind: &str,
        passed: bool,
        ctx: &EvaluationContext,
    ) -> bool {
        if let (Some(index), Some(trace)) = (slot, self.trace.as_mut()) {
            trace[index].passed = passed;
        }
        if ctx.debug {
            debug!(
                "{:indent$}{} {}",
                "",
                if passed { "✓" } else { "✗" },
                kind,
                indent = ctx.depth * 2
            );
        }
        passed
    }
}
