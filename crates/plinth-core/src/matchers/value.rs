//! Generic value matching
//!
//! Expected-value specs understand a small vocabulary:
//! - a primitive: equality with the actual value
//! - `/pattern/flags`: regular expression test against the actual value
//! - an array: OR over its elements
//! - `{ "any": [...] }`: OR over the listed specs
//! - `{ "not": spec }`: negation

use super::pattern::{compile_regex_literal, is_regex_literal, regex_literal_matches};
use crate::types::Value;
use std::collections::HashMap;

/// How primitive values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `1` and `"1"` differ
    Strict,
    /// Values are compared through their string rendering
    StringWise,
}

/// Returns the payload of a single-key combinator object (`{"not": x}`)
pub(crate) fn combinator<'a>(map: &'a HashMap<String, Value>, key: &str) -> Option<&'a Value> {
    if map.len() == 1 {
        map.get(key)
    } else {
        None
    }
}

/// Match `actual` (absent when `None`) against an expected-value spec
pub fn matches_value(actual: Option<&Value>, expected: &Value, mode: Comparison) -> bool {
    match expected {
        Value::Array(options) => options.iter().any(|o| matches_value(actual, o, mode)),
        Value::Object(map) => {
            if let Some(inner) = combinator(map, "not") {
                !matches_value(actual, inner, mode)
            } else if let Some(inner) = combinator(map, "any") {
                matches_value(actual, inner, mode)
            } else {
                actual == Some(expected)
            }
        }
        Value::String(pattern) if is_regex_literal(pattern) => match actual {
            Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
                regex_literal_matches(pattern, &v.to_compare_string())
            }
            _ => false,
        },
        _ => match (actual, mode) {
            (None, _) => false,
            (Some(actual), Comparison::Strict) => actual == expected,
            (Some(actual @ (Value::Array(_) | Value::Object(_))), Comparison::StringWise) => {
                actual == expected
            }
            (Some(actual), Comparison::StringWise) => {
                actual.to_compare_string() == expected.to_compare_string()
            }
        },
    }
}

/// Check that an expected-value spec is well formed (regexes compile,
/// combinators carry payloads).
pub fn validate_value_spec(expected: &Value) -> Result<(), String> {
    match expected {
        Value::Array(options) => {
            if options.is_empty() {
                return Err("an OR-array of values must not be empty".to_string());
            }
            options.iter().try_for_each(validate_value_spec)
        }
        Value::Object(map) => {
            if let Some(inner) = combinator(map, "not") {
                validate_value_spec(inner)
            } else if let Some(inner) = combinator(map, "any") {
                match inner {
                    Value::Array(_) => validate_value_spec(inner),
                    other => Err(format!(
                        "\"any\" must be an array of values, got {}",
                        other.type_name()
                    )),
                }
            } else {
                Ok(())
            }
        }
        Value::String(pattern) if is_regex_literal(pattern) => compile_regex_literal(pattern)
            .map(|_| ())
            .map_err(|e| format!("invalid regular expression {}: {}", pattern, e)),
        _ => Ok(()),
    }
}
