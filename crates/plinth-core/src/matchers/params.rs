//! Route / query parameter matching with AND, OR and NOT combinators
//!
//! - `{ "id": 5, "slug": "x" }`: every key must match (AND)
//! - `{ "any": [ {..}, {..} ] }`: at least one pattern must match (OR)
//! - `{ "not": {..} }`: the inner pattern must not match
//!
//! Parameter values come from URLs, so values compare string-wise.

use super::value::{combinator, matches_value, validate_value_spec, Comparison};
use crate::types::Value;
use std::collections::HashMap;

/// Match `actual` parameters against a params spec
pub fn match_params(spec: &Value, actual: &HashMap<String, Value>) -> bool {
    let Value::Object(map) = spec else {
        return false;
    };

    if let Some(inner) = combinator(map, "any") {
        return match inner {
            Value::Array(options) => options.iter().any(|o| match_params(o, actual)),
            other => match_params(other, actual),
        };
    }

    if let Some(inner) = combinator(map, "not") {
        return !match_params(inner, actual);
    }

    map.iter()
        .all(|(key, expected)| matches_value(actual.get(key), expected, Comparison::StringWise))
}

/// Check that a params spec is well formed
pub fn validate_params(spec: &Value) -> Result<(), String> {
    let Value::Object(map) = spec else {
        return Err(format!("must be an object, got {}", spec.type_name()));
    };

    if let Some(inner) = combinator(map, "any") {
        let Value::Array(options) = inner else {
            return Err("\"any\" must be an array of parameter objects".to_string());
        };
        if options.is_empty() {
            return Err("\"any\" must list at least one parameter object".to_string());
        }
        return options.iter().try_for_each(validate_params);
    }

    if let Some(inner) = combinator(map, "not") {
        return validate_params(inner);
    }

    map.iter().try_for_each(|(key, expected)| {
        validate_value_spec(expected).map_err(|e| format!("parameter \"{}\": {}", key, e))
    })
}
