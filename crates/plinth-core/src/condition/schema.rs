//! Declarative argument schemas and cross-argument constraints
//!
//! Each argument a condition accepts is described by an [`ArgSpec`]; an empty
//! spec accepts any value. Constraints relate several arguments to each other
//! (`exactlyOne`, `atLeastOne`, `atMostOne`, `allOrNone`).

use crate::diagnostics::{did_you_mean, format_value};
use crate::error::ValidationError;
use crate::types::{Args, Value};
use std::fmt;

/// Keys understood inside a declarative argument spec
const SPEC_KEYS: &[&str] = &[
    "type",
    "required",
    "min",
    "max",
    "integer",
    "enum",
    "items",
    "minLength",
    "maxLength",
];

/// Value kind an argument accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgKind {
    #[default]
    Any,
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ArgKind {
    const NAMES: [&'static str; 6] = ["any", "string", "number", "boolean", "array", "object"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArgKind::Any => "any",
            ArgKind::String => "string",
            ArgKind::Number => "number",
            ArgKind::Boolean => "boolean",
            ArgKind::Array => "array",
            ArgKind::Object => "object",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "any" => Some(ArgKind::Any),
            "string" => Some(ArgKind::String),
            "number" => Some(ArgKind::Number),
            "boolean" => Some(ArgKind::Boolean),
            "array" => Some(ArgKind::Array),
            "object" => Some(ArgKind::Object),
            _ => None,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ArgKind::Any, _)
                | (ArgKind::String, Value::String(_))
                | (ArgKind::Number, Value::Number(_))
                | (ArgKind::Boolean, Value::Bool(_))
                | (ArgKind::Array, Value::Array(_))
                | (ArgKind::Object, Value::Object(_))
        )
    }
}

/// Declared shape of one argument
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub required: bool,
    /// Inclusive numeric lower bound
    pub min: Option<f64>,
    /// Inclusive numeric upper bound
    pub max: Option<f64>,
    /// Numbers must be whole
    pub integer: bool,
    /// Allowed values
    pub enum_values: Option<Vec<Value>>,
    /// Kind of each array item
    pub item_kind: Option<ArgKind>,
    /// Minimum string / array length
    pub min_length: Option<usize>,
    /// Maximum string / array length
    pub max_length: Option<usize>,
}

impl ArgSpec {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of(kind: ArgKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of(ArgKind::String)
    }

    pub fn number() -> Self {
        Self::of(ArgKind::Number)
    }

    pub fn integer() -> Self {
        Self {
            integer: true,
            ..Self::of(ArgKind::Number)
        }
    }

    pub fn boolean() -> Self {
        Self::of(ArgKind::Boolean)
    }

    pub fn array() -> Self {
        Self::of(ArgKind::Array)
    }

    pub fn object() -> Self {
        Self::of(ArgKind::Object)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn one_of<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn items(mut self, kind: ArgKind) -> Self {
        self.item_kind = Some(kind);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Parse a declarative spec such as `{"type": "number", "min": 0, "max": 4}`
    pub fn from_value(name: &str, spec: &Value) -> Result<Self, String> {
        let Value::Object(map) = spec else {
            return Err(format!(
                "schema for argument \"{}\" must be an object, got {}",
                name,
                spec.type_name()
            ));
        };

        for key in map.keys() {
            if !SPEC_KEYS.contains(&key.as_str()) {
                let mut message =
                    format!("unknown key \"{}\" in schema for argument \"{}\".", key, name);
                if let Some(s) = did_you_mean(key, SPEC_KEYS.iter().copied()) {
                    message.push_str(&format!(" Did you mean \"{}\"?", s));
                }
                return Err(message);
            }
        }

        let kind_of = |key: &str| -> Result<Option<ArgKind>, String> {
            match map.get(key) {
                None => Ok(None),
                Some(Value::String(kind)) => ArgKind::parse(kind).map(Some).ok_or_else(|| {
                    let mut message =
                        format!("argument \"{}\" has unknown {} \"{}\".", name, key, kind);
                    if let Some(s) = did_you_mean(kind, ArgKind::NAMES) {
                        message.push_str(&format!(" Did you mean \"{}\"?", s));
                    }
                    message
                }),
                Some(other) => Err(format!(
                    "\"{}\" of argument \"{}\" must be a string, got {}",
                    key,
                    name,
                    other.type_name()
                )),
            }
        };

        let flag = |key: &str| -> Result<bool, String> {
            match map.get(key) {
                None => Ok(false),
                Some(Value::Bool(b)) => Ok(*b),
                Some(other) => Err(format!(
                    "\"{}\" of argument \"{}\" must be a boolean, got {}",
                    key,
                    name,
                    other.type_name()
                )),
            }
        };

        let number = |key: &str| -> Result<Option<f64>, String> {
            match map.get(key) {
                None => Ok(None),
                Some(Value::Number(n)) => Ok(Some(*n)),
                Some(other) => Err(format!(
                    "\"{}\" of argument \"{}\" must be a number, got {}",
                    key,
                    name,
                    other.type_name()
                )),
            }
        };

        let length = |key: &str| -> Result<Option<usize>, String> {
            match map.get(key) {
                None => Ok(None),
                Some(v) => v
                    .as_i64()
                    .filter(|n| *n >= 0)
                    .map(|n| Some(n as usize))
                    .ok_or_else(|| {
                        format!(
                            "\"{}\" of argument \"{}\" must be a non-negative integer",
                            key, name
                        )
                    }),
            }
        };

        let enum_values = match map.get("enum") {
            None => None,
            Some(Value::Array(values)) => Some(values.clone()),
            Some(other) => {
                return Err(format!(
                    "\"enum\" of argument \"{}\" must be an array, got {}",
                    name,
                    other.type_name()
                ))
            }
        };

        let spec = ArgSpec {
            kind: kind_of("type")?.unwrap_or_default(),
            required: flag("required")?,
            min: number("min")?,
            max: number("max")?,
            integer: flag("integer")?,
            enum_values,
            item_kind: kind_of("items")?,
            min_length: length("minLength")?,
            max_length: length("maxLength")?,
        };
        spec.check_coherent(name)?;
        Ok(spec)
    }

    /// Reject specs that can never be satisfied or mix unrelated options
    pub fn check_coherent(&self, name: &str) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(format!(
                    "argument \"{}\" declares min {} greater than max {}",
                    name, min, max
                ));
            }
        }
        if (self.min.is_some() || self.max.is_some() || self.integer)
            && !matches!(self.kind, ArgKind::Number | ArgKind::Any)
        {
            return Err(format!(
                "argument \"{}\" declares numeric bounds but has type {}",
                name,
                self.kind.as_str()
            ));
        }
        if self.item_kind.is_some() && self.kind != ArgKind::Array {
            return Err(format!(
                "argument \"{}\" declares item type but has type {}",
                name,
                self.kind.as_str()
            ));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(format!(
                    "argument \"{}\" declares minLength {} greater than maxLength {}",
                    name, min, max
                ));
            }
        }
        if matches!(&self.enum_values, Some(values) if values.is_empty()) {
            return Err(format!("argument \"{}\" declares an empty enum", name));
        }
        Ok(())
    }

    /// Validate one supplied argument value
    pub fn validate(&self, name: &str, value: &Value) -> Result<(), ValidationError> {
        let fail = |message: String| Err(ValidationError::new(message).at(name));

        if !self.kind.accepts(value) {
            return fail(format!(
                "argument \"{}\" must be of type {}, got {}.",
                name,
                self.kind.as_str(),
                value.type_name()
            ));
        }

        if let Value::Number(n) = value {
            if self.integer && n.fract() != 0.0 {
                return fail(format!("argument \"{}\" must be an integer, got {}.", name, n));
            }
            if let Some(min) = self.min.filter(|min| n < min) {
                return fail(format!("argument \"{}\" must be at least {}, got {}.", name, min, n));
            }
            if let Some(max) = self.max.filter(|max| n > max) {
                return fail(format!("argument \"{}\" must be at most {}, got {}.", name, max, n));
            }
        }

        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(len) = length {
            if let Some(min) = self.min_length.filter(|min| len < *min) {
                return fail(format!("argument \"{}\" must have length at least {}.", name, min));
            }
            if let Some(max) = self.max_length.filter(|max| len > *max) {
                return fail(format!("argument \"{}\" must have length at most {}.", name, max));
            }
        }

        if let (Some(item_kind), Value::Array(items)) = (self.item_kind, value) {
            let mismatch = items.iter().enumerate().find(|(_, item)| !item_kind.accepts(item));
            if let Some((index, item)) = mismatch {
                return fail(format!(
                    "argument \"{}\" item {} must be of type {}, got {}.",
                    name,
                    index,
                    item_kind.as_str(),
                    item.type_name()
                ));
            }
        }

        if let Some(allowed) = &self.enum_values {
            if !allowed.contains(value) {
                let names: Vec<String> = allowed.iter().map(format_value).collect();
                let suggestion = value.as_str().and_then(|s| {
                    did_you_mean(s, allowed.iter().filter_map(Value::as_str))
                });
                return Err(ValidationError::new(format!(
                    "argument \"{}\" must be one of {}, got {}.",
                    name,
                    names.join(", "),
                    format_value(value)
                ))
                .at(name)
                .with_suggestion(suggestion));
            }
        }

        Ok(())
    }
}

/// Cross-argument constraint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    AtLeastOne,
    ExactlyOne,
    AtMostOne,
    AllOrNone,
}

impl ConstraintKind {
    pub const NAMES: [&'static str; 4] = ["atLeastOne", "exactlyOne", "atMostOne", "allOrNone"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::AtLeastOne => "atLeastOne",
            ConstraintKind::ExactlyOne => "exactlyOne",
            ConstraintKind::AtMostOne => "atMostOne",
            ConstraintKind::AllOrNone => "allOrNone",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "atLeastOne" => Some(ConstraintKind::AtLeastOne),
            "exactlyOne" => Some(ConstraintKind::ExactlyOne),
            "atMostOne" => Some(ConstraintKind::AtMostOne),
            "allOrNone" => Some(ConstraintKind::AllOrNone),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint over a named subset of arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub args: Vec<String>,
}

impl Constraint {
    pub fn new<S: Into<String>>(kind: ConstraintKind, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check(&self, args: &Args) -> Result<(), ValidationError> {
        let present: Vec<&str> = self
            .args
            .iter()
            .filter(|name| args.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        let listed = quote_list(self.args.iter().map(String::as_str));

        let failure = match self.kind {
            ConstraintKind::AtLeastOne if present.is_empty() => {
                Some(format!("at least one of {} must be provided.", listed))
            }
            ConstraintKind::ExactlyOne if present.len() != 1 => Some(if present.is_empty() {
                format!("exactly one of {} must be provided, but none was.", listed)
            } else {
                format!(
                    "exactly one of {} must be provided, but found {}.",
                    listed,
                    quote_list(present.iter().copied())
                )
            }),
            ConstraintKind::AtMostOne if present.len() > 1 => Some(format!(
                "at most one of {} may be provided, but found {}.",
                listed,
                quote_list(present.iter().copied())
            )),
            ConstraintKind::AllOrNone
                if !present.is_empty() && present.len() != self.args.len() =>
            {
                Some(format!(
                    "{} must be provided together, but only found {}.",
                    listed,
                    quote_list(present.iter().copied())
                ))
            }
            _ => None,
        };

        match failure {
            Some(message) => {
                let key = present.first().copied().unwrap_or(self.args[0].as_str());
                Err(ValidationError::new(message).at(key))
            }
            None => Ok(()),
        }
    }
}

fn quote_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(|n| format!("\"{}\"", n)).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_spec_from_value() {
        let spec = ArgSpec::from_value(
            "minTrustLevel",
            &parse(r#"{"type": "number", "integer": true, "min": 0, "max": 4}"#),
        )
        .unwrap();
        assert_eq!(spec, ArgSpec::integer().range(0.0, 4.0));

        assert_eq!(ArgSpec::from_value("anything", &parse("{}")).unwrap(), ArgSpec::any());
    }

    #[test]
    fn test_malformed_spec() {
        let err = ArgSpec::from_value("routes", &parse(r#"{"type": "aray"}"#)).unwrap_err();
        assert!(err.contains("Did you mean \"array\"?"));

        let err = ArgSpec::from_value("routes", &parse(r#"{"requird": true}"#)).unwrap_err();
        assert!(err.contains("Did you mean \"required\"?"));

        let inverted = parse(r#"{"type": "number", "min": 5, "max": 1}"#);
        assert!(ArgSpec::from_value("n", &inverted).is_err());
        assert!(ArgSpec::from_value("n", &parse(r#"{"type": "string", "min": 1}"#)).is_err());
        assert!(ArgSpec::from_value("n", &parse(r#"{"enum": []}"#)).is_err());
        let items_on_string = parse(r#"{"type": "string", "items": "string"}"#);
        assert!(ArgSpec::from_value("n", &items_on_string).is_err());
    }

    #[test]
    fn test_validate_value() {
        let spec = ArgSpec::integer().range(0.0, 4.0);
        assert!(spec.validate("minTrustLevel", &Value::Number(2.0)).is_ok());
        assert!(spec.validate("minTrustLevel", &Value::Number(2.5)).is_err());
        assert!(spec.validate("minTrustLevel", &Value::Number(7.0)).is_err());
        assert!(spec.validate("minTrustLevel", &Value::from("2")).is_err());

        let items = ArgSpec::array().items(ArgKind::String);
        let err = items.validate("groups", &parse(r#"["a", 1]"#)).unwrap_err();
        assert!(err.message.contains("item 1"));
        assert_eq!(err.key.as_deref(), Some("groups"));
    }

    #[test]
    fn test_enum_suggestion() {
        let spec = ArgSpec::string().one_of(["sm", "md", "lg", "xl", "2xl"]);
        let err = spec.validate("min", &Value::from("lgg")).unwrap_err();
        assert_eq!(err.suggestion.as_deref(), Some("lg"));
    }

    #[test]
    fn test_constraints() {
        let exactly = Constraint::new(ConstraintKind::ExactlyOne, ["routes", "excludeRoutes"]);
        assert!(exactly.check(&args(r#"{"routes": []}"#)).is_ok());
        assert!(exactly.check(&args("{}")).is_err());
        assert!(exactly.check(&args(r#"{"routes": [], "excludeRoutes": []}"#)).is_err());

        let at_most = Constraint::new(ConstraintKind::AtMostOne, ["value", "exists"]);
        assert!(at_most.check(&args(r#"{"value": 1}"#)).is_ok());
        assert!(at_most.check(&args(r#"{"value": 1, "exists": true}"#)).is_err());

        let at_least = Constraint::new(ConstraintKind::AtLeastOne, ["a", "b"]);
        assert!(at_least.check(&args(r#"{"b": 1}"#)).is_ok());
        assert!(at_least.check(&args("{}")).is_err());

        let together = Constraint::new(ConstraintKind::AllOrNone, ["a", "b"]);
        assert!(together.check(&args("{}")).is_ok());
        assert!(together.check(&args(r#"{"a": 1, "b": 2}"#)).is_ok());
        let err = together.check(&args(r#"{"a": 1}"#)).unwrap_err();
        assert_eq!(err.key.as_deref(), Some("a"));
    }
}
