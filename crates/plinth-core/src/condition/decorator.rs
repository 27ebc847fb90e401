//! Registration decorator
//!
//! [`decorate`] turns a [`ConditionConfig`] plus a [`ConditionHandler`] into a
//! [`DecoratedCondition`]. The config is checked once, up front, and frozen into
//! a [`ConditionDefinition`]; the condition-type registry refuses any
//! condition that does not carry one.

use super::context::EvaluationContext;
use super::schema::{ArgSpec, Constraint, ConstraintKind};
use super::source::{self, SourceLookup, SourceType, SOURCE_KEY};
use super::{Condition, ConditionHandler};
use crate::diagnostics::did_you_mean;
use crate::error::{BlockError, ErrorKind, Result, ValidationError};
use crate::types::{Args, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Top-level keys of a declarative condition config
const CONFIG_KEYS: &[&str] = &["type", "sourceType", "args", "constraints"];

/// Extra validation run after the schema and constraints pass
pub type CustomValidator =
    Arc<dyn Fn(&Args) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Declared shape of a condition type
#[derive(Clone, Default)]
pub struct ConditionConfig {
    type_name: String,
    source_type: SourceType,
    args: BTreeMap<String, ArgSpec>,
    constraints: Vec<Constraint>,
    validator: Option<CustomValidator>,
}

impl ConditionConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn arg(mut self, name: impl Into<String>, spec: ArgSpec) -> Self {
        self.args.insert(name.into(), spec);
        self
    }

    pub fn constraint<S: Into<String>>(
        mut self,
        kind: ConstraintKind,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        self.constraints.push(Constraint::new(kind, args));
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Args) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Parse a declarative config object:
    ///
    /// ```json
    /// {
    ///   "type": "user",
    ///   "sourceType": "outletArgs",
    ///   "args": { "minTrustLevel": { "type": "number", "integer": true } },
    ///   "constraints": { "atMostOne": ["admin", "moderator"] }
    /// }
    /// ```
    #[track_caller]
    pub fn from_value(config: &Value) -> Result<Self> {
        let type_name = config
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let invalid = |message: String| {
            BlockError::new(ErrorKind::InvalidConditionConfig {
                type_name: type_name.clone(),
                message,
            })
        };

        let Value::Object(map) = config else {
            return Err(invalid(format!("config must be an object, got {}", config.type_name())));
        };

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        for key in keys {
            if !CONFIG_KEYS.contains(&key.as_str()) {
                let mut message = format!("unknown config key \"{}\".", key);
                if let Some(s) = did_you_mean(key, CONFIG_KEYS.iter().copied()) {
                    message.push_str(&format!(" Did you mean \"{}\"?", s));
                }
                return Err(invalid(message));
            }
        }

        match map.get("type") {
            None => return Err(invalid("\"type\" is required".to_string())),
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(invalid(format!("\"type\" must be a string, got {}", other.type_name())))
            }
        }

        let source_type = match map.get("sourceType") {
            None => SourceType::None,
            Some(Value::String(name)) => SourceType::parse(name).map_err(invalid)?,
            Some(other) => {
                return Err(invalid(format!(
                    "\"sourceType\" must be a string, got {}",
                    other.type_name()
                )))
            }
        };

        let mut args = BTreeMap::new();
        match map.get("args") {
            None => {}
            Some(Value::Object(specs)) => {
                for (name, spec) in specs {
                    args.insert(name.clone(), ArgSpec::from_value(name, spec).map_err(invalid)?);
                }
            }
            Some(other) => {
                return Err(invalid(format!(
                    "\"args\" must be an object, got {}",
                    other.type_name()
                )))
            }
        }

        let mut constraints = Vec::new();
        match map.get("constraints") {
            None => {}
            Some(Value::Object(entries)) => {
                let mut kinds: Vec<&String> = entries.keys().collect();
                kinds.sort();
                for kind_name in kinds {
                    let Some(kind) = ConstraintKind::parse(kind_name) else {
                        let mut message = format!("unknown constraint \"{}\".", kind_name);
                        if let Some(s) = did_you_mean(kind_name, ConstraintKind::NAMES) {
                            message.push_str(&format!(" Did you mean \"{}\"?", s));
                        }
                        return Err(invalid(message));
                    };
                    let names = entries[kind_name]
                        .as_array()
                        .and_then(|items| {
                            items.iter().map(Value::as_str).collect::<Option<Vec<_>>>()
                        })
                        .ok_or_else(|| {
                            invalid(format!(
                                "constraint \"{}\" must be an array of argument names",
                                kind_name
                            ))
                        })?;
                    constraints.push(Constraint::new(kind, names));
                }
            }
            Some(other) => {
                return Err(invalid(format!(
                    "\"constraints\" must be an object, got {}",
                    other.type_name()
                )))
            }
        }

        Ok(Self {
            type_name,
            source_type,
            args,
            constraints,
            validator: None,
        })
    }
}

impl fmt::Debug for ConditionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionConfig")
            .field("type_name", &self.type_name)
            .field("source_type", &self.source_type)
            .field("args", &self.args)
            .field("constraints", &self.constraints)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

struct DefinitionInner {
    type_name: String,
    source_type: SourceType,
    schema: BTreeMap<String, ArgSpec>,
    constraints: Vec<Constraint>,
    validator: Option<CustomValidator>,
    valid_arg_keys: Vec<String>,
}

/// Immutable, decorator-produced description of a condition type
///
/// Cheap to clone; only [`decorate`] can create one.
#[derive(Clone)]
pub struct ConditionDefinition {
    inner: Arc<DefinitionInner>,
}

impl ConditionDefinition {
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn source_type(&self) -> SourceType {
        self.inner.source_type
    }

    pub fn schema(&self) -> &BTreeMap<String, ArgSpec> {
        &self.inner.schema
    }

    pub fn arg_spec(&self, name: &str) -> Option<&ArgSpec> {
        self.inner.schema.get(name)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.inner.constraints
    }

    /// Every accepted argument key, sorted; includes `source` when a source is accepted
    pub fn valid_arg_keys(&self) -> &[String] {
        &self.inner.valid_arg_keys
    }

    pub fn has_custom_validator(&self) -> bool {
        self.inner.validator.is_some()
    }

    /// Declarative validation: unknown keys, source, schema, constraints,
    /// then the custom validator
    pub fn validate_args(&self, args: &Args) -> std::result::Result<(), ValidationError> {
        let mut supplied: Vec<&String> = args.keys().collect();
        supplied.sort();
        for key in supplied {
            if !self.inner.valid_arg_keys.iter().any(|k| k == key) {
                let message = if self.inner.valid_arg_keys.is_empty() {
                    format!(
                        "unknown argument \"{}\": condition \"{}\" takes no arguments.",
                        key, self.inner.type_name
                    )
                } else {
                    format!(
                        "unknown argument \"{}\" for condition \"{}\". Valid arguments: {}.",
                        key,
                        self.inner.type_name,
                        self.inner.valid_arg_keys.join(", ")
                    )
                };
                let suggestion =
                    did_you_mean(key, self.inner.valid_arg_keys.iter().map(String::as_str));
                return Err(ValidationError::new(message)
                    .at(key.as_str())
                    .with_suggestion(suggestion));
            }
        }

        source::validate_source(self.inner.source_type, args)?;

        for (name, spec) in &self.inner.schema {
            match args.get(name) {
                Some(value) => spec.validate(name, value)?,
                None if spec.required => {
                    let message = format!("argument \"{}\" is required.", name);
                    return Err(ValidationError::new(message).at(name.as_str()));
                }
                None => {}
            }
        }

        for constraint in &self.inner.constraints {
            constraint.check(args)?;
        }

        if let Some(validator) = &self.inner.validator {
            validator(args)?;
        }

        Ok(())
    }

    /// Resolve the `source` argument against the evaluation context
    pub fn resolve_source(&self, args: &Args, ctx: &EvaluationContext) -> SourceLookup {
        source::resolve_source(self.inner.source_type, args, ctx)
    }
}

impl fmt::Debug for ConditionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionDefinition")
            .field("type_name", &self.inner.type_name)
            .field("source_type", &self.inner.source_type)
            .field("valid_arg_keys", &self.inner.valid_arg_keys)
            .field("constraints", &self.inner.constraints)
            .finish()
    }
}

/// A handler paired with its definition; the only [`Condition`] the registry accepts
pub struct DecoratedCondition<H> {
    definition: ConditionDefinition,
    handler: H,
}

impl<H: ConditionHandler> DecoratedCondition<H> {
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: ConditionHandler> Condition for DecoratedCondition<H> {
    fn type_name(&self) -> &str {
        self.definition.type_name()
    }

    fn definition(&self) -> Option<&ConditionDefinition> {
        Some(&self.definition)
    }

    fn validate(&self, args: &Args) -> std::result::Result<(), ValidationError> {
        self.definition.validate_args(args)?;
        self.handler.validate(args)
    }

    fn evaluate(&self, args: &Args, ctx: &EvaluationContext) -> bool {
        self.handler.evaluate(&self.definition, args, ctx)
    }

    fn resolved_value_for_logging(&self, args: &Args, ctx: &EvaluationContext) -> Option<Value> {
        self.handler.resolved_value_for_logging(&self.definition, args, ctx)
    }
}

impl<H> fmt::Debug for DecoratedCondition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedCondition")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Check `config` and attach the resulting definition to `handler`
#[track_caller]
pub fn decorate<H: ConditionHandler>(
    config: ConditionConfig,
    handler: H,
) -> Result<DecoratedCondition<H>> {
    let ConditionConfig {
        type_name,
        source_type,
        args: schema,
        constraints,
        validator,
    } = config;

    let invalid = |message: String| {
        BlockError::new(ErrorKind::InvalidConditionConfig {
            type_name: type_name.clone(),
            message,
        })
    };

    if type_name.trim().is_empty() {
        return Err(invalid("\"type\" must be a non-empty string".to_string()));
    }

    for (name, spec) in &schema {
        spec.check_coherent(name).map_err(invalid)?;
    }

    if source_type.accepts_source() && schema.contains_key(SOURCE_KEY) {
        return Err(invalid(format!(
            "argument \"{}\" is reserved for sourceType \"{}\"",
            SOURCE_KEY,
            source_type.as_str()
        )));
    }

    for constraint in &constraints {
        if constraint.args.len() < 2 {
            return Err(invalid(format!(
                "constraint \"{}\" must list at least two arguments",
                constraint.kind
            )));
        }
        if let Some(unknown) = constraint.args.iter().find(|a| !schema.contains_key(a.as_str())) {
            let mut message = format!(
                "constraint \"{}\" references unknown argument \"{}\".",
                constraint.kind, unknown
            );
            if let Some(s) = did_you_mean(unknown, schema.keys().map(String::as_str)) {
                message.push_str(&format!(" Did you mean \"{}\"?", s));
            }
            return Err(invalid(message));
        }
    }

    let mut valid_arg_keys: Vec<String> = schema.keys().cloned().collect();
    if source_type.accepts_source() {
        valid_arg_keys.push(SOURCE_KEY.to_string());
        valid_arg_keys.sort();
    }

    tracing::debug!(
        condition = %type_name,
        source_type = source_type.as_str(),
        "decorated condition type"
    );

    Ok(DecoratedCondition {
        definition: ConditionDefinition {
            inner: Arc::new(DefinitionInner {
                type_name,
                source_type,
                schema,
                constraints,
                validator,
                valid_arg_keys,
            }),
        },
        handler,
    })
}
