//! `outlet-arg` condition: match a value in the outlet arguments
//!
//! ```json
//! { "type": "outlet-arg", "path": "topic.closed", "value": true }
//! { "type": "outlet-arg", "path": "topic.category_id", "value": { "not": [1, 2] } }
//! { "type": "outlet-arg", "path": "topic.tags", "exists": true }
//! ```

use plinth_core::condition::{
    ArgSpec, ConditionConfig, ConditionDefinition, ConditionHandler, ConstraintKind,
    EvaluationContext,
};
use plinth_core::error::ValidationError;
use plinth_core::matchers::{matches_value, validate_value_spec, Comparison};
use plinth_core::types::{Args, Value};
use regex::Regex;
use std::sync::OnceLock;

pub const TYPE_NAME: &str = "outlet-arg";

fn path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?-u:[\w.])+$").expect("valid path regex"))
}

#[derive(Debug, Default)]
pub struct OutletArgCondition;

impl OutletArgCondition {
    pub fn config() -> ConditionConfig {
        ConditionConfig::new(TYPE_NAME)
            .arg("path", ArgSpec::string().required())
            .arg("value", ArgSpec::any())
            .arg("exists", ArgSpec::boolean())
            .constraint(ConstraintKind::AtMostOne, ["value", "exists"])
    }

    fn lookup<'a>(args: &Args, ctx: &'a EvaluationContext) -> Option<&'a Value> {
        args.get("path").and_then(Value::as_str).and_then(|path| ctx.outlet_arg(path))
    }
}

impl ConditionHandler for OutletArgCondition {
    fn validate(&self, args: &Args) -> Result<(), ValidationError> {
        if let Some(path) = args.get("path").and_then(Value::as_str) {
            if !path_pattern().is_match(path) {
                return Err(ValidationError::new(format!(
                    "\"path\" must be a dotted property path of ASCII letters, digits, \
                         underscores and dots, got \"{}\".",
                    path
                ))
                .at("path"));
            }
        }

        if let Some(expected) = args.get("value") {
            validate_value_spec(expected)
                .map_err(|message| ValidationError::new(message).at("value"))?;
        }

        Ok(())
    }

    fn evaluate(
        &self,
        _definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> bool {
        let actual = Self::lookup(args, ctx);

        if let Some(exists) = args.get("exists").and_then(Value::as_bool) {
            return actual.is_some() == exists;
        }

        match args.get("value") {
            Some(expected) => matches_value(actual, expected, Comparison::Strict),
            None => actual.map_or(false, Value::is_truthy),
        }
    }

    fn resolved_value_for_logging(
        &self,
        _definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> Option<Value> {
        Self::lookup(args, ctx).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::condition::{decorate, Condition};

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    fn context() -> EvaluationContext {
        EvaluationContext::new(
            serde_json::from_str::<Value>(
                r#"{"topic": {"closed": true, "category_id": 3,
                    "title": "Release notes", "tags": []}}"#,
            )
            .unwrap(),
        )
    }

    fn condition() -> impl Condition {
        decorate(OutletArgCondition::config(), OutletArgCondition).unwrap()
    }

    #[test]
    fn test_value_matching() {
        let cond = condition();
        let ctx = context();

        assert!(cond.evaluate(&args(r#"{"path": "topic.closed", "value": true}"#), &ctx));
        assert!(cond.evaluate(&args(r#"{"path": "topic.category_id", "value": [1, 3]}"#), &ctx));
        let excluded = args(r#"{"path": "topic.category_id", "value": {"not": [1, 3]}}"#);
        assert!(!cond.evaluate(&excluded, &ctx));
        assert!(cond.evaluate(&args(r#"{"path": "topic.title", "value": "/^release/i"}"#), &ctx));
        assert!(!cond.evaluate(&args(r#"{"path": "topic.category_id", "value": "3"}"#), &ctx));
    }

    #[test]
    fn test_exists_and_truthiness() {
        let cond = condition();
        let ctx = context();

        assert!(cond.evaluate(&args(r#"{"path": "topic.tags", "exists": true}"#), &ctx));
        assert!(cond.evaluate(&args(r#"{"path": "topic.pinned", "exists": false}"#), &ctx));
        assert!(cond.evaluate(&args(r#"{"path": "topic.closed"}"#), &ctx));
        assert!(!cond.evaluate(&args(r#"{"path": "topic.pinned"}"#), &ctx));
    }

    #[test]
    fn test_validation() {
        let cond = condition();
        assert!(cond.validate(&args("{}")).is_err());
        assert!(cond.validate(&args(r#"{"path": "topic closed"}"#)).is_err());
        assert!(cond.validate(&args(r#"{"path": "tópico.closed"}"#)).is_err());
        assert!(cond.validate(&args(r#"{"path": "topic_2.closed"}"#)).is_ok());
        let both = args(r#"{"path": "topic.closed", "value": 1, "exists": true}"#);
        assert!(cond.validate(&both).is_err());
        assert!(cond.validate(&args(r#"{"path": "topic.title", "value": "/(bad/"}"#)).is_err());
    }

    #[test]
    fn test_logging_value_is_value_at_path() {
        let cond = condition();
        assert_eq!(
            cond.resolved_value_for_logging(&args(r#"{"path": "topic.category_id"}"#), &context()),
            Some(Value::Number(3.0))
        );
    }
}
