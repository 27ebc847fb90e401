//! Unit tests for the condition contract
//!
//! Covers decorator config checking, argument validation order and source
//! resolution through a decorated condition.

use plinth_core::condition::*;
use plinth_core::error::{ErrorKind, ValidationError};
use plinth_core::types::{Args, Value};

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

fn args(json: &str) -> Args {
    serde_json::from_str(json).unwrap()
}

/// Passes when `flag` is true in the resolved source (or the args themselves)
struct FlagHandler;

impl ConditionHandler for FlagHandler {
    fn validate(&self, args: &Args) -> Result<(), ValidationError> {
        if args.get("flag") == Some(&Value::Bool(false)) && args.contains_key("level") {
            let message = "\"level\" is meaningless when \"flag\" is false.";
            return Err(ValidationError::new(message).at("level"));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> bool {
        let expected = args.get("flag").and_then(Value::as_bool).unwrap_or(true);
        match definition.resolve_source(args, ctx) {
            SourceLookup::Resolved(Some(subject)) => {
                subject.get("flag").and_then(Value::as_bool) == Some(expected)
            }
            SourceLookup::Resolved(None) => false,
            SourceLookup::Ambient => expected,
        }
    }
}

fn flag_config() -> ConditionConfig {
    ConditionConfig::new("flag")
        .source_type(SourceType::OutletArgs)
        .arg("flag", ArgSpec::boolean())
        .arg("level", ArgSpec::integer().range(0.0, 4.0))
        .arg("label", ArgSpec::string().min_length(1))
}

/// Condition implemented by hand, without the decorator
struct Manual;

impl Condition for Manual {
    fn type_name(&self) -> &str {
        "manual"
    }

    fn validate(&self, _args: &Args) -> Result<(), ValidationError> {
        Ok(())
    }

    fn evaluate(&self, _args: &Args, _ctx: &EvaluationContext) -> bool {
        true
    }
}

// =============================================================================
// Decorator Tests
// =============================================================================

#[test]
fn test_decorate_builds_definition() {
    let condition = decorate(flag_config(), FlagHandler).unwrap();
    let definition = condition.definition().unwrap();

    assert_eq!(condition.type_name(), "flag");
    assert_eq!(definition.source_type(), SourceType::OutletArgs);
    assert_eq!(definition.valid_arg_keys(), ["flag", "label", "level", "source"]);
    assert!(!definition.has_custom_validator());
}

#[test]
fn test_manual_condition_is_not_decorated() {
    let manual: Box<dyn Condition> = Box::new(Manual);
    assert!(manual.definition().is_none());
}

#[test]
fn test_decorate_rejects_empty_type() {
    let err = decorate(ConditionConfig::new(""), FlagHandler).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidConditionConfig { .. }));
}

#[test]
fn test_decorate_rejects_reserved_source_arg() {
    let config = ConditionConfig::new("flag")
        .source_type(SourceType::Object)
        .arg("source", ArgSpec::string());
    assert!(decorate(config, FlagHandler).is_err());

    let allowed = ConditionConfig::new("flag").arg("source", ArgSpec::string());
    assert!(decorate(allowed, FlagHandler).is_ok());
}

#[test]
fn test_decorate_rejects_bad_constraints() {
    let unknown = flag_config().constraint(ConstraintKind::ExactlyOne, ["flag", "lvel"]);
    let err = decorate(unknown, FlagHandler).unwrap_err();
    assert!(err.to_string().contains("Did you mean \"level\"?"));

    let single = flag_config().constraint(ConstraintKind::AtLeastOne, ["flag"]);
    assert!(decorate(single, FlagHandler).is_err());
}

#[test]
fn test_decorate_rejects_incoherent_spec() {
    let config = ConditionConfig::new("flag").arg("level", ArgSpec::integer().range(4.0, 0.0));
    assert!(decorate(config, FlagHandler).is_err());
}

// =============================================================================
// Declarative Config Tests
// =============================================================================

#[test]
fn test_config_from_value() {
    let config = ConditionConfig::from_value(&parse(
        r#"{
            "type": "flag",
            "sourceType": "object",
            "args": {"flag": {"type": "boolean"}, "mode": {"enum": ["a", "b"]}},
            "constraints": {"atLeastOne": ["flag", "mode"]}
        }"#,
    ))
    .unwrap();

    let condition = decorate(config, FlagHandler).unwrap();
    let definition = condition.definition().unwrap();
    assert_eq!(definition.source_type(), SourceType::Object);
    assert_eq!(definition.constraints().len(), 1);
    assert!(condition.validate(&args(r#"{"mode": "a"}"#)).is_ok());
    assert!(condition.validate(&args("{}")).is_err());
}

#[test]
fn test_config_unknown_key_suggests() {
    let config = parse(r#"{"type": "flag", "sourceTyp": "none"}"#);
    let err = ConditionConfig::from_value(&config).unwrap_err();
    assert!(err.to_string().contains("Did you mean \"sourceType\"?"));
}

#[test]
fn test_config_bad_source_type_suggests() {
    let config = parse(r#"{"type": "flag", "sourceType": "objekt"}"#);
    let err = ConditionConfig::from_value(&config).unwrap_err();
    assert!(err.to_string().contains("Did you mean \"object\"?"));
}

#[test]
fn test_config_requires_string_type() {
    assert!(ConditionConfig::from_value(&parse(r#"{"args": {}}"#)).is_err());
    assert!(ConditionConfig::from_value(&parse(r#"{"type": 3}"#)).is_err());
}

#[test]
fn test_config_unknown_constraint_kind() {
    let err = ConditionConfig::from_value(&parse(
        r#"{"type": "flag", "args": {"a": {}, "b": {}}, "constraints": {"exactlyOn": ["a", "b"]}}"#,
    ))
    .unwrap_err();
    assert!(err.to_string().contains("Did you mean \"exactlyOne\"?"));
}

// =============================================================================
// Validation Order Tests
// =============================================================================

#[test]
fn test_unknown_argument_suggests() {
    let condition = decorate(flag_config(), FlagHandler).unwrap();
    let err = condition.validate(&args(r#"{"lvel": 2}"#)).unwrap_err();

    assert_eq!(err.key.as_deref(), Some("lvel"));
    assert_eq!(err.suggestion.as_deref(), Some("level"));
}

#[test]
fn test_unknown_key_checked_before_schema() {
    let condition = decorate(flag_config(), FlagHandler).unwrap();
    let err = condition.validate(&args(r#"{"level": "high", "bogus": 1}"#)).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("bogus"));
}

#[test]
fn test_source_checked_before_schema() {
    let condition = decorate(flag_config(), FlagHandler).unwrap();
    let err = condition.validate(&args(r#"{"source": "topic", "level": 9}"#)).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("source"));
}

#[test]
fn test_required_argument() {
    let config = ConditionConfig::new("needs").arg("path", ArgSpec::string().required());
    let condition = decorate(config, FlagHandler).unwrap();

    let err = condition.validate(&args("{}")).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("path"));
    assert!(condition.validate(&args(r#"{"path": "a.b"}"#)).is_ok());
}

#[test]
fn test_custom_validator_runs_before_handler() {
    let config = flag_config().with_validator(|args| {
        if args.contains_key("label") && !args.contains_key("level") {
            return Err(ValidationError::new("\"label\" needs \"level\".").at("label"));
        }
        Ok(())
    });
    let condition = decorate(config, FlagHandler).unwrap();
    assert!(condition.definition().unwrap().has_custom_validator());

    let err = condition.validate(&args(r#"{"flag": false, "label": "x"}"#)).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("label"));

    let err = condition.validate(&args(r#"{"flag": false, "level": 1}"#)).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("level"));
}

// =============================================================================
// Evaluation Tests
// =============================================================================

#[test]
fn test_evaluate_with_outlet_source() {
    let condition = decorate(flag_config(), FlagHandler).unwrap();
    let ctx = EvaluationContext::new(parse(r#"{"topic": {"flag": true}}"#));

    assert!(condition.evaluate(&args(r#"{"source": "@context.topic"}"#), &ctx));
    assert!(!condition.evaluate(&args(r#"{"source": "@context.topic", "flag": false}"#), &ctx));
    assert!(!condition.evaluate(&args(r#"{"source": "@context.post"}"#), &ctx));
    assert!(condition.evaluate(&args("{}"), &ctx));
}

#[test]
fn test_logging_value_defaults_to_source() {
    let condition = decorate(flag_config(), FlagHandler).unwrap();
    let ctx = EvaluationContext::new(parse(r#"{"topic": {"flag": true}}"#));

    assert_eq!(
        condition.resolved_value_for_logging(&args(r#"{"source": "@context.topic"}"#), &ctx),
        Some(parse(r#"{"flag": true}"#))
    );
    assert_eq!(condition.resolved_value_for_logging(&args("{}"), &ctx), None);
}
