//! `viewport` condition: match viewport width breakpoints and device capabilities

use crate::services::ViewportService;
use plinth_core::condition::{
    ArgSpec, ConditionConfig, ConditionDefinition, ConditionHandler, EvaluationContext,
};
use plinth_core::error::ValidationError;
use plinth_core::types::{Args, Value};
use std::sync::Arc;

pub const TYPE_NAME: &str = "viewport";

/// Breakpoint names and their minimum widths in pixels, smallest first
pub const BREAKPOINTS: [(&str, u32); 5] =
    [("sm", 640), ("md", 768), ("lg", 1024), ("xl", 1280), ("2xl", 1536)];

fn rank(name: &str) -> Option<usize> {
    BREAKPOINTS.iter().position(|(bp, _)| *bp == name)
}

pub struct ViewportCondition {
    viewport: Arc<dyn ViewportService>,
}

impl ViewportCondition {
    pub fn new(viewport: Arc<dyn ViewportService>) -> Self {
        Self { viewport }
    }

    pub fn config() -> ConditionConfig {
        let names = BREAKPOINTS.map(|(name, _)| name);
        ConditionConfig::new(TYPE_NAME)
            .arg("min", ArgSpec::string().one_of(names))
            .arg("max", ArgSpec::string().one_of(names))
            .arg("mobile", ArgSpec::boolean())
            .arg("touch", ArgSpec::boolean())
    }
}

impl ConditionHandler for ViewportCondition {
    fn validate(&self, args: &Args) -> Result<(), ValidationError> {
        let breakpoint = |key: &str| args.get(key).and_then(Value::as_str).and_then(rank);
        if let (Some(min), Some(max)) = (breakpoint("min"), breakpoint("max")) {
            if min > max {
                return Err(ValidationError::new(format!(
                    "\"min\" breakpoint \"{}\" is larger than \"max\" breakpoint \"{}\"; \
                         no viewport can match.",
                    BREAKPOINTS[min].0, BREAKPOINTS[max].0
                ))
                .at("min"));
            }
        }
        Ok(())
    }

    fn evaluate(
        &self,
        _definition: &ConditionDefinition,
        args: &Args,
        _ctx: &EvaluationContext,
    ) -> bool {
        let width = self.viewport.width();
        let breakpoint = |key: &str| args.get(key).and_then(Value::as_str).and_then(rank);

        if let Some(min) = breakpoint("min") {
            if width < BREAKPOINTS[min].1 {
                return false;
            }
        }

        // `max` includes its whole band, up to the next breakpoint
        if let Some(max) = breakpoint("max") {
            if let Some((_, next)) = BREAKPOINTS.get(max + 1) {
                if width >= *next {
                    return false;
                }
            }
        }

        if let Some(mobile) = args.get("mobile").and_then(Value::as_bool) {
            if self.viewport.is_mobile_device() != mobile {
                return false;
            }
        }

        if let Some(touch) = args.get("touch").and_then(Value::as_bool) {
            if self.viewport.has_touch() != touch {
                return false;
            }
        }

        true
    }

    fn resolved_value_for_logging(
        &self,
        _definition: &ConditionDefinition,
        _args: &Args,
        _ctx: &EvaluationContext,
    ) -> Option<Value> {
        Some(Value::object([
            ("width", Value::from(self.viewport.width())),
            ("mobile", Value::Bool(self.viewport.is_mobile_device())),
            ("touch", Value::Bool(self.viewport.has_touch())),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{StaticViewport, ViewportState};
    use plinth_core::condition::{decorate, Condition};

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    fn condition(width: u32, mobile: bool, touch: bool) -> impl Condition {
        let viewport = StaticViewport::new(ViewportState { width, mobile, touch });
        decorate(ViewportCondition::config(), ViewportCondition::new(Arc::new(viewport))).unwrap()
    }

    #[test]
    fn test_min_and_max() {
        let ctx = EvaluationContext::default();
        let rule = args(r#"{"min": "md", "max": "lg"}"#);

        assert!(!condition(700, false, false).evaluate(&rule, &ctx));
        assert!(condition(768, false, false).evaluate(&rule, &ctx));
        assert!(condition(1279, false, false).evaluate(&rule, &ctx));
        assert!(!condition(1280, false, false).evaluate(&rule, &ctx));
        assert!(condition(4000, false, false).evaluate(&args(r#"{"max": "2xl"}"#), &ctx));
    }

    #[test]
    fn test_device_capabilities() {
        let ctx = EvaluationContext::default();
        let device = args(r#"{"mobile": true, "touch": true}"#);
        assert!(condition(400, true, true).evaluate(&device, &ctx));
        assert!(!condition(1400, false, true).evaluate(&args(r#"{"mobile": true}"#), &ctx));
        assert!(condition(1400, false, true).evaluate(&args(r#"{"touch": true}"#), &ctx));
    }

    #[test]
    fn test_inverted_range_fails_validation() {
        let cond = condition(1024, false, false);
        let err = cond.validate(&args(r#"{"min": "xl", "max": "sm"}"#)).unwrap_err();
        assert_eq!(err.key.as_deref(), Some("min"));
        assert!(cond.validate(&args(r#"{"min": "md", "max": "md"}"#)).is_ok());
        assert!(cond.validate(&args(r#"{"min": "huge"}"#)).is_err());
    }
}
