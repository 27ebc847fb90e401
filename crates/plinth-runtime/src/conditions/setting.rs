//! `setting` condition: match a site setting's value
//!
//! List settings may be stored as `|`-delimited strings (`"latest|new|top"`)
//! or arrays. All comparisons are string-wise.

use crate::services::SiteSettingsService;
use plinth_core::condition::{
    ArgSpec, ConditionConfig, ConditionDefinition, ConditionHandler, ConstraintKind,
    EvaluationContext, SourceLookup, SourceType,
};
use plinth_core::diagnostics::did_you_mean;
use plinth_core::types::{Args, Value};
use std::sync::Arc;
use tracing::debug;

pub const TYPE_NAME: &str = "setting";

const LIST_SEPARATOR: char = '|';

pub struct SettingCondition {
    settings: Arc<dyn SiteSettingsService>,
}

impl SettingCondition {
    pub fn new(settings: Arc<dyn SiteSettingsService>) -> Self {
        Self { settings }
    }

    pub fn config() -> ConditionConfig {
        ConditionConfig::new(TYPE_NAME)
            .source_type(SourceType::Object)
            .arg("name", ArgSpec::string().required().min_length(1))
            .arg("enabled", ArgSpec::boolean())
            .arg("equals", ArgSpec::any())
            .arg("includes", ArgSpec::array().min_length(1))
            .arg("contains", ArgSpec::any())
            .arg("containsAny", ArgSpec::array().min_length(1))
            .constraint(
                ConstraintKind::ExactlyOne,
                ["enabled", "equals", "includes", "contains", "containsAny"],
            )
    }

    /// Look the setting up in the `source` object, or the site settings
    fn lookup(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> Option<Value> {
        let name = args.get("name").and_then(Value::as_str)?;
        match definition.resolve_source(args, ctx) {
            SourceLookup::Ambient => self.settings.get(name),
            SourceLookup::Resolved(source) => source.and_then(|s| s.get(name).cloned()),
        }
    }

    fn matches(args: &Args, setting: &Value) -> bool {
        if let Some(enabled) = args.get("enabled").and_then(Value::as_bool) {
            return setting.is_truthy() == enabled;
        }
        if let Some(expected) = args.get("equals") {
            return setting.to_compare_string() == expected.to_compare_string();
        }
        if let Some(allowed) = args.get("includes").and_then(Value::as_array) {
            let actual = setting.to_compare_string();
            return allowed.iter().any(|v| v.to_compare_string() == actual);
        }

        let items = list_items(setting);
        if let Some(wanted) = args.get("contains") {
            let wanted = wanted.to_compare_string();
            return items.iter().any(|item| *item == wanted);
        }
        if let Some(wanted) = args.get("containsAny").and_then(Value::as_array) {
            return wanted
                .iter()
                .map(Value::to_compare_string)
                .any(|w| items.contains(&w));
        }
        false
    }
}

/// Items of a list setting
fn list_items(setting: &Value) -> Vec<String> {
    match setting {
        Value::Array(items) => items.iter().map(Value::to_compare_string).collect(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => s.split(LIST_SEPARATOR).map(str::to_string).collect(),
        other => vec![other.to_compare_string()],
    }
}

impl ConditionHandler for SettingCondition {
    fn evaluate(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> bool {
        match self.lookup(definition, args, ctx) {
            Some(setting) => Self::matches(args, &setting),
            None => {
                let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
                let known: Vec<String> = match definition.resolve_source(args, ctx) {
                    SourceLookup::Resolved(Some(Value::Object(map))) => {
                        map.keys().cloned().collect()
                    }
                    SourceLookup::Resolved(_) => Vec::new(),
                    SourceLookup::Ambient => self.settings.names(),
                };
                match did_you_mean(name, known.iter().map(String::as_str)) {
                    Some(s) => debug!("Unknown setting \"{}\". Did you mean \"{}\"?", name, s),
                    None => debug!("Unknown setting \"{}\"", name),
                }
                false
            }
        }
    }

    fn resolved_value_for_logging(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> Option<Value> {
        self.lookup(definition, args, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticSiteSettings;
    use plinth_core::condition::{decorate, Condition};

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    fn condition(settings: StaticSiteSettings) -> impl Condition {
        decorate(SettingCondition::config(), SettingCondition::new(Arc::new(settings))).unwrap()
    }

    #[test]
    fn test_contains_with_object_source() {
        let cond = condition(StaticSiteSettings::default());
        let ctx = EvaluationContext::default();

        assert!(cond.evaluate(
            &args(r#"{"source": {"top_menu": "latest|new|unread"},
                "name": "top_menu", "contains": "new"}"#),
            &ctx
        ));
        assert!(!cond.evaluate(
            &args(r#"{"source": {"top_menu": "latest|new|unread"},
                "name": "top_menu", "contains": "hot"}"#),
            &ctx
        ));
    }

    #[test]
    fn test_unknown_setting_is_false() {
        let cond = condition(StaticSiteSettings::default());
        let rule = args(r#"{"name": "missing_setting", "enabled": true}"#);

        assert!(cond.validate(&rule).is_ok());
        assert!(!cond.evaluate(&rule, &EvaluationContext::default()));
    }

    #[test]
    fn test_ambient_settings() {
        let settings = StaticSiteSettings::default();
        settings.set("enable_badges", true);
        settings.set("max_tags", 5);
        settings.set("top_menu", Value::from(vec!["latest", "top"]));
        let cond = condition(settings);
        let ctx = EvaluationContext::default();

        assert!(cond.evaluate(&args(r#"{"name": "enable_badges", "enabled": true}"#), &ctx));
        assert!(!cond.evaluate(&args(r#"{"name": "enable_badges", "enabled": false}"#), &ctx));
        assert!(cond.evaluate(&args(r#"{"name": "max_tags", "equals": "5"}"#), &ctx));
        assert!(cond.evaluate(&args(r#"{"name": "max_tags", "includes": [3, 5]}"#), &ctx));
        let overlap = args(r#"{"name": "top_menu", "containsAny": ["new", "top"]}"#);
        assert!(cond.evaluate(&overlap, &ctx));
        let partial = args(r#"{"name": "top_menu", "containsAny": ["new", "hot"]}"#);
        assert!(!cond.evaluate(&partial, &ctx));
    }

    #[test]
    fn test_exactly_one_comparison() {
        let cond = condition(StaticSiteSettings::default());
        assert!(cond.validate(&args(r#"{"name": "x"}"#)).is_err());
        assert!(cond.validate(&args(r#"{"name": "x", "enabled": true, "equals": 1}"#)).is_err());
        assert!(cond.validate(&args(r#"{"enabled": true}"#)).is_err());
    }
}
