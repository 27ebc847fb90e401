//! `route` condition: match the current route name and parameters
//!
//! ```json
//! { "type": "route", "routes": ["discovery.*", "$CATEGORY_PAGES"] }
//! { "type": "route", "routes": ["topic.show"], "params": { "any": [{ "id": 1 }, { "id": 2 }] } }
//! ```

use crate::services::{RouteState, RouterService};
use plinth_core::condition::{
    ArgKind, ArgSpec, ConditionConfig, ConditionDefinition, ConditionHandler, ConstraintKind,
    EvaluationContext,
};
use plinth_core::error::ValidationError;
use plinth_core::matchers::{match_params, matches_any_route, validate_params, RoutePattern};
use plinth_core::types::{Args, Value};
use std::sync::Arc;

pub const TYPE_NAME: &str = "route";

pub struct RouteCondition {
    router: Arc<dyn RouterService>,
}

impl RouteCondition {
    pub fn new(router: Arc<dyn RouterService>) -> Self {
        Self { router }
    }

    pub fn config() -> ConditionConfig {
        ConditionConfig::new(TYPE_NAME)
            .arg("routes", ArgSpec::array().items(ArgKind::String).min_length(1))
            .arg("excludeRoutes", ArgSpec::array().items(ArgKind::String).min_length(1))
            .arg("params", ArgSpec::object())
            .arg("queryParams", ArgSpec::object())
            .constraint(ConstraintKind::ExactlyOne, ["routes", "excludeRoutes"])
    }

    fn matches(args: &Args, route: &RouteState) -> bool {
        let patterns = |key: &str| {
            args.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        };

        let route_matches = match (patterns("routes"), patterns("excludeRoutes")) {
            (Some(routes), _) => matches_any_route(routes, &route.name, &route.nav),
            (None, Some(excluded)) => !matches_any_route(excluded, &route.name, &route.nav),
            (None, None) => true,
        };

        route_matches
            && args.get("params").map_or(true, |spec| match_params(spec, &route.params))
            && args
                .get("queryParams")
                .map_or(true, |spec| match_params(spec, &route.query_params))
    }
}

impl ConditionHandler for RouteCondition {
    fn validate(&self, args: &Args) -> Result<(), ValidationError> {
        for key in ["routes", "excludeRoutes"] {
            let patterns = args.get(key).and_then(Value::as_array).unwrap_or_default();
            for (index, pattern) in patterns.iter().filter_map(Value::as_str).enumerate() {
                RoutePattern::parse(pattern).map_err(|message| {
                    ValidationError::new(format!("{}[{}]: {}", key, index, message)).at(key)
                })?;
            }
        }

        for key in ["params", "queryParams"] {
            if let Some(spec) = args.get(key) {
                validate_params(spec)
                    .map_err(|message| {
                        ValidationError::new(format!("\"{}\" {}", key, message)).at(key)
                    })?;
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
        Self::matches(args, &self.router.current_route())
    }

    fn resolved_value_for_logging(
        &self,
        _definition: &ConditionDefinition,
        _args: &Args,
        _ctx: &EvaluationContext,
    ) -> Option<Value> {
        let route = self.router.current_route();
        Some(Value::object([
            ("name", Value::String(route.name)),
            ("params", Value::Object(route.params)),
            ("queryParams", Value::Object(route.query_params)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticRouter;
    use plinth_core::condition::{decorate, Condition};

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    fn condition(route: RouteState) -> impl Condition {
        let handler = RouteCondition::new(Arc::new(StaticRouter::new(route)));
        decorate(RouteCondition::config(), handler).unwrap()
    }

    #[test]
    fn test_wildcard_routes() {
        let ctx = EvaluationContext::default();
        let on_category = condition(RouteState::new("category.none"));
        let on_tag = condition(RouteState::new("tag.show"));
        let include = args(r#"{"routes": ["category.*"]}"#);
        let exclude = args(r#"{"excludeRoutes": ["category.*"]}"#);

        assert!(on_category.evaluate(&include, &ctx));
        assert!(!on_tag.evaluate(&include, &ctx));
        assert!(!on_category.evaluate(&exclude, &ctx));
        assert!(on_tag.evaluate(&exclude, &ctx));
    }

    #[test]
    fn test_params_and_query_params() {
        let ctx = EvaluationContext::default();
        let route = RouteState::new("topic.show")
            .with_param("id", 42)
            .with_query_param("filter", "solved");
        let cond = condition(route);

        let loose = args(r#"{"routes": ["topic.show"], "params": {"id": "42"}}"#);
        assert!(cond.evaluate(&loose, &ctx));
        assert!(cond.evaluate(
            &args(r#"{"routes": ["topic.show"], "params": {"any": [{"id": 1}, {"id": 42}]}}"#),
            &ctx
        ));
        let negated = args(r#"{"routes": ["topic.show"], "params": {"not": {"id": 42}}}"#);
        assert!(!cond.evaluate(&negated, &ctx));
        assert!(!cond.evaluate(
            &args(r#"{"routes": ["topic.show"], "queryParams": {"filter": "open"}}"#),
            &ctx
        ));
    }

    #[test]
    fn test_validation() {
        let cond = condition(RouteState::default());
        assert!(cond.validate(&args("{}")).is_err());
        assert!(cond.validate(&args(r#"{"routes": ["a"], "excludeRoutes": ["b"]}"#)).is_err());

        let err = cond.validate(&args(r#"{"routes": ["$HOMEPGE"]}"#)).unwrap_err();
        assert_eq!(err.key.as_deref(), Some("routes"));
        assert!(err.message.contains("$HOMEPAGE"));

        assert!(cond.validate(&args(r#"{"routes": ["/^topic\\./"]}"#)).is_ok());
        assert!(cond.validate(&args(r#"{"routes": ["/(unclosed/"]}"#)).is_err());
    }
}
