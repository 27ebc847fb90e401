//! `user` condition: match properties of the current (or a supplied) user

use crate::services::{CurrentUser, CurrentUserService};
use plinth_core::condition::{
    ArgKind, ArgSpec, ConditionConfig, ConditionDefinition, ConditionHandler, EvaluationContext,
    SourceLookup, SourceType,
};
use plinth_core::error::ValidationError;
use plinth_core::types::{Args, Value};
use std::sync::Arc;

pub const TYPE_NAME: &str = "user";

/// Arguments that only make sense for a signed-in user
const USER_SPECIFIC_ARGS: [&str; 6] = [
    "admin",
    "moderator",
    "staff",
    "minTrustLevel",
    "maxTrustLevel",
    "groups",
];

pub struct UserCondition {
    current_user: Arc<dyn CurrentUserService>,
}

impl UserCondition {
    pub fn new(current_user: Arc<dyn CurrentUserService>) -> Self {
        Self { current_user }
    }

    pub fn config() -> ConditionConfig {
        ConditionConfig::new(TYPE_NAME)
            .source_type(SourceType::OutletArgs)
            .arg("loggedIn", ArgSpec::boolean())
            .arg("admin", ArgSpec::boolean())
            .arg("moderator", ArgSpec::boolean())
            .arg("staff", ArgSpec::boolean())
            .arg("minTrustLevel", ArgSpec::integer().range(0.0, 4.0))
            .arg("maxTrustLevel", ArgSpec::integer().range(0.0, 4.0))
            .arg("groups", ArgSpec::array().items(ArgKind::String).min_length(1))
    }

    fn user(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> Option<CurrentUser> {
        match definition.resolve_source(args, ctx) {
            SourceLookup::Ambient => self.current_user.current_user(),
            SourceLookup::Resolved(value) => value.as_ref().and_then(CurrentUser::from_value),
        }
    }

    fn matches(args: &Args, user: Option<&CurrentUser>) -> bool {
        let flag = |key: &str| args.get(key).and_then(Value::as_bool);
        let logged_in = flag("loggedIn");

        if logged_in == Some(false) {
            return user.is_none();
        }

        let requires_user =
            logged_in == Some(true) || USER_SPECIFIC_ARGS.iter().any(|k| args.contains_key(*k));
        let Some(user) = user else {
            return !requires_user;
        };

        if flag("admin") == Some(true) && !user.admin {
            return false;
        }
        if flag("moderator") == Some(true) && !user.moderator {
            return false;
        }
        if flag("staff") == Some(true) && !user.is_staff() {
            return false;
        }

        let level = i64::from(user.trust_level);
        if args.get("minTrustLevel").and_then(Value::as_i64).map_or(false, |min| level < min) {
            return false;
        }
        if args.get("maxTrustLevel").and_then(Value::as_i64).map_or(false, |max| level > max) {
            return false;
        }

        if let Some(groups) = args.get("groups").and_then(Value::as_array) {
            if !groups.iter().filter_map(Value::as_str).any(|g| user.in_group(g)) {
                return false;
            }
        }

        true
    }
}

impl ConditionHandler for UserCondition {
    fn validate(&self, args: &Args) -> Result<(), ValidationError> {
        if args.get("loggedIn").and_then(Value::as_bool) == Some(false) {
            let mut conflicting: Vec<&str> = USER_SPECIFIC_ARGS
                .iter()
                .copied()
                .filter(|k| args.contains_key(*k))
                .collect();
            conflicting.sort_unstable();
            if let Some(first) = conflicting.first() {
                return Err(ValidationError::new(format!(
                    "\"loggedIn: false\" cannot be combined with user-specific arguments ({}).",
                    conflicting.join(", ")
                ))
                .at(*first));
            }
        }

        let level = |key: &str| args.get(key).and_then(Value::as_i64);
        if let (Some(min), Some(max)) = (level("minTrustLevel"), level("maxTrustLevel")) {
            if min > max {
                return Err(ValidationError::new(format!(
                    "\"minTrustLevel\" ({}) must not be greater than \"maxTrustLevel\" ({}).",
                    min, max
                ))
                .at("minTrustLevel"));
            }
        }

        Ok(())
    }

    fn evaluate(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> bool {
        let user = self.user(definition, args, ctx);
        Self::matches(args, user.as_ref())
    }

    fn resolved_value_for_logging(
        &self,
        definition: &ConditionDefinition,
        args: &Args,
        ctx: &EvaluationContext,
    ) -> Option<Value> {
        let user = self.user(definition, args, ctx)?;
        serde_json::to_value(user).ok().map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticCurrentUser;
    use plinth_core::condition::{decorate, Condition};

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    fn condition(user: Option<CurrentUser>) -> impl Condition {
        let handler = UserCondition::new(Arc::new(StaticCurrentUser::new(user)));
        decorate(UserCondition::config(), handler).unwrap()
    }

    fn member(trust_level: u8, groups: &[&str]) -> CurrentUser {
        CurrentUser {
            trust_level,
            groups: groups.iter().map(|g| g.to_string()).collect(),
            ..CurrentUser::default()
        }
    }

    #[test]
    fn test_trust_level_and_groups() {
        let ctx = EvaluationContext::default();
        let rule = args(r#"{"minTrustLevel": 2, "groups": ["beta"]}"#);

        assert!(condition(Some(member(3, &["beta"]))).evaluate(&rule, &ctx));
        assert!(!condition(Some(member(3, &["alpha"]))).evaluate(&rule, &ctx));
        assert!(!condition(Some(member(1, &["beta"]))).evaluate(&rule, &ctx));
        assert!(!condition(None).evaluate(&rule, &ctx));
    }

    #[test]
    fn test_logged_in() {
        let ctx = EvaluationContext::default();
        assert!(condition(None).evaluate(&args(r#"{"loggedIn": false}"#), &ctx));
        assert!(!condition(Some(member(0, &[]))).evaluate(&args(r#"{"loggedIn": false}"#), &ctx));
        assert!(condition(Some(member(0, &[]))).evaluate(&args(r#"{"loggedIn": true}"#), &ctx));
        assert!(!condition(None).evaluate(&args(r#"{"loggedIn": true}"#), &ctx));
    }

    #[test]
    fn test_staff_includes_admins_and_moderators() {
        let ctx = EvaluationContext::default();
        let moderator = CurrentUser {
            moderator: true,
            ..CurrentUser::default()
        };
        assert!(condition(Some(moderator)).evaluate(&args(r#"{"staff": true}"#), &ctx));
        assert!(!condition(Some(member(4, &[]))).evaluate(&args(r#"{"staff": true}"#), &ctx));
    }

    #[test]
    fn test_validation() {
        let cond = condition(None);

        let err = cond.validate(&args(r#"{"loggedIn": false, "admin": true}"#)).unwrap_err();
        assert_eq!(err.key.as_deref(), Some("admin"));

        assert!(cond.validate(&args(r#"{"minTrustLevel": 3, "maxTrustLevel": 1}"#)).is_err());
        assert!(cond.validate(&args(r#"{"minTrustLevel": 5}"#)).is_err());
        assert!(cond.validate(&args(r#"{"minTrustLevel": 1.5}"#)).is_err());
    }

    #[test]
    fn test_user_from_outlet_args() {
        let cond = condition(None);
        let ctx = EvaluationContext::new(
            serde_json::from_str::<Value>(
                r#"{"topic": {"author": {"admin": true, "trust_level": 4}}}"#,
            )
                .unwrap(),
        );

        let author = args(r#"{"source": "@context.topic.author", "admin": true}"#);
        assert!(cond.evaluate(&author, &ctx));
        let missing = args(r#"{"source": "@context.post.author", "admin": true}"#);
        assert!(!cond.evaluate(&missing, &ctx));
    }
}
