//! Source resolution
//!
//! A condition's `source` argument selects the data it reads its subject from
//! instead of the ambient service:
//! - `none`: no `source` accepted
//! - `outletArgs`: `source` is `@context.<dotted.path>` into the outlet arguments
//! - `object`: `source` is an object used directly as the lookup target

use super::context::EvaluationContext;
use crate::diagnostics::did_you_mean;
use crate::error::ValidationError;
use crate::types::{Args, Value};

/// Prefix of outlet-argument source paths
pub const CONTEXT_SOURCE_PREFIX: &str = "@context.";

/// Name of the implicit source argument
pub const SOURCE_KEY: &str = "source";

/// How a condition accepts its `source` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceType {
    #[default]
    None,
    OutletArgs,
    Object,
}

impl SourceType {
    pub const NAMES: [&'static str; 3] = ["none", "outletArgs", "object"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::None => "none",
            SourceType::OutletArgs => "outletArgs",
            SourceType::Object => "object",
        }
    }

    /// Parse a declared source type, suggesting the closest valid name on failure
    pub fn parse(name: &str) -> Result<Self, String> {
        match name {
            "none" => Ok(SourceType::None),
            "outletArgs" => Ok(SourceType::OutletArgs),
            "object" => Ok(SourceType::Object),
            other => {
                let mut message = format!(
                    "sourceType must be one of {}, got \"{}\".",
                    Self::NAMES.join(", "),
                    other
                );
                if let Some(s) = did_you_mean(other, Self::NAMES) {
                    message.push_str(&format!(" Did you mean \"{}\"?", s));
                }
                Err(message)
            }
        }
    }

    pub fn accepts_source(&self) -> bool {
        !matches!(self, SourceType::None)
    }
}

/// Where a condition should read its subject from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLookup {
    /// No `source` supplied: use the ambient service
    Ambient,
    /// `source` supplied; `None` when the path resolved to nothing
    Resolved(Option<Value>),
}

/// Extract the dotted path from `@context.<path>`
pub fn parse_context_path(source: &str) -> Option<&str> {
    source
        .strip_prefix(CONTEXT_SOURCE_PREFIX)
        .filter(|path| {
            !path.is_empty()
                && path
                    .split('.')
                    .all(|seg| !seg.is_empty() && seg.chars().all(is_path_char))
        })
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) fn validate_source(source_type: SourceType, args: &Args) -> Result<(), ValidationError> {
    let Some(source) = args.get(SOURCE_KEY) else {
        return Ok(());
    };

    match source_type {
        SourceType::None => Err(ValidationError::new(
            "this condition does not accept a \"source\" argument.",
        )
        .at(SOURCE_KEY)),
        SourceType::OutletArgs => match source.as_str() {
            Some(path) if parse_context_path(path).is_some() => Ok(()),
            _ => Err(ValidationError::new(format!(
                "\"source\" must be a string of the form \"{}<path>\", got {}.",
                CONTEXT_SOURCE_PREFIX,
                crate::diagnostics::format_value(source)
            ))
            .at(SOURCE_KEY)),
        },
        SourceType::Object => match source {
            Value::Object(_) => Ok(()),
            other => Err(ValidationError::new(format!(
                "\"source\" must be an object, got {}.",
                other.type_name()
            ))
            .at(SOURCE_KEY)),
        },
    }
}

pub(crate) fn resolve_source(
    source_type: SourceType,
    args: &Args,
    ctx: &EvaluationContext,
) -> SourceLookup {
    let Some(source) = args.get(SOURCE_KEY) else {
        return SourceLookup::Ambient;
    };

    match source_type {
        SourceType::None => SourceLookup::Ambient,
        SourceType::OutletArgs => {
            let value = source
                .as_str()
                .and_then(parse_context_path)
                .and_then(|path| ctx.outlet_arg(path))
                .cloned();
            SourceLookup::Resolved(value)
        }
        SourceType::Object => match source {
            Value::Object(_) => SourceLookup::Resolved(Some(source.clone())),
            _ => SourceLookup::Resolved(None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(json: &str) -> Args {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_source_type_suggests() {
        assert_eq!(SourceType::parse("object"), Ok(SourceType::Object));
        let err = SourceType::parse("outletArg").unwrap_err();
        assert!(err.contains("Did you mean \"outletArgs\"?"));
    }

    #[test]
    fn test_parse_context_path() {
        assert_eq!(parse_context_path("@context.topic.user"), Some("topic.user"));
        assert_eq!(parse_context_path("@context."), None);
        assert_eq!(parse_context_path("topic.user"), None);
        assert_eq!(parse_context_path("@context.a..b"), None);
        assert_eq!(parse_context_path("@context.topic_2.user"), Some("topic_2.user"));
        assert_eq!(parse_context_path("@context.café"), None);
    }

    #[test]
    fn test_validate_by_source_type() {
        let with_path = args(r#"{"source": "@context.user"}"#);
        let with_object = args(r#"{"source": {"a": 1}}"#);

        assert!(validate_source(SourceType::None, &with_path).is_err());
        assert!(validate_source(SourceType::OutletArgs, &with_path).is_ok());
        assert!(validate_source(SourceType::OutletArgs, &with_object).is_err());
        assert!(validate_source(SourceType::Object, &with_object).is_ok());
        assert!(validate_source(SourceType::Object, &with_path).is_err());
        assert!(validate_source(SourceType::None, &args("{}")).is_ok());
    }

    #[test]
    fn test_resolve_outlet_path() {
        let ctx = EvaluationContext::new(
            serde_json::from_str::<Value>(r#"{"topic": {"user": {"admin": true}}}"#).unwrap(),
        );

        let found = resolve_source(
            SourceType::OutletArgs,
            &args(r#"{"source": "@context.topic.user"}"#),
            &ctx,
        );
        assert_eq!(
            found,
            SourceLookup::Resolved(Some(serde_json::from_str(r#"{"admin": true}"#).unwrap()))
        );

        let missing = resolve_source(
            SourceType::OutletArgs,
            &args(r#"{"source": "@context.post.user"}"#),
            &ctx,
        );
        assert_eq!(missing, SourceLookup::Resolved(None));

        assert_eq!(
            resolve_source(SourceType::OutletArgs, &args("{}"), &ctx),
            SourceLookup::Ambient
        );
    }
}
