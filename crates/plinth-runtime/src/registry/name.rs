//! Name parsing and namespace rules
//!
//! Block and outlet names take one of three forms:
//! - `name` (core only)
//! - `namespace:name` (plugins)
//! - `theme:namespace:name` (themes)
//!
//! Every segment matches `[a-z][a-z0-9-]*`. A trailing `?` on a block
//! reference marks it optional.

use super::identity::SourceIdentity;
use plinth_core::error::{BlockError, ErrorKind, RegistryKind, Result};

const SEGMENT_RULE: &str =
    "must start with a lowercase letter and contain only lowercase letters, digits and hyphens";

/// Namespace reserved for theme registrations
pub const THEME_PREFIX: &str = "theme";

/// Suffix marking an optional block reference
pub const OPTIONAL_MARKER: char = '?';

/// A validated block or outlet name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName<'a> {
    /// Registered through the `theme:` form
    pub theme: bool,
    pub namespace: Option<&'a str>,
    pub local: &'a str,
}

impl ParsedName<'_> {
    /// Namespace prefix recorded for consistency checks (`theme:ns` or `ns`)
    pub fn namespace_prefix(&self) -> Option<String> {
        match (self.theme, self.namespace) {
            (true, Some(ns)) => Some(format!("{}:{}", THEME_PREFIX, ns)),
            (false, Some(ns)) => Some(ns.to_string()),
            _ => None,
        }
    }
}

/// Whether `segment` matches `[a-z][a-z0-9-]*`
pub fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Parse a block or outlet name
#[track_caller]
pub fn parse_name(kind: RegistryKind, name: &str) -> Result<ParsedName<'_>> {
    let invalid = |reason: &str| {
        BlockError::new(ErrorKind::InvalidName {
            kind,
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    let segments: Vec<&str> = name.split(':').collect();
    if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
        let reason = if bad.is_empty() {
            "name segments must not be empty".to_string()
        } else {
            format!("segment \"{}\" {}", bad, SEGMENT_RULE)
        };
        return Err(invalid(&reason));
    }

    match segments[..] {
        [local] => Ok(ParsedName {
            theme: false,
            namespace: None,
            local,
        }),
        [namespace, _] if namespace == THEME_PREFIX => Err(invalid(
            "the \"theme\" namespace is reserved; use \"theme:<namespace>:<name>\"",
        )),
        [namespace, local] => Ok(ParsedName {
            theme: false,
            namespace: Some(namespace),
            local,
        }),
        [prefix, namespace, local] if prefix == THEME_PREFIX => Ok(ParsedName {
            theme: true,
            namespace: Some(namespace),
            local,
        }),
        [_, _, _] => Err(invalid("three-part names must start with \"theme:\"")),
        _ => Err(invalid("expected \"name\", \"namespace:name\" or \"theme:namespace:name\"")),
    }
}

/// Check that the name form fits the registering source
#[track_caller]
pub fn check_namespace_shape(
    name: &ParsedName<'_>,
    full_name: &str,
    identity: &SourceIdentity,
) -> Result<()> {
    let reason = match identity {
        SourceIdentity::Core => return Ok(()),
        SourceIdentity::Theme(_) if !name.theme => {
            "themes must use the \"theme:<namespace>:<name>\" form"
        }
        SourceIdentity::Plugin(_) if name.theme || name.namespace.is_none() => {
            "plugins must use the \"<namespace>:<name>\" form"
        }
        _ => return Ok(()),
    };

    Err(BlockError::new(ErrorKind::NamespaceViolation {
        name: full_name.to_string(),
        origin: identity.to_string(),
        reason: reason.to_string(),
    }))
}

/// Validate a condition type name (single segment, no namespace)
#[track_caller]
pub fn check_condition_type_name(name: &str) -> Result<()> {
    if is_valid_segment(name) {
        return Ok(());
    }
    Err(BlockError::new(ErrorKind::InvalidName {
        kind: RegistryKind::ConditionType,
        name: name.to_string(),
        reason: SEGMENT_RULE.to_string(),
    }))
}

/// Split a reference into its name and whether it is optional
pub fn strip_optional(reference: &str) -> (&str, bool) {
    match reference.strip_suffix(OPTIONAL_MARKER) {
        Some(name) => (name, true),
        None => (reference, false),
    }
}
