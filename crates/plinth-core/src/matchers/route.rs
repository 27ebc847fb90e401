//! Route-name pattern matching
//!
//! A pattern is one of:
//! - an exact route name (`"topic.show"`)
//! - a wildcard prefix (`"category.*"` matches `category` and `category.<anything>`)
//! - a regular-expression literal (`"/^discovery\\./"`)
//! - a semantic shortcut (`"$CATEGORY_PAGES"`) resolved against navigation state

use super::pattern::{compile_regex_literal, is_regex_literal, regex_literal_matches};
use crate::diagnostics::did_you_mean;

/// Named shortcuts resolved against ambient navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteShortcut {
    CategoryPages,
    DiscoveryPages,
    Homepage,
    TagPages,
    TopMenu,
}

impl RouteShortcut {
    pub const ALL: [RouteShortcut; 5] = [
        RouteShortcut::CategoryPages,
        RouteShortcut::DiscoveryPages,
        RouteShortcut::Homepage,
        RouteShortcut::TagPages,
        RouteShortcut::TopMenu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteShortcut::CategoryPages => "$CATEGORY_PAGES",
            RouteShortcut::DiscoveryPages => "$DISCOVERY_PAGES",
            RouteShortcut::Homepage => "$HOMEPAGE",
            RouteShortcut::TagPages => "$TAG_PAGES",
            RouteShortcut::TopMenu => "$TOP_MENU",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

/// Navigation state the shortcuts are resolved against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    /// Currently on a topic-list (discovery) route
    pub on_discovery: bool,
    /// Currently on the configured homepage
    pub on_homepage: bool,
    /// Category being browsed, if any
    pub category: Option<String>,
    /// Tag being browsed, if any
    pub tag: Option<String>,
}

impl NavigationState {
    pub fn matches_shortcut(&self, shortcut: RouteShortcut) -> bool {
        match shortcut {
            RouteShortcut::DiscoveryPages => self.on_discovery,
            RouteShortcut::Homepage => self.on_homepage,
            RouteShortcut::CategoryPages => self.on_discovery && self.category.is_some(),
            RouteShortcut::TagPages => self.on_discovery && self.tag.is_some(),
            RouteShortcut::TopMenu => {
                self.on_discovery && self.category.is_none() && self.tag.is_none()
            }
        }
    }
}

/// Parsed route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    Exact(String),
    /// Prefix before `.*`; empty for the bare `*` wildcard
    Wildcard(String),
    /// `/pattern/flags` literal
    Regex(String),
    Shortcut(RouteShortcut),
}

impl RoutePattern {
    /// Parse a pattern, rejecting unknown shortcuts and invalid regexes
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.is_empty() {
            return Err("route patterns must not be empty".to_string());
        }

        if pattern.starts_with('$') {
            return RouteShortcut::parse(pattern).map(RoutePattern::Shortcut).ok_or_else(|| {
                let mut message = format!("unknown route shortcut \"{}\".", pattern);
                let names = RouteShortcut::ALL.iter().map(|s| s.as_str());
                if let Some(s) = did_you_mean(pattern, names) {
                    message.push_str(&format!(" Did you mean \"{}\"?", s));
                }
                message
            });
        }

        if is_regex_literal(pattern) {
            return compile_regex_literal(pattern)
                .map(|_| RoutePattern::Regex(pattern.to_string()))
                .map_err(|e| format!("invalid route regular expression {}: {}", pattern, e));
        }

        if pattern == "*" {
            return Ok(RoutePattern::Wildcard(String::new()));
        }

        if let Some(prefix) = pattern.strip_suffix(".*") {
            return Ok(RoutePattern::Wildcard(prefix.to_string()));
        }

        Ok(RoutePattern::Exact(pattern.to_string()))
    }

    pub fn matches(&self, route_name: &str, nav: &NavigationState) -> bool {
        match self {
            RoutePattern::Exact(name) => name == route_name,
            RoutePattern::Wildcard(prefix) if prefix.is_empty() => true,
            RoutePattern::Wildcard(prefix) => {
                route_name == prefix
                    || route_name
                        .strip_prefix(prefix.as_str())
                        .map_or(false, |rest| rest.starts_with('.'))
            }
            RoutePattern::Regex(literal) => regex_literal_matches(literal, route_name),
            RoutePattern::Shortcut(shortcut) => nav.matches_shortcut(*shortcut),
        }
    }
}

/// True when `route_name` matches any of `patterns`; unparsable patterns never match
pub fn matches_any_route<'a, I>(patterns: I, route_name: &str, nav: &NavigationState) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    patterns.into_iter().any(|pattern| {
        RoutePattern::parse(pattern).map_or(false, |p| p.matches(route_name, nav))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            RoutePattern::parse("topic.show"),
            Ok(RoutePattern::Exact("topic.show".to_string()))
        );
        assert_eq!(
            RoutePattern::parse("category.*"),
            Ok(RoutePattern::Wildcard("category".to_string()))
        );
        assert_eq!(
            RoutePattern::parse("$HOMEPAGE"),
            Ok(RoutePattern::Shortcut(RouteShortcut::Homepage))
        );
        assert!(matches!(RoutePattern::parse("/^tag/"), Ok(RoutePattern::Regex(_))));
    }

    #[test]
    fn test_unknown_shortcut_suggests() {
        let err = RoutePattern::parse("$HOMEPAG").unwrap_err();
        assert!(err.contains("Did you mean \"$HOMEPAGE\"?"));
    }

    #[test]
    fn test_wildcard_matching() {
        let nav = NavigationState::default();
        let pattern = RoutePattern::parse("category.*").unwrap();

        assert!(pattern.matches("category.none", &nav));
        assert!(pattern.matches("category", &nav));
        assert!(!pattern.matches("categoryx.none", &nav));
        assert!(!pattern.matches("tag.show", &nav));
    }

    #[test]
    fn test_shortcuts_use_navigation_state() {
        let nav = NavigationState {
            on_discovery: true,
            category: Some("support".to_string()),
            ..Default::default()
        };

        assert!(matches_any_route(["$CATEGORY_PAGES"], "discovery.category", &nav));
        assert!(!matches_any_route(["$TAG_PAGES", "$TOP_MENU"], "discovery.category", &nav));
    }

    #[test]
    fn test_regex_route() {
        let nav = NavigationState::default();
        assert!(matches_any_route(["/^discovery\\./"], "discovery.latest", &nav));
        assert!(!matches_any_route(["/^discovery\\./"], "topic.show", &nav));
    }
}
