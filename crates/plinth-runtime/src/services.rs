//! Ambient services the built-in conditions read from
//!
//! The host supplies implementations for its router, session, site settings
//! and viewport. The `Static*` implementations hold plain values and are
//! enough for tests and server-side evaluation.

use parking_lot::RwLock;
use plinth_core::matchers::NavigationState;
use plinth_core::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Current route as seen by the router
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteState {
    /// Route name, e.g. `discovery.latest`
    pub name: String,
    pub params: HashMap<String, Value>,
    pub query_params: HashMap<String, Value>,
    pub nav: NavigationState,
}

impl RouteState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn with_nav(mut self, nav: NavigationState) -> Self {
        self.nav = nav;
        self
    }
}

/// The signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub moderator: bool,
    #[serde(default)]
    pub staff: bool,
    #[serde(default)]
    pub trust_level: u8,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl CurrentUser {
    /// Read a user object supplied through outlet arguments
    ///
    /// Groups may be given as names or as `{ "name": ... }` objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let flag = |key: &str| map.get(key).map(Value::is_truthy).unwrap_or(false);
        let groups = map
            .get("groups")
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|g| match g {
                        Value::String(name) => Some(name.clone()),
                        Value::Object(_) => {
                            g.get("name").and_then(Value::as_str).map(str::to_string)
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            admin: flag("admin"),
            moderator: flag("moderator"),
            staff: flag("staff"),
            trust_level: map
                .get("trust_level")
                .and_then(Value::as_i64)
                .map(|tl| tl.clamp(0, u8::MAX as i64) as u8)
                .unwrap_or(0),
            groups,
        })
    }

    /// Admins and moderators count as staff
    pub fn is_staff(&self) -> bool {
        self.staff || self.admin || self.moderator
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

pub trait RouterService: Send + Sync {
    fn current_route(&self) -> RouteState;
}

pub trait CurrentUserService: Send + Sync {
    /// `None` for anonymous visitors
    fn current_user(&self) -> Option<CurrentUser>;
}

pub trait SiteSettingsService: Send + Sync {
    fn get(&self, name: &str) -> Option<Value>;

    /// Every known setting name, for suggestions
    fn names(&self) -> Vec<String>;
}

pub trait ViewportService: Send + Sync {
    /// Viewport width in CSS pixels
    fn width(&self) -> u32;

    fn is_mobile_device(&self) -> bool;

    fn has_touch(&self) -> bool;
}

/// Router holding a fixed, replaceable route
#[derive(Debug, Default)]
pub struct StaticRouter(RwLock<RouteState>);

impl StaticRouter {
    pub fn new(route: RouteState) -> Self {
        Self(RwLock::new(route))
    }

    pub fn set(&self, route: RouteState) {
        *self.0.write() = route;
    }
}

impl RouterService for StaticRouter {
    fn current_route(&self) -> RouteState {
        self.0.read().clone()
    }
}

#[derive(Debug, Default)]
pub struct StaticCurrentUser(RwLock<Option<CurrentUser>>);

impl StaticCurrentUser {
    pub fn new(user: Option<CurrentUser>) -> Self {
        Self(RwLock::new(user))
    }

    pub fn set(&self, user: Option<CurrentUser>) {
        *self.0.write() = user;
    }
}

impl CurrentUserService for StaticCurrentUser {
    fn current_user(&self) -> Option<CurrentUser> {
        self.0.read().clone()
    }
}

#[derive(Debug, Default)]
pub struct StaticSiteSettings(RwLock<HashMap<String, Value>>);

impl StaticSiteSettings {
    pub fn new(settings: HashMap<String, Value>) -> Self {
        Self(RwLock::new(settings))
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.write().insert(name.into(), value.into());
    }
}

impl SiteSettingsService for StaticSiteSettings {
    fn get(&self, name: &str) -> Option<Value> {
        self.0.read().get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub width: u32,
    pub mobile: bool,
    pub touch: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            width: 1280,
            mobile: false,
            touch: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct StaticViewport(RwLock<ViewportState>);

impl StaticViewport {
    pub fn new(state: ViewportState) -> Self {
        Self(RwLock::new(state))
    }

    pub fn set(&self, state: ViewportState) {
        *self.0.write() = state;
    }
}

impl ViewportService for StaticViewport {
    fn width(&self) -> u32 {
        self.0.read().width
    }

    fn is_mobile_device(&self) -> bool {
        self.0.read().mobile
    }

    fn has_touch(&self) -> bool {
        self.0.read().touch
    }
}

/// The ambient services handed to the built-in conditions
#[derive(Clone)]
pub struct Services {
    pub router: Arc<dyn RouterService>,
    pub current_user: Arc<dyn CurrentUserService>,
    pub site_settings: Arc<dyn SiteSettingsService>,
    pub viewport: Arc<dyn ViewportService>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            router: Arc::new(StaticRouter::default()),
            current_user: Arc::new(StaticCurrentUser::default()),
            site_settings: Arc::new(StaticSiteSettings::default()),
            viewport: Arc::new(StaticViewport::default()),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_value() {
        let value: Value = serde_json::from_str(
            r#"{"admin": false, "moderator": true, "trust_level": 3,
                "groups": ["beta", {"name": "staff"}]}"#,
        )
        .unwrap();
        let user = CurrentUser::from_value(&value).unwrap();

        assert!(user.is_staff());
        assert_eq!(user.trust_level, 3);
        assert_eq!(user.groups, vec!["beta".to_string(), "staff".to_string()]);
        assert!(CurrentUser::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_static_settings_names_sorted() {
        let settings = StaticSiteSettings::default();
        settings.set("top_menu", "latest|new");
        settings.set("enable_badges", true);
        assert_eq!(settings.names(), vec!["enable_badges".to_string(), "top_menu".to_string()]);
    }
}
