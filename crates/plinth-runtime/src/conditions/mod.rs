//! Built-in condition types
//!
//! - `route`: current route name, params and query params
//! - `user`: current user flags, trust level and groups
//! - `setting`: site setting values
//! - `viewport`: width breakpoints and device capabilities
//! - `outlet-arg`: values in the outlet arguments

pub mod outlet_arg;
pub mod route;
pub mod setting;
pub mod user;
pub mod viewport;

pub use outlet_arg::OutletArgCondition;
pub use route::RouteCondition;
pub use setting::SettingCondition;
pub use user::UserCondition;
pub use viewport::{ViewportCondition, BREAKPOINTS};

use crate::services::Services;
use plinth_core::condition::{decorate, Condition};
use plinth_core::error::Result;
use std::sync::Arc;

/// Decorate every built-in condition type against `services`
pub fn builtin_conditions(services: &Services) -> Result<Vec<Arc<dyn Condition>>> {
    let mut conditions: Vec<Arc<dyn Condition>> = Vec::with_capacity(5);
    conditions.push(Arc::new(decorate(
        RouteCondition::config(),
        RouteCondition::new(Arc::clone(&services.router)),
    )?));
    conditions.push(Arc::new(decorate(
        UserCondition::config(),
        UserCondition::new(Arc::clone(&services.current_user)),
    )?));
    conditions.push(Arc::new(decorate(
        SettingCondition::config(),
        SettingCondition::new(Arc::clone(&services.site_settings)),
    )?));
    conditions.push(Arc::new(decorate(
        ViewportCondition::config(),
        ViewportCondition::new(Arc::clone(&services.viewport)),
    )?));
    conditions.push(Arc::new(decorate(OutletArgCondition::config(), OutletArgCondition)?));
    Ok(conditions)
}
