//! Pattern matchers
//!
//! Pure functions shared by the built-in conditions: route-name patterns,
//! parameter specs with AND/OR/NOT combinators and generic value specs.

mod params;
mod pattern;
mod route;
mod value;

pub use params::{match_params, validate_params};
pub use pattern::{
    compile_regex_literal, is_regex_literal, parse_regex_literal, regex_literal_matches,
};
pub use route::{matches_any_route, NavigationState, RoutePattern, RouteShortcut};
pub use value::{matches_value, validate_value_spec, Comparison};
