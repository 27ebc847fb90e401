//! Type system for Plinth
//!
//! Contains the dynamic `Value` type and the argument bag alias used by
//! conditions.

pub mod value;

pub use value::Value;

use std::collections::HashMap;

/// Arguments passed to a condition (everything in a condition spec except `type`)
pub type Args = HashMap<String, Value>;
