//! Diagnostics: structural paths, formatters, suggestions and reporting
//!
//! Errors raised while validating nested rule trees carry the path of the
//! offending key plus the tree itself; the formatters here turn that into an
//! annotated listing pointing at the exact key that is wrong.

mod format;
mod path;
mod reporter;
mod suggest;

pub use format::{format_entry, format_tree, format_value};
pub use path::{ErrorPath, PathSegment};
pub use reporter::{Environment, ErrorNotifier, ErrorReporter};
pub use suggest::{did_you_mean, suggest};
