//! Source identity of the code performing a registration

use std::fmt;

/// Who is registering: the host itself, a theme or a plugin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SourceIdentity {
    #[default]
    Core,
    Theme(String),
    Plugin(String),
}

impl SourceIdentity {
    /// Key of the namespace-consistency map; `None` for core
    pub fn key(&self) -> Option<String> {
        match self {
            SourceIdentity::Core => None,
            SourceIdentity::Theme(id) => Some(format!("theme:{}", id)),
            SourceIdentity::Plugin(id) => Some(format!("plugin:{}", id)),
        }
    }

    pub fn is_core(&self) -> bool {
        matches!(self, SourceIdentity::Core)
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceIdentity::Core => f.write_str("core"),
            SourceIdentity::Theme(id) => write!(f, "theme \"{}\"", id),
            SourceIdentity::Plugin(id) => write!(f, "plugin \"{}\"", id),
        }
    }
}

/// Collaborator that tells the registries who is calling
pub trait SourceIdentityProvider: Send + Sync {
    fn current(&self) -> SourceIdentity;
}

impl<F> SourceIdentityProvider for F
where
    F: Fn() -> SourceIdentity + Send + Sync,
{
    fn current(&self) -> SourceIdentity {
        self()
    }
}

/// Provider that always reports the same identity
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity(pub SourceIdentity);

impl SourceIdentityProvider for FixedIdentity {
    fn current(&self) -> SourceIdentity {
        self.0.clone()
    }
}
