//! Outlet registry
//!
//! Built-in outlets come from configuration; extensions may add custom ones
//! before the registry is frozen.

use super::identity::{FixedIdentity, SourceIdentity, SourceIdentityProvider};
use super::lifecycle::{FreezeFlag, UnfreezeGuard};
use super::name::{check_namespace_shape, parse_name};
use parking_lot::RwLock;
use plinth_core::diagnostics::ErrorReporter;
use plinth_core::error::{BlockError, ErrorKind, RegistryKind, Result};
use plinth_core::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Outlets every host provides unless configured otherwise
pub const DEFAULT_OUTLETS: &[&str] = &[
    "hero-blocks",
    "homepage-blocks",
    "main-outlet-blocks",
    "sidebar-blocks",
];

/// Description of a custom outlet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutletMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Shape of the arguments the outlet passes to its blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl OutletMetadata {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            args: None,
        }
    }

    pub fn with_args(mut self, args: impl Into<Value>) -> Self {
        self.args = Some(args.into());
        self
    }
}

#[derive(Default)]
struct OutletState {
    builtin: BTreeSet<String>,
    custom: HashMap<String, OutletMetadata>,
}

/// Registry of outlet names
#[derive(Clone)]
pub struct OutletRegistry {
    state: Arc<RwLock<OutletState>>,
    frozen: FreezeFlag,
    reporter: ErrorReporter,
    identity: Arc<dyn SourceIdentityProvider>,
}

impl OutletRegistry {
    /// Registry seeded with [`DEFAULT_OUTLETS`]
    pub fn new(reporter: ErrorReporter) -> Self {
        Self::with_builtin(reporter, DEFAULT_OUTLETS.iter().copied())
    }

    /// Registry seeded with the given built-in outlet names
    pub fn with_builtin<S: Into<String>>(
        reporter: ErrorReporter,
        builtin: impl IntoIterator<Item = S>,
    ) -> Self {
        let state = OutletState {
            builtin: builtin.into_iter().map(Into::into).collect(),
            custom: HashMap::new(),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            frozen: FreezeFlag::default(),
            reporter,
            identity: Arc::new(FixedIdentity(SourceIdentity::Core)),
        }
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn SourceIdentityProvider>) -> Self {
        self.identity = provider;
        self
    }

    #[track_caller]
    pub fn register_outlet(&self, name: &str, metadata: OutletMetadata) -> Result<()> {
        self.insert(name, metadata).or_else(|err| self.reporter.raise(err))
    }

    #[track_caller]
    fn insert(&self, name: &str, metadata: OutletMetadata) -> Result<()> {
        if self.frozen.is_frozen() {
            return Err(BlockError::new(ErrorKind::RegistryFrozen {
                kind: RegistryKind::Outlet,
                name: name.to_string(),
            }));
        }

        let parsed = parse_name(RegistryKind::Outlet, name)?;
        let identity = self.identity.current();
        check_namespace_shape(&parsed, name, &identity)?;

        let mut state = self.state.write();
        if state.builtin.contains(name) || state.custom.contains_key(name) {
            return Err(BlockError::new(ErrorKind::DuplicateName {
                kind: RegistryKind::Outlet,
                name: name.to_string(),
            }));
        }

        state.custom.insert(name.to_string(), metadata);
        debug!("Registered outlet \"{}\" ({})", name, identity);
        Ok(())
    }

    pub fn is_valid_outlet(&self, name: &str) -> bool {
        let state = self.state.read();
        state.builtin.contains(name) || state.custom.contains_key(name)
    }

    /// Built-in and custom outlet names, sorted
    pub fn get_all_outlets(&self) -> Vec<String> {
        let state = self.state.read();
        let mut names: BTreeSet<String> = state.builtin.clone();
        names.extend(state.custom.keys().cloned());
        names.into_iter().collect()
    }

    pub fn get_custom_outlet(&self, name: &str) -> Option<OutletMetadata> {
        self.state.read().custom.get(name).cloned()
    }

    pub fn freeze(&self) {
        if self.frozen.freeze() {
            info!("Outlet registry frozen with {} custom outlets", self.state.read().custom.len());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_frozen()
    }

    #[doc(hidden)]
    pub fn unfreeze_for_testing(&self) -> UnfreezeGuard {
        self.frozen.unfreeze()
    }

    /// Drop custom outlets; built-in outlets stay
    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        self.state.write().custom.clear();
        self.frozen.reset();
    }
}

impl fmt::Debug for OutletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("OutletRegistry")
            .field("builtin", &state.builtin)
            .field("custom", &state.custom.len())
            .field("frozen", &self.frozen.is_frozen())
            .finish()
    }
}
