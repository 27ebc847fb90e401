//! Condition-type registry
//!
//! Only conditions produced by the registration decorator are accepted.

use super::lifecycle::{FreezeFlag, UnfreezeGuard};
use super::name::check_condition_type_name;
use parking_lot::RwLock;
use plinth_core::condition::Condition;
use plinth_core::diagnostics::ErrorReporter;
use plinth_core::error::{BlockError, ErrorKind, RegistryKind, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of condition types by name
#[derive(Clone, Default)]
pub struct ConditionTypeRegistry {
    types: Arc<RwLock<HashMap<String, Arc<dyn Condition>>>>,
    frozen: FreezeFlag,
    reporter: ErrorReporter,
}

impl ConditionTypeRegistry {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self {
            reporter,
            ..Self::default()
        }
    }

    #[track_caller]
    pub fn register_condition_type(&self, condition: Arc<dyn Condition>) -> Result<()> {
        self.insert(condition).or_else(|err| self.reporter.raise(err))
    }

    #[track_caller]
    fn insert(&self, condition: Arc<dyn Condition>) -> Result<()> {
        let name = condition.type_name().to_string();

        if self.frozen.is_frozen() {
            return Err(BlockError::new(ErrorKind::RegistryFrozen {
                kind: RegistryKind::ConditionType,
                name,
            }));
        }

        check_condition_type_name(&name)?;

        if condition.definition().is_none() {
            return Err(BlockError::new(ErrorKind::NotDecorated { name }));
        }

        let mut types = self.types.write();
        if types.contains_key(&name) {
            return Err(BlockError::new(ErrorKind::DuplicateName {
                kind: RegistryKind::ConditionType,
                name,
            }));
        }

        debug!("Registered condition type \"{}\"", name);
        types.insert(name, condition);
        Ok(())
    }

    pub fn has_condition_type(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn get_condition_type(&self, name: &str) -> Option<Arc<dyn Condition>> {
        self.types.read().get(name).cloned()
    }

    /// Snapshot of every registered type, sorted by name
    pub fn get_all_condition_type_entries(&self) -> BTreeMap<String, Arc<dyn Condition>> {
        self.types
            .read()
            .iter()
            .map(|(name, condition)| (name.clone(), Arc::clone(condition)))
            .collect()
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        self.get_all_condition_type_entries().into_keys().collect()
    }

    pub fn freeze(&self) {
        if self.frozen.freeze() {
            info!("Condition type registry frozen with {} types", self.types.read().len());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_frozen()
    }

    #[doc(hidden)]
    pub fn unfreeze_for_testing(&self) -> UnfreezeGuard {
        self.frozen.unfreeze()
    }

    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        self.types.write().clear();
        self.frozen.reset();
    }
}

impl fmt::Debug for ConditionTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionTypeRegistry")
            .field("types", &self.type_names())
            .field("frozen", &self.frozen.is_frozen())
            .finish()
    }
}
