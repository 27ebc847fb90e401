//! Builder pattern for the block engine

use crate::config::EngineConfig;
use crate::error::Result;
use plinth_core::condition::{Condition, EvaluationContext};
use plinth_core::diagnostics::{ErrorNotifier, ErrorReporter};
use plinth_core::types::Value;
use plinth_runtime::{
    builtin_conditions, BlockRegistry, ConditionEvaluator, ConditionTypeRegistry, EvaluationTrace,
    OutletRegistry,
    Services, SourceIdentityProvider, UnfreezeGuard,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`Blocks`]
///
/// # Example
///
/// ```rust,ignore
/// use plinth_sdk::{BlocksBuilder, EngineConfig};
///
/// let blocks = BlocksBuilder::new()
///     .with_config(EngineConfig::load())
///     .with_services(services)
///     .build()?;
///
/// blocks.blocks().register_block(BlockDefinition::new("hero"))?;
/// blocks.freeze();
/// ```
pub struct BlocksBuilder {
    config: EngineConfig,
    services: Services,
    identity: Option<Arc<dyn SourceIdentityProvider>>,
    notifier: Option<Arc<dyn ErrorNotifier>>,
    conditions: Vec<Arc<dyn Condition>>,
    register_builtins: bool,
}

impl BlocksBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            services: Services::default(),
            identity: None,
            notifier: None,
            conditions: Vec::new(),
            register_builtins: true,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Services consulted by the built-in conditions
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Identify the extension performing each registration
    pub fn with_identity_provider(mut self, provider: Arc<dyn SourceIdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    /// Receive errors reported in production instead of raised
    pub fn with_notifier(mut self, notifier: Arc<dyn ErrorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Register an extra condition type at build time
    pub fn add_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Skip the built-in condition types
    pub fn without_builtin_conditions(mut self) -> Self {
        self.register_builtins = false;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Blocks> {
        let mut reporter = ErrorReporter::new(self.config.environment);
        if let Some(notifier) = self.notifier {
            reporter = reporter.with_notifier(notifier);
        }

        let mut blocks = BlockRegistry::new(reporter.clone());
        let mut outlets =
            OutletRegistry::with_builtin(reporter.clone(), self.config.outlets.iter().cloned());
        if let Some(identity) = self.identity {
            blocks = blocks.with_identity_provider(Arc::clone(&identity));
            outlets = outlets.with_identity_provider(identity);
        }

        let engine = Blocks {
            evaluator: ConditionEvaluator::new(ConditionTypeRegistry::new(reporter.clone())),
            config: self.config,
            services: self.services,
            reporter,
            blocks,
            outlets,
            conditions: self.conditions,
            register_builtins: self.register_builtins,
        };
        engine.register_conditions()?;

        info!(
            "Block engine built ({:?}, {} condition types, {} outlets)",
            engine.config.environment,
            engine.condition_types().type_names().len(),
            engine.outlets.get_all_outlets().len()
        );
        Ok(engine)
    }
}

impl Default for BlocksBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The block registry, outlet registry, condition types and evaluator
#[derive(Clone)]
pub struct Blocks {
    config: EngineConfig,
    services: Services,
    reporter: ErrorReporter,
    blocks: BlockRegistry,
    outlets: OutletRegistry,
    evaluator: ConditionEvaluator,
    conditions: Vec<Arc<dyn Condition>>,
    register_builtins: bool,
}

/// Reopens every registry until dropped
#[must_use = "registries refreeze when the guard is dropped"]
pub struct TestingUnfreezeGuard {
    _guards: [UnfreezeGuard; 3],
}

impl Blocks {
    pub fn builder() -> BlocksBuilder {
        BlocksBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn outlets(&self) -> &OutletRegistry {
        &self.outlets
    }

    pub fn condition_types(&self) -> &ConditionTypeRegistry {
        self.evaluator.registry()
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    /// Evaluation context for `outlet_args`, carrying the configured debug flag
    pub fn context(&self, outlet_args: impl Into<Value>) -> EvaluationContext {
        EvaluationContext::new(outlet_args).with_debug(self.config.debug)
    }

    /// Validate a block's condition tree
    pub fn validate_conditions(&self, conditions: &Value) -> Result<()> {
        Ok(self.evaluator.validate(conditions)?)
    }

    /// Whether a block with these conditions renders for `outlet_args`
    pub fn should_render(&self, conditions: &Value, outlet_args: impl Into<Value>) -> bool {
        self.evaluator.evaluate(conditions, &self.context(outlet_args))
    }

    /// Like [`Blocks::should_render`], recording every condition visited
    pub fn trace(&self, conditions: &Value, outlet_args: impl Into<Value>) -> EvaluationTrace {
        self.evaluator.evaluate_with_trace(conditions, &self.context(outlet_args))
    }

    /// Close all three registries to further registration
    pub fn freeze(&self) {
        self.blocks.freeze();
        self.outlets.freeze();
        self.condition_types().freeze();
    }

    /// Whether every registry is frozen
    pub fn is_frozen(&self) -> bool {
        self.blocks.is_frozen() && self.outlets.is_frozen() && self.condition_types().is_frozen()
    }

    #[doc(hidden)]
    pub fn unfreeze_for_testing(&self) -> TestingUnfreezeGuard {
        TestingUnfreezeGuard {
            _guards: [
                self.blocks.unfreeze_for_testing(),
                self.outlets.unfreeze_for_testing(),
                self.condition_types().unfreeze_for_testing(),
            ],
        }
    }

    /// Return every registry to its freshly built state
    #[doc(hidden)]
    pub fn reset_for_testing(&self) -> Result<()> {
        self.blocks.reset_for_testing();
        self.outlets.reset_for_testing();
        self.condition_types().reset_for_testing();
        self.register_conditions()
    }

    fn register_conditions(&self) -> Result<()> {
        let types = self.condition_types();
        if self.register_builtins {
            for condition in builtin_conditions(&self.services)? {
                types.register_condition_type(condition)?;
            }
        }
        for condition in &self.conditions {
            types.register_condition_type(Arc::clone(condition))?;
        }
        debug!("Registered {} condition types", types.type_names().len());
        Ok(())
    }
}

impl std::fmt::Debug for Blocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blocks")
            .field("config", &self.config)
            .field("blocks", &self.blocks)
            .field("condition_types", &self.condition_types().type_names())
            .field("outlets", &self.outlets.get_all_outlets())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_core::diagnostics::Environment;
    use plinth_core::error::ErrorKind;
    use plinth_runtime::BlockDefinition;

    #[test]
    fn test_build_registers_builtin_conditions() {
        let engine = BlocksBuilder::new().build().unwrap();
        let mut names = engine.condition_types().type_names();
        names.sort();
        assert_eq!(names, vec!["outlet-arg", "route", "setting", "user", "viewport"]);
        assert!(engine.outlets().is_valid_outlet("sidebar-blocks"));
    }

    #[test]
    fn test_configured_outlets() {
        let config = EngineConfig::new().with_outlets(["hero-blocks"]);
        let engine = BlocksBuilder::new()
            .with_config(config)
            .without_builtin_conditions()
            .build()
            .unwrap();

        assert_eq!(engine.outlets().get_all_outlets(), vec!["hero-blocks".to_string()]);
        assert!(engine.condition_types().type_names().is_empty());
    }

    #[test]
    fn test_freeze_all_and_guard() {
        let engine = BlocksBuilder::new()
            .with_config(EngineConfig::new().with_environment(Environment::Test))
            .build()
            .unwrap();
        engine.freeze();
        assert!(engine.is_frozen());

        let err = engine.blocks().register_block(BlockDefinition::new("hero")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::RegistryFrozen { .. }));

        {
            let _guard = engine.unfreeze_for_testing();
            assert!(!engine.is_frozen());
            engine.blocks().register_block(BlockDefinition::new("hero")).unwrap();
        }
        assert!(engine.is_frozen());
    }

    #[test]
    fn test_reset_restores_condition_types() {
        let engine = BlocksBuilder::new().build().unwrap();
        engine.blocks().register_block(BlockDefinition::new("hero")).unwrap();
        engine.freeze();

        engine.reset_for_testing().unwrap();

        assert!(!engine.is_frozen());
        assert!(!engine.blocks().has_block("hero"));
        assert!(engine.condition_types().has_condition_type("route"));
    }
}
