//! Plinth SDK
//!
//! Wires configuration, logging, the registries and the built-in conditions
//! into a single [`Blocks`] engine.

pub mod builder;
pub mod config;
pub mod error;
pub mod logging;

// Re-export main types
pub use builder::{Blocks, BlocksBuilder, TestingUnfreezeGuard};
pub use config::{EngineConfig, LogFormat};
pub use error::{Result, SdkError};
pub use logging::{default_filter, init_from_config, init_tracing};

// Re-export commonly used types from dependencies
pub use plinth_core::condition::{
    decorate, ArgSpec, Condition, ConditionConfig, ConditionHandler, EvaluationContext,
};
pub use plinth_core::diagnostics::{Environment, ErrorNotifier};
pub use plinth_core::error::{BlockError, ErrorKind};
pub use plinth_core::types::{Args, Value};
pub use plinth_runtime::{
    BlockDefinition, OutletMetadata, Services, SourceIdentity, SourceIdentityProvider,
    SyncResolution,
};
