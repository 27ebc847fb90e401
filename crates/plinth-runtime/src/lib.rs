//! Plinth Runtime - Registries and built-in conditions for the Plinth block engine
//!
//! This crate provides:
//! - Block, outlet and condition-type registries with a freeze lifecycle
//! - Namespace enforcement keyed by the registering source
//! - Lazy, de-duplicated async resolution of factory-backed blocks
//! - The built-in `route`, `user`, `setting`, `viewport` and `outlet-arg` conditions
//! - The condition-tree evaluator used when rendering outlets

pub mod conditions;
pub mod evaluator;
pub mod registry;
pub mod services;

// Re-export main types
pub use conditions::builtin_conditions;
pub use evaluator::{ConditionEvaluator, EvaluationTrace, TraceEntry};
pub use plinth_core::error::{BlockError, ErrorKind, Result};
pub use registry::{
    BlockDefinition, BlockEntry, BlockRegistry, ConditionTypeRegistry, OutletMetadata,
    OutletRegistry,
    SourceIdentity, SourceIdentityProvider, SyncResolution, UnfreezeGuard,
};
pub use services::{
    CurrentUser, CurrentUserService, RouteState, RouterService, Services, SiteSettingsService,
    StaticCurrentUser, StaticRouter, StaticSiteSettings, StaticViewport, ViewportService,
    ViewportState,
};
