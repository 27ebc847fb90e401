//! Registries for blocks, outlets and condition types
//!
//! Each registry is open for registration until frozen, after which it is
//! read-only. Clones share state, so a registry can be handed to background
//! tasks that finish block resolution.

pub mod block;
pub mod condition_type;
pub mod identity;
pub mod lifecycle;
pub mod name;
pub mod outlet;

pub use block::{
    block_factory, BlockDefinition, BlockEntry, BlockFactory, BlockRef, BlockRegistry,
    SyncResolution,
};
pub use condition_type::ConditionTypeRegistry;
pub use identity::{FixedIdentity, SourceIdentity, SourceIdentityProvider};
pub use lifecycle::{FreezeFlag, UnfreezeGuard};
pub use name::{parse_name, strip_optional, ParsedName};
pub use outlet::{OutletMetadata, OutletRegistry, DEFAULT_OUTLETS};
