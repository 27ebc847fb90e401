//! Block registry
//!
//! Blocks are registered either as resolved [`BlockDefinition`]s or as
//! factories producing one asynchronously. Factory-backed entries move through
//! unresolved, pending, then resolved or failed:
//! - concurrent resolutions share one in-flight future, so the factory runs once
//! - a successful result replaces the factory entry in place
//! - a failure (error, name mismatch or panic) is memoized and never retried
//! - once started, a resolution is driven to completion on the tokio runtime
//!   even if every caller stops waiting on it

use super::identity::{FixedIdentity, SourceIdentity, SourceIdentityProvider};
use super::lifecycle::{FreezeFlag, UnfreezeGuard};
use super::name::{check_namespace_shape, parse_name, strip_optional};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use plinth_core::diagnostics::ErrorReporter;
use plinth_core::error::{BlockError, ErrorKind, RegistryKind, Result};
use plinth_core::types::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A renderable block implementation
#[derive(Clone, Default)]
pub struct BlockDefinition {
    name: String,
    metadata: Value,
    /// Opaque payload handed to the renderer
    component: Option<Arc<dyn Any + Send + Sync>>,
}

impl BlockDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Value>) -> Self {
        self.metadata = metadata.into();
        self
    }

    pub fn with_component<T: Any + Send + Sync>(mut self, component: T) -> Self {
        self.component = Some(Arc::new(component));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Downcast the renderer payload
    pub fn component<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.component.as_ref().and_then(|c| c.downcast_ref::<T>())
    }
}

impl fmt::Debug for BlockDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .field("component", &self.component.is_some())
            .finish()
    }
}

/// Deferred block implementation
pub type BlockFactory =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<BlockDefinition>> + Send + Sync>;

/// Wrap an async closure as a [`BlockFactory`]
pub fn block_factory<F, Fut>(factory: F) -> BlockFactory
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<BlockDefinition>> + Send + 'static,
{
    Arc::new(move || factory().boxed())
}

/// A registered block
#[derive(Clone)]
pub enum BlockEntry {
    Resolved(Arc<BlockDefinition>),
    Factory(BlockFactory),
}

impl BlockEntry {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BlockEntry::Resolved(_))
    }
}

impl fmt::Debug for BlockEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockEntry::Resolved(block) => f.debug_tuple("Resolved").field(block).finish(),
            BlockEntry::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Either a block name or an implementation
#[derive(Debug, Clone, Copy)]
pub enum BlockRef<'a> {
    Name(&'a str),
    Block(&'a BlockDefinition),
}

impl<'a> From<&'a str> for BlockRef<'a> {
    fn from(name: &'a str) -> Self {
        BlockRef::Name(name)
    }
}

impl<'a> From<&'a String> for BlockRef<'a> {
    fn from(name: &'a String) -> Self {
        BlockRef::Name(name)
    }
}

impl<'a> From<&'a BlockDefinition> for BlockRef<'a> {
    fn from(block: &'a BlockDefinition) -> Self {
        BlockRef::Block(block)
    }
}

impl<'a> BlockRef<'a> {
    fn name(&self) -> &'a str {
        match self {
            BlockRef::Name(name) => name,
            BlockRef::Block(block) => block.name(),
        }
    }
}

/// Outcome of a synchronous lookup
#[derive(Debug, Clone)]
pub enum SyncResolution {
    /// Block is available now
    Ready(Arc<BlockDefinition>),
    /// Factory resolution has been started (or is already running)
    Pending,
    /// Optional reference (`name?`) to an unregistered block
    OptionalMissing,
    /// Required reference to an unregistered block (reported)
    Missing,
    /// Factory failed earlier; it will not be retried
    Failed,
}

type SharedResolution =
    Shared<BoxFuture<'static, std::result::Result<Arc<BlockDefinition>, BlockError>>>;

struct PendingResolution {
    shared: SharedResolution,
    /// A background task owns a clone of `shared`
    driven: bool,
}

impl PendingResolution {
    /// Detach a task polling the resolution, if a runtime is available
    fn drive(&mut self, name: &str) {
        if self.driven {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = self.shared.clone();
                handle.spawn(async move {
                    let _ = shared.await;
                });
                self.driven = true;
            }
            Err(_) => debug!("No tokio runtime yet; block \"{}\" waits for a driver", name),
        }
    }
}

#[derive(Default)]
struct BlockState {
    entries: HashMap<String, BlockEntry>,
    /// In-flight factory resolutions
    pending: HashMap<String, PendingResolution>,
    /// Memoized factory failures
    failed: HashMap<String, BlockError>,
    /// Source key -> namespace prefix it registered with
    namespaces: HashMap<String, String>,
    /// Bumped on reset so stale resolutions do not write back
    generation: u64,
}

enum Step {
    Ready(Arc<BlockDefinition>),
    Failed,
    Missing,
    Await(SharedResolution),
}

/// Registry of blocks by name
#[derive(Clone)]
pub struct BlockRegistry {
    state: Arc<Mutex<BlockState>>,
    frozen: FreezeFlag,
    reporter: ErrorReporter,
    identity: Arc<dyn SourceIdentityProvider>,
}

impl BlockRegistry {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self {
            state: Arc::new(Mutex::new(BlockState::default())),
            frozen: FreezeFlag::default(),
            reporter,
            identity: Arc::new(FixedIdentity(SourceIdentity::Core)),
        }
    }

    /// Use `provider` to identify who performs each registration
    pub fn with_identity_provider(mut self, provider: Arc<dyn SourceIdentityProvider>) -> Self {
        self.identity = provider;
        self
    }

    /// Register a resolved block implementation
    #[track_caller]
    pub fn register_block(&self, block: BlockDefinition) -> Result<()> {
        let name = block.name().to_string();
        self.insert(&name, BlockEntry::Resolved(Arc::new(block)))
            .or_else(|err| self.reporter.raise(err))
    }

    /// Register a factory producing the block on first resolution
    #[track_caller]
    pub fn register_block_factory<F, Fut>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<BlockDefinition>> + Send + 'static,
    {
        self.insert(name, BlockEntry::Factory(block_factory(factory)))
            .or_else(|err| self.reporter.raise(err))
    }

    #[track_caller]
    fn insert(&self, name: &str, entry: BlockEntry) -> Result<()> {
        if self.frozen.is_frozen() {
            return Err(BlockError::new(ErrorKind::RegistryFrozen {
                kind: RegistryKind::Block,
                name: name.to_string(),
            }));
        }

        if name.is_empty() && entry.is_resolved() {
            return Err(BlockError::new(ErrorKind::InvalidBlock(
                "block implementation has no name".to_string(),
            )));
        }

        let parsed = parse_name(RegistryKind::Block, name)?;
        let identity = self.identity.current();
        check_namespace_shape(&parsed, name, &identity)?;

        let mut state = self.state.lock();

        let source_key = identity.key();
        let prefix = parsed.namespace_prefix();
        if let (Some(key), Some(prefix)) = (&source_key, &prefix) {
            if let Some(previous) = state.namespaces.get(key).filter(|p| *p != prefix) {
                return Err(BlockError::new(ErrorKind::NamespaceViolation {
                    name: name.to_string(),
                    origin: identity.to_string(),
                    reason: format!(
                        "this source already registers under namespace \"{}\", not \"{}\"",
                        previous, prefix
                    ),
                }));
            }
        }

        if state.entries.contains_key(name) {
            return Err(BlockError::new(ErrorKind::DuplicateName {
                kind: RegistryKind::Block,
                name: name.to_string(),
            }));
        }

        let kind = if entry.is_resolved() { "block" } else { "block factory" };
        state.entries.insert(name.to_string(), entry);
        if let (Some(key), Some(prefix)) = (source_key, prefix) {
            state.namespaces.entry(key).or_insert(prefix);
        }
        debug!("Registered {} \"{}\" ({})", kind, name, identity);
        Ok(())
    }

    /// Whether a block is registered under the name; never triggers resolution
    pub fn has_block<'a>(&self, reference: impl Into<BlockRef<'a>>) -> bool {
        let name = reference.into().name();
        !name.is_empty() && self.state.lock().entries.contains_key(name)
    }

    /// Whether the block is registered and not waiting on its factory
    pub fn is_block_resolved(&self, name: &str) -> bool {
        matches!(self.state.lock().entries.get(name), Some(BlockEntry::Resolved(_)))
    }

    pub fn get_block_entry(&self, name: &str) -> Option<BlockEntry> {
        self.state.lock().entries.get(name).cloned()
    }

    /// Snapshot of every entry, sorted by name
    pub fn get_all_block_entries(&self) -> BTreeMap<String, BlockEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    /// Resolve a name (or pass through an implementation) to a block
    ///
    /// Returns `Ok(None)` when the block's factory failed on an earlier call,
    /// or when it fails now in production (the failure is notified instead).
    pub async fn resolve_block<'a>(
        &self,
        reference: impl Into<BlockRef<'a>>,
    ) -> Result<Option<Arc<BlockDefinition>>> {
        let name = match reference.into() {
            BlockRef::Block(block) if block.name().is_empty() => {
                return Err(BlockError::new(ErrorKind::InvalidReference(
                    "block implementation has no name".to_string(),
                )))
            }
            BlockRef::Block(block) => return Ok(Some(Arc::new(block.clone()))),
            BlockRef::Name("") => {
                return Err(BlockError::new(ErrorKind::InvalidReference(
                    "block name must not be empty".to_string(),
                )))
            }
            BlockRef::Name(name) => name,
        };

        match self.begin_resolution(name) {
            Step::Ready(block) => Ok(Some(block)),
            Step::Missing => Err(BlockError::new(ErrorKind::UnregisteredBlock {
                name: name.to_string(),
            })),
            Step::Failed => {
                debug!("Block \"{}\" failed to resolve earlier; not retrying", name);
                Ok(None)
            }
            Step::Await(shared) => match shared.await {
                Ok(block) => Ok(Some(block)),
                Err(_) if self.reporter.is_production() => Ok(None),
                Err(err) => Err(err),
            },
        }
    }

    /// Non-blocking lookup for render-time use
    ///
    /// Accepts `name` or `name?`. An unresolved factory is resolved in a
    /// background task on the current tokio runtime; a call made outside any
    /// runtime leaves that to the next call made inside one.
    #[track_caller]
    pub fn resolve_block_sync(&self, reference: &str) -> Result<SyncResolution> {
        let (name, optional) = strip_optional(reference);

        match self.begin_resolution(name) {
            Step::Ready(block) => Ok(SyncResolution::Ready(block)),
            Step::Failed => Ok(SyncResolution::Failed),
            Step::Missing if optional => Ok(SyncResolution::OptionalMissing),
            Step::Missing => {
                self.reporter.raise(BlockError::new(ErrorKind::UnregisteredBlock {
                    name: name.to_string(),
                }))?;
                Ok(SyncResolution::Missing)
            }
            Step::Await(_) => Ok(SyncResolution::Pending),
        }
    }

    /// Find the current resolution step for `name`, starting the factory if needed
    fn begin_resolution(&self, name: &str) -> Step {
        let mut state = self.state.lock();

        if state.failed.contains_key(name) {
            return Step::Failed;
        }

        let factory = match state.entries.get(name) {
            None => return Step::Missing,
            Some(BlockEntry::Resolved(block)) => return Step::Ready(Arc::clone(block)),
            Some(BlockEntry::Factory(factory)) => Arc::clone(factory),
        };

        if let Some(pending) = state.pending.get_mut(name) {
            pending.drive(name);
            return Step::Await(pending.shared.clone());
        }

        debug!("Resolving block factory \"{}\"", name);
        let mut pending = PendingResolution {
            shared: self.resolution(name.to_string(), factory, state.generation),
            driven: false,
        };
        pending.drive(name);
        let shared = pending.shared.clone();
        state.pending.insert(name.to_string(), pending);
        Step::Await(shared)
    }

    fn resolution(&self, name: String, factory: BlockFactory, generation: u64) -> SharedResolution {
        let state = Arc::clone(&self.state);
        let reporter = self.reporter.clone();

        async move {
            let outcome = AssertUnwindSafe(async { factory().await })
                .catch_unwind()
                .await;

            let result = match outcome {
                Ok(Ok(block)) if block.name() == name => Ok(Arc::new(block)),
                Ok(Ok(block)) => Err(BlockError::new(ErrorKind::NameMismatch {
                    expected: name.clone(),
                    actual: block.name().to_string(),
                })),
                Ok(Err(err)) => Err(BlockError::new(ErrorKind::ResolutionFailure {
                    name: name.clone(),
                    message: format!("{:#}", err),
                })),
                Err(panic) => Err(BlockError::new(ErrorKind::ResolutionFailure {
                    name: name.clone(),
                    message: format!("factory panicked: {}", panic_message(panic.as_ref())),
                })),
            };

            let current = {
                let mut state = state.lock();
                let current = state.generation == generation;
                if current {
                    state.pending.remove(&name);
                    match &result {
                        Ok(block) => {
                            let entry = BlockEntry::Resolved(Arc::clone(block));
                            state.entries.insert(name.clone(), entry);
                        }
                        Err(err) => {
                            state.failed.insert(name.clone(), err.clone());
                        }
                    }
                }
                current
            };

            match &result {
                Ok(_) => debug!("Resolved block \"{}\"", name),
                Err(_) if !current => debug!("Dropping stale failure for block \"{}\"", name),
                // Notified outside the lock; the notifier may call back into the registry
                Err(err) if reporter.is_production() => reporter.notify(err),
                Err(err) => warn!("Block \"{}\" failed to resolve: {}", name, err),
            }
            result
        }
        .boxed()
        .shared()
    }

    /// The memoized failure for `name`, if its factory failed
    pub fn resolution_failure(&self, name: &str) -> Option<BlockError> {
        self.state.lock().failed.get(name).cloned()
    }

    pub fn freeze(&self) {
        if self.frozen.freeze() {
            info!("Block registry frozen with {} blocks", self.state.lock().entries.len());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_frozen()
    }

    #[doc(hidden)]
    pub fn unfreeze_for_testing(&self) -> UnfreezeGuard {
        self.frozen.unfreeze()
    }

    /// Drop every entry, cache, pending resolution and namespace record
    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = BlockState {
            generation,
            ..BlockState::default()
        };
        self.frozen.reset();
    }
}

impl fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BlockRegistry")
            .field("blocks", &state.entries.len())
            .field("pending", &state.pending.len())
            .field("failed", &state.failed.len())
            .field("frozen", &self.frozen.is_frozen())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
