//! Two-phase registry lifecycle: open for registration, then frozen

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way freeze flag shared by a registry and its clones
#[derive(Debug, Clone, Default)]
pub struct FreezeFlag(Arc<AtomicBool>);

impl FreezeFlag {
    pub fn freeze(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_frozen(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Temporarily reopen the registry; the previous state returns when the
    /// guard is dropped
    pub fn unfreeze(&self) -> UnfreezeGuard {
        let previous = self.0.swap(false, Ordering::SeqCst);
        UnfreezeGuard {
            flag: Arc::clone(&self.0),
            previous,
        }
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Scoped unfreeze for tests
#[must_use = "the registry is frozen again as soon as the guard is dropped"]
#[derive(Debug)]
pub struct UnfreezeGuard {
    flag: Arc<AtomicBool>,
    previous: bool,
}

impl Drop for UnfreezeGuard {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_is_one_way() {
        let flag = FreezeFlag::default();
        assert!(!flag.is_frozen());
        assert!(flag.freeze());
        assert!(!flag.freeze());
        assert!(flag.is_frozen());
    }

    #[test]
    fn test_guard_restores_previous_state() {
        let flag = FreezeFlag::default();
        flag.freeze();
        {
            let _guard = flag.unfreeze();
            assert!(!flag.is_frozen());
        }
        assert!(flag.is_frozen());

        let open = FreezeFlag::default();
        drop(open.unfreeze());
        assert!(!open.is_frozen());
    }
}
