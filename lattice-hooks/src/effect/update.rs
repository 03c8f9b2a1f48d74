//! Update-only effect.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::gate::Effect;
use super::teardown::IntoTeardown;
use super::EffectId;
use crate::deps::Dep;

/// An [`Effect`] that ignores the first evaluation after mount.
///
/// On mount there is no previous value for the deps to have changed from,
/// so the first evaluation only records them. Every later change runs the
/// body under the usual teardown-then-run contract. Unmounting resets the
/// gate, so a revived instance skips its first evaluation again.
#[derive(Debug, Default)]
pub struct UpdateEffect {
    inner: Effect,
    mounted: AtomicBool,
    /// Held across the gate transition and the mount flag together.
    commit: Mutex<()>,
}

impl UpdateEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> EffectId {
        self.inner.id()
    }

    /// Returns `true` if the body ran.
    pub fn evaluate<F, T>(&self, deps: &[Dep], body: F) -> bool
    where
        F: FnOnce() -> T,
        T: IntoTeardown,
    {
        let _commit = self.commit.lock();
        let mut ran = false;
        self.inner.evaluate(deps, || {
            if self.mounted.swap(true, Ordering::SeqCst) {
                ran = true;
                body().into_teardown()
            } else {
                None
            }
        });
        ran
    }

    pub fn unmount(&self) {
        let _commit = self.commit.lock();
        self.inner.unmount();
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Whether the mount evaluation has happened.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}
