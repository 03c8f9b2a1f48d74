//! Mount and unmount callbacks.

use std::sync::Arc;

use super::gate::Effect;
use super::teardown::Teardown;
use crate::cell::Latest;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Runs a callback once, on the first evaluation after mount.
#[derive(Debug, Default)]
pub struct Mount {
    gate: Effect,
}

impl Mount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this evaluation was the mount.
    pub fn evaluate<F: FnOnce()>(&self, f: F) -> bool {
        self.gate.evaluate(&[], f)
    }

    /// Forget the mount so that a revived instance runs the callback again.
    pub fn unmount(&self) {
        self.gate.unmount();
    }
}

/// Runs the most recently supplied callback when the instance unmounts.
pub struct Unmount {
    gate: Effect,
    latest: Latest<Option<Callback>>,
}

impl Unmount {
    pub fn new() -> Self {
        Self {
            gate: Effect::new(),
            latest: Latest::new(None),
        }
    }

    /// Supply this evaluation's callback.
    pub fn evaluate<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.latest.set(Some(Arc::new(f)));
        self.gate.evaluate(&[], || {
            let latest = self.latest.clone();
            Teardown::new(move || {
                if let Some(f) = latest.get() {
                    f();
                }
            })
        });
    }

    pub fn unmount(&self) {
        self.gate.unmount();
    }
}

impl std::fmt::Debug for Unmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unmount")
            .field("gate", &self.gate)
            .field("has_callback", &self.latest.with(Option::is_some))
            .finish()
    }
}

impl Default for Unmount {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn mount_runs_once() {
        let count = AtomicI32::new(0);
        let mount = Mount::new();

        assert!(mount.evaluate(|| {
            count.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!mount.evaluate(|| {
            count.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unmount_uses_latest_callback() {
        let seen = Arc::new(AtomicI32::new(0));
        let unmount = Unmount::new();

        for value in 1..=3 {
            let seen = seen.clone();
            unmount.evaluate(move || seen.store(value, Ordering::SeqCst));
        }
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        unmount.unmount();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
