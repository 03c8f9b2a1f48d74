//! Guaranteed memoization.
//!
//! A memo cache may throw values away and recompute them. [`Creation`] does
//! not: the factory runs on the first evaluation and again only when the
//! dependency list changes, so it is safe for values whose identity matters
//! (channels, subjects, connection handles).

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::deps::{self, Dep, DependencyList};

/// A value created once per distinct dependency list.
pub struct Creation<T> {
    slot: Mutex<Option<(DependencyList, Arc<T>)>>,
}

impl<T> Creation<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the existing value, or build a new one if `deps` changed.
    pub fn evaluate<F>(&self, deps: &[Dep], factory: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some((last, value)) if deps::same(last, deps) => Arc::clone(value),
            _ => {
                let value = Arc::new(factory());
                *slot = Some((deps.iter().cloned().collect(), Arc::clone(&value)));
                value
            }
        }
    }
}

impl<T> Default for Creation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for Creation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("Creation")
            .field("value", &slot.as_ref().map(|(_, value)| value))
            .finish()
    }
}
