//! Latest-value cell.
//!
//! Closures handed to timers and debouncers are created once but must run
//! the logic of the *current* evaluation. Instead of capturing the logic
//! directly they capture a [`Latest`] and read through it at call time.
//!
//! # Ownership
//!
//! A cell is written by the hook instance that created it, once per
//! evaluation, and read by the deferred work that instance scheduled.
//! Clones share the same slot. There is no global registry of cells.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

/// A shared slot holding the most recently written value.
pub struct Latest<T> {
    value: Arc<RwLock<T>>,
}

impl<T> Latest<T> {
    /// Create a cell with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Overwrite the stored value.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }

    /// Overwrite the stored value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.write(), value)
    }

    /// Borrow the stored value for the duration of `f`.
    ///
    /// `f` must not write to the same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }
}

impl<T: Clone> Latest<T> {
    /// Get a clone of the stored value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Default> Default for Latest<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: Debug> Debug for Latest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Latest")
            .field("value", &*self.value.read())
            .finish()
    }
}
