//! Debounced value.

use std::fmt;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::debounce::Debouncer;
use super::options::DebounceOptions;
use crate::cell::Latest;
use crate::error::{runtime_handle, Result};

/// A value that follows its input once the input has been quiet for `wait`.
///
/// ```text
///   input:     a   b  c           d
///   debounced: a ─────────────c──────────d
/// ```
pub struct DebouncedValue<T> {
    output: Latest<T>,
    last_input: Mutex<Option<T>>,
    trigger: Debouncer,
}

impl<T> DebouncedValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, options: DebounceOptions) -> Result<Self> {
        Ok(Self::with_handle(initial, options, runtime_handle("DebouncedValue")?))
    }

    pub fn with_handle(initial: T, options: DebounceOptions, handle: Handle) -> Self {
        let output = Latest::new(initial.clone());
        let settle = {
            let output = output.clone();
            let initial = initial.clone();
            move || output.set(initial.clone())
        };

        Self {
            output,
            last_input: Mutex::new(None),
            trigger: Debouncer::with_handle(settle, options, handle),
        }
    }

    /// Offer this evaluation's input and get the debounced value back.
    pub fn evaluate(&self, value: T) -> T {
        let changed = {
            let mut last = self.last_input.lock();
            if last.as_ref() == Some(&value) {
                false
            } else {
                *last = Some(value.clone());
                true
            }
        };

        if changed {
            let output = self.output.clone();
            self.trigger.update(move || output.set(value.clone()));
            self.trigger.run();
        }

        self.output.get()
    }

    /// The current debounced value.
    pub fn get(&self) -> T {
        self.output.get()
    }

    /// Stop any pending update. The current value is kept.
    pub fn unmount(&self) {
        self.trigger.cancel();
    }
}

impl<T: fmt::Debug> fmt::Debug for DebouncedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedValue")
            .field("output", &self.output)
            .field("pending", &self.trigger.is_pending())
            .finish()
    }
}
