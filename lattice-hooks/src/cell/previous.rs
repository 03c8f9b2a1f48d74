//! Previous value tracking.

use std::fmt::Debug;

use parking_lot::Mutex;

type ShouldUpdate<T> = Box<dyn Fn(Option<&T>, &T) -> bool + Send + Sync>;

/// Remembers the value that was current before the last accepted change.
///
/// Every evaluation offers a value. When `should_update(current, offered)`
/// holds, the current value becomes the previous one and the offered value
/// becomes current. The default predicate accepts any value that differs
/// from the current one.
pub struct Previous<T> {
    slots: Mutex<Slots<T>>,
    should_update: ShouldUpdate<T>,
}

struct Slots<T> {
    previous: Option<T>,
    current: Option<T>,
}

impl<T> Previous<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new() -> Self {
        Self::with_should_update(|current, next| current != Some(next))
    }
}

impl<T> Previous<T>
where
    T: Clone + Send + 'static,
{
    /// Use a custom predicate to decide which values count as a change.
    pub fn with_should_update<F>(should_update: F) -> Self
    where
        F: Fn(Option<&T>, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            slots: Mutex::new(Slots {
                previous: None,
                current: None,
            }),
            should_update: Box::new(should_update),
        }
    }

    /// Offer this evaluation's value and get the previous one back.
    pub fn evaluate(&self, value: T) -> Option<T> {
        let mut slots = self.slots.lock();
        if (self.should_update)(slots.current.as_ref(), &value) {
            slots.previous = slots.current.replace(value);
        }
        slots.previous.clone()
    }
}

impl<T> Default for Previous<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for Previous<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("Previous")
            .field("previous", &slots.previous)
            .field("current", &slots.current)
            .finish()
    }
}
