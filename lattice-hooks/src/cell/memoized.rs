//! Memoized function.
//!
//! A [`MemoizedFn`] keeps one identity for the lifetime of a hook instance
//! while the function behind it is swapped on every evaluation. Handing it to
//! a long-lived consumer (a timer, a subscription) never captures stale
//! state, and the consumer never has to be re-registered just because the
//! closure changed.

use std::fmt::Debug;
use std::sync::Arc;

use super::Latest;

type Callback<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

/// A stable callable forwarding to the latest supplied function.
pub struct MemoizedFn<A, R = ()> {
    current: Latest<Callback<A, R>>,
}

impl<A: 'static, R: 'static> MemoizedFn<A, R> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            current: Latest::new(Arc::new(f)),
        }
    }

    /// Swap in the function of the current evaluation.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.current.set(Arc::new(f));
    }

    /// Call whatever function is current right now.
    pub fn call(&self, arg: A) -> R {
        // Clone out so the callee may update this cell.
        let f = self.current.get();
        f(arg)
    }
}

impl<A, R> Clone for MemoizedFn<A, R> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
        }
    }
}

impl<A, R> Debug for MemoizedFn<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memoized_fn_calls_latest() {
        let f = MemoizedFn::new(|x: i32| x + 1);
        assert_eq!(f.call(1), 2);

        f.update(|x: i32| x * 10);
        assert_eq!(f.call(1), 10);
    }

    #[test]
    fn clones_follow_updates() {
        let f = MemoizedFn::new(|_: ()| "old");
        let handed_out = f.clone();

        f.update(|_: ()| "new");
        assert_eq!(handed_out.call(()), "new");
    }
}
