//! Async function lock.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

/// Wraps an async function so that only one call runs at a time.
///
/// A call made while another is in flight is dropped and returns `None`,
/// which is what a double-clicked submit button wants: the second click is
/// ignored rather than queued. The lock is released when the running call
/// finishes, panics, or its future is dropped.
pub struct LockFn<F> {
    f: F,
    locked: AtomicBool,
}

/// Releases the lock on drop.
struct Release<'a>(&'a AtomicBool);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<F> LockFn<F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            locked: AtomicBool::new(false),
        }
    }

    /// Run the function unless a previous call is still in flight.
    pub async fn call<A, Fut>(&self, arg: A) -> Option<Fut::Output>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        if self
            .locked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("locked function busy, dropping call");
            return None;
        }

        let _release = Release(&self.locked);
        Some((self.f)(arg).await)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

impl<F> fmt::Debug for LockFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFn")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_are_dropped() {
        let submits = Arc::new(AtomicI32::new(0));
        let submit = {
            let submits = submits.clone();
            move |value: i32| {
                let submits = submits.clone();
                async move {
                    sleep(Duration::from_millis(100)).await;
                    submits.fetch_add(1, Ordering::SeqCst);
                    value * 2
                }
            }
        };
        let lock = LockFn::new(submit);

        let (first, second) = tokio::join!(lock.call(1), async {
            sleep(Duration::from_millis(10)).await;
            lock.call(2).await
        });

        assert_eq!(first, Some(2));
        assert_eq!(second, None);
        assert_eq!(submits.load(Ordering::SeqCst), 1);
        assert!(!lock.is_locked());

        // Free again once the first call finished
        assert_eq!(lock.call(5).await, Some(10));
    }

    #[tokio::test]
    async fn dropped_future_releases_lock() {
        let lock = LockFn::new(|_: ()| std::future::pending::<()>());

        let mut call = Box::pin(lock.call(()));
        // Poll once so the lock is taken
        assert!(futures_util::poll!(call.as_mut()).is_pending());
        assert!(lock.is_locked());

        drop(call);
        assert!(!lock.is_locked());
    }
}
