//! Debounce Trigger
//!
//! A [`Debouncer`] coalesces a burst of `run()` calls into a single delayed
//! invocation of its action.
//!
//! # Timing
//!
//! Every `run()` restarts a relative timer of `wait`. With the default
//! options only the trailing edge fires: the action runs once the burst has
//! been quiet for `wait`. With `leading`, the first call of a burst fires
//! immediately and the trailing edge only fires if more calls arrived after
//! it. `max_wait` bounds how long a continuous burst can hold off a firing.
//!
//! ```text
//!   run  run  run            run
//!    │    │    │              │
//!    ▼    ▼    ▼              ▼
//!   ─┴────┴────┴──── wait ───▶X─┴──── wait ───▶X
//!                              fire              fire
//! ```
//!
//! # Latest Action
//!
//! The action is read from a [`Latest`] cell at firing time, not captured
//! when the timer was scheduled. A firing scheduled before the owner's last
//! [`update`](Debouncer::update) still runs the updated logic.
//!
//! # Pending State
//!
//! At most one timer is outstanding. Each timer carries a generation number;
//! a timer whose generation is no longer current does nothing even if it
//! wins a race against its own abort.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::options::DebounceOptions;
use crate::cell::Latest;
use crate::effect::EffectId;
use crate::error::{runtime_handle, Result};

type Action = Arc<dyn Fn() + Send + Sync>;

/// Trailing-edge debounce of a zero-argument action.
///
/// Dropping the debouncer cancels any pending firing.
pub struct Debouncer {
    inner: Arc<Inner>,
}

struct Inner {
    id: EffectId,
    options: DebounceOptions,
    action: Latest<Action>,
    state: Mutex<DebounceState>,
    handle: Handle,
}

#[derive(Default)]
struct DebounceState {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    /// A call arrived that the trailing edge still owes a firing for.
    owed: bool,
    burst_started: Option<Instant>,
}

impl DebounceState {
    /// Drop the pending timer, if any. Returns whether a firing was owed.
    fn clear(&mut self) -> bool {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.burst_started = None;
        std::mem::take(&mut self.owed)
    }
}

impl Debouncer {
    /// Create a debouncer scheduling on the current tokio runtime.
    pub fn new<F>(action: F, options: DebounceOptions) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Ok(Self::with_handle(action, options, runtime_handle("Debouncer")?))
    }

    /// Create a debouncer scheduling on an explicit runtime.
    pub fn with_handle<F>(action: F, options: DebounceOptions, handle: Handle) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        if cfg!(debug_assertions) && !options.leading && !options.trailing {
            warn!("debouncer has neither leading nor trailing edge and will never fire");
        }

        Self {
            inner: Arc::new(Inner {
                id: EffectId::new(),
                options,
                action: Latest::new(Arc::new(action)),
                state: Mutex::new(DebounceState::default()),
                handle,
            }),
        }
    }

    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    pub fn options(&self) -> &DebounceOptions {
        &self.inner.options
    }

    /// Replace the action with the logic of the current evaluation.
    pub fn update<F>(&self, action: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.action.set(Arc::new(action));
    }

    /// Register a call, restarting the quiet period.
    pub fn run(&self) {
        let options = &self.inner.options;

        let fire_now = {
            let mut state = self.inner.state.lock();
            let now = Instant::now();

            let idle = state.timer.is_none();
            if idle {
                state.burst_started = Some(now);
            }
            let fire_now = idle && options.leading;
            state.owed = !fire_now;

            let mut delay = options.wait;
            if let (Some(max), Some(started)) =
                (options.effective_max_wait(), state.burst_started)
            {
                delay = delay.min(max.saturating_sub(now - started));
            }

            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.generation += 1;
            let generation = state.generation;
            let inner = Arc::downgrade(&self.inner);
            state.timer = Some(self.inner.handle.spawn(async move {
                tokio::time::sleep(delay).await;
                expire(inner, generation);
            }));

            trace!(debouncer = %self.inner.id, ?delay, "debounce timer restarted");
            fire_now
        };

        if fire_now {
            debug!(debouncer = %self.inner.id, "leading edge firing");
            self.inner.invoke();
        }
    }

    /// Discard any pending firing without invoking it.
    pub fn cancel(&self) {
        if self.inner.state.lock().clear() {
            trace!(debouncer = %self.inner.id, "pending firing cancelled");
        }
    }

    /// Fire an owed call now instead of waiting for the timer.
    ///
    /// Like the timer, this only fires when the trailing edge is enabled.
    pub fn flush(&self) {
        let owed = self.inner.state.lock().clear();
        if owed && self.inner.options.trailing {
            debug!(debouncer = %self.inner.id, "flushing pending firing");
            self.inner.invoke();
        }
    }

    /// Whether a timer is currently scheduled.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }
}

impl Inner {
    fn invoke(&self) {
        let action = self.action.get();
        action();
    }
}

/// Timer body: fire the trailing edge if this timer is still current.
fn expire(inner: Weak<Inner>, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let fire = {
        let mut state = inner.state.lock();
        if state.generation != generation {
            return;
        }
        // Our own handle; dropping it just detaches.
        state.timer = None;
        state.burst_started = None;
        std::mem::take(&mut state.owed) && inner.options.trailing
    };

    if fire {
        debug!(debouncer = %inner.id, "trailing edge firing");
        inner.invoke();
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.inner.state.lock().clear();
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("id", &self.inner.id)
            .field("options", &self.inner.options)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    const WAIT: Duration = Duration::from_millis(100);

    fn recorder(log: &Arc<Mutex<Vec<i32>>>, value: i32) -> impl Fn() + Send + Sync + 'static {
        let log = log.clone();
        move || log.lock().push(value)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_with_latest_logic() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(recorder(&log, 0), DebounceOptions::new(WAIT)).unwrap();

        for i in 1..=5 {
            debouncer.update(recorder(&log, i));
            debouncer.run();
            sleep(WAIT / 2 - Duration::from_millis(10)).await;
        }
        assert!(log.lock().is_empty());
        assert!(debouncer.is_pending());

        sleep(WAIT).await;
        assert_eq!(*log.lock(), vec![5]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_fire_separately() {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let debouncer = Debouncer::new(
            move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            },
            DebounceOptions::new(WAIT),
        )
        .unwrap();

        debouncer.run();
        sleep(WAIT * 2).await;
        debouncer.run();
        sleep(WAIT * 2).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(recorder(&log, 1), DebounceOptions::new(WAIT)).unwrap();

        debouncer.run();
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        sleep(WAIT * 2).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_fires_immediately() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(recorder(&log, 1), DebounceOptions::new(WAIT)).unwrap();

        // Nothing pending: flush is a no-op
        debouncer.flush();
        assert!(log.lock().is_empty());

        debouncer.run();
        debouncer.flush();
        assert_eq!(*log.lock(), vec![1]);

        // The timer was cleared along with the owed call
        sleep(WAIT * 2).await;
        assert_eq!(*log.lock(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_without_trailing_edge_does_not_fire() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let options = DebounceOptions::new(WAIT).leading(true).trailing(false);
        let debouncer = Debouncer::new(recorder(&log, 1), options).unwrap();

        debouncer.run();
        debouncer.run();
        assert_eq!(*log.lock(), vec![1]);

        // The second call is owed, but only a trailing edge could pay it
        debouncer.flush();
        assert_eq!(*log.lock(), vec![1]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn leading_edge_fires_first_call() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let options = DebounceOptions::new(WAIT).leading(true);
        let debouncer = Debouncer::new(recorder(&log, 1), options).unwrap();

        debouncer.run();
        assert_eq!(*log.lock(), vec![1]);

        // A lone leading call owes no trailing firing
        sleep(WAIT * 2).await;
        assert_eq!(*log.lock(), vec![1]);

        debouncer.run();
        debouncer.update(recorder(&log, 2));
        debouncer.run();
        sleep(WAIT * 2).await;
        assert_eq!(*log.lock(), vec![1, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_bounds_continuous_bursts() {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let options = DebounceOptions::new(WAIT).max_wait(Duration::from_millis(250));
        let debouncer = Debouncer::new(
            move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            },
            options,
        )
        .unwrap();

        // Calls every 60ms for 300ms never go quiet for `wait`
        for _ in 0..5 {
            debouncer.run();
            sleep(Duration::from_millis(60)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(recorder(&log, 1), DebounceOptions::new(WAIT)).unwrap();

        debouncer.run();
        drop(debouncer);

        sleep(WAIT * 2).await;
        assert!(log.lock().is_empty());
    }

    #[test]
    fn new_requires_runtime() {
        let result = Debouncer::new(|| {}, DebounceOptions::default());
        assert!(result.is_err());
    }
}
