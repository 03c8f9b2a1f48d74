//! Timeout and interval hooks.
//!
//! Both are effects keyed on their delay: changing the delay clears the old
//! timer and starts a new one, a `None` delay disables the timer, and the
//! callback is read through a [`MemoizedFn`] so the timer never has to be
//! restarted just because the closure changed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{trace, warn};

use super::options::IntervalOptions;
use crate::cell::MemoizedFn;
use crate::deps::Dep;
use crate::effect::{Effect, Teardown};
use crate::error::{runtime_handle, Result};

/// The smallest period an interval will tick at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

type Slot = Arc<Mutex<Option<JoinHandle<()>>>>;

fn clear_slot(slot: &Slot) {
    if let Some(task) = slot.lock().take() {
        task.abort();
    }
}

/// Shared plumbing for both timers.
struct TimerCore {
    gate: Effect,
    callback: MemoizedFn<()>,
    slot: Slot,
    handle: Handle,
}

impl TimerCore {
    fn new(handle: Handle) -> Self {
        Self {
            gate: Effect::new(),
            callback: MemoizedFn::new(|()| {}),
            slot: Arc::default(),
            handle,
        }
    }

    /// Spawn `task`, replacing any previous one, and return its teardown.
    fn start<Fut>(&self, task: Fut) -> Teardown
    where
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let spawned = self.handle.spawn(task);
        if let Some(previous) = self.slot.lock().replace(spawned) {
            previous.abort();
        }
        let slot = Arc::clone(&self.slot);
        Teardown::new(move || clear_slot(&slot))
    }
}

/// Runs the latest callback once, `delay` after the delay was last set.
pub struct Timeout {
    core: TimerCore,
}

impl Timeout {
    pub fn new() -> Result<Self> {
        Ok(Self::with_handle(runtime_handle("Timeout")?))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            core: TimerCore::new(handle),
        }
    }

    /// Evaluate for one commit. `None` disables the timer.
    pub fn evaluate<F>(&self, delay: Option<Duration>, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let core = &self.core;
        core.callback.update(move |()| f());

        core.gate.evaluate(&[Dep::from(delay)], || {
            let delay = delay?;
            let callback = core.callback.clone();
            trace!(?delay, "timeout scheduled");
            Some(core.start(async move {
                time::sleep(delay).await;
                callback.call(());
            }))
        });
    }

    /// Stop the timer before it fires.
    pub fn clear(&self) {
        clear_slot(&self.core.slot);
    }

    pub fn unmount(&self) {
        self.core.gate.unmount();
    }
}

/// Runs the latest callback every `delay`.
pub struct Interval {
    core: TimerCore,
    options: IntervalOptions,
}

impl Interval {
    pub fn new(options: IntervalOptions) -> Result<Self> {
        Ok(Self::with_handle(options, runtime_handle("Interval")?))
    }

    pub fn with_handle(options: IntervalOptions, handle: Handle) -> Self {
        Self {
            core: TimerCore::new(handle),
            options,
        }
    }

    /// Evaluate for one commit. `None` disables the interval.
    pub fn evaluate<F>(&self, delay: Option<Duration>, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let core = &self.core;
        let immediate = self.options.immediate;
        core.callback.update(move |()| f());

        core.gate.evaluate(&[Dep::from(delay), Dep::from(immediate)], || {
            let mut period = delay?;
            if period < MIN_PERIOD {
                if cfg!(debug_assertions) {
                    warn!(?period, "interval period too small, clamping");
                }
                period = MIN_PERIOD;
            }

            if immediate {
                core.callback.call(());
            }

            let callback = core.callback.clone();
            Some(core.start(async move {
                let mut ticks = time::interval_at(Instant::now() + period, period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticks.tick().await;
                    callback.call(());
                }
            }))
        });
    }

    /// Stop the interval.
    pub fn clear(&self) {
        clear_slot(&self.core.slot);
    }

    pub fn unmount(&self) {
        self.core.gate.unmount();
    }
}

impl fmt::Debug for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeout")
            .field("gate", &self.core.gate)
            .field("running", &self.core.slot.lock().is_some())
            .finish()
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interval")
            .field("gate", &self.core.gate)
            .field("options", &self.options)
            .field("running", &self.core.slot.lock().is_some())
            .finish()
    }
}
