//! Debounced Effect Bridge
//!
//! Debouncing an effect body directly would also debounce its cleanup: the
//! teardown of run N would be delayed along with the start of run N+1, and
//! could even be skipped. Instead only the *decision* to run is debounced.
//!
//! # How It Works
//!
//! ```text
//!   caller deps ──▶ watcher (update-only) ──▶ Debouncer::run()
//!                                                   │ after `wait`
//!                                                   ▼
//!                                         marker += 1
//!                                                   │
//!   latest body ──────────────▶ gate (update-only, deps = [marker])
//!                                  teardown N, then run N+1
//! ```
//!
//! 1. The watcher observes the caller's deps. Changes after mount call
//!    `run()` on the debouncer; the mount evaluation does not.
//! 2. When the debouncer fires it bumps the marker and evaluates the gate
//!    with the latest body. The marker always changes, so the gate always
//!    tears down the previous run before starting the next.
//! 3. Every host evaluation also evaluates the gate with the current marker.
//!    The first establishes the mount baseline; later ones are no-ops.
//!
//! Cleanup timing is deliberately *not* debounced: once the debounced
//! decision is made, teardown and run happen back to back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use super::debounce::Debouncer;
use super::options::DebounceOptions;
use crate::cell::Latest;
use crate::deps::Dep;
use crate::effect::{IntoTeardown, Teardown, UpdateEffect};
use crate::error::{runtime_handle, Result};

type Body = Arc<dyn Fn() -> Option<Teardown> + Send + Sync>;

/// An effect whose runs start at most once per quiet period.
pub struct DebouncedEffect {
    watcher: UpdateEffect,
    trigger: Debouncer,
    bridge: Arc<Bridge>,
}

/// The half of the effect shared with the debouncer's firing.
struct Bridge {
    marker: AtomicU64,
    gate: UpdateEffect,
    body: Latest<Option<Body>>,
}

impl Bridge {
    fn evaluate_gate(&self) -> bool {
        let marker = self.marker.load(Ordering::SeqCst);
        self.gate.evaluate(&[Dep::from(marker)], || {
            self.body.get().and_then(|body| body())
        })
    }

    fn fire(&self) {
        let marker = self.marker.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(effect = %self.gate.id(), marker, "debounced effect firing");
        self.evaluate_gate();
    }
}

impl DebouncedEffect {
    pub fn new(options: DebounceOptions) -> Result<Self> {
        Ok(Self::with_handle(options, runtime_handle("DebouncedEffect")?))
    }

    pub fn with_handle(options: DebounceOptions, handle: Handle) -> Self {
        let bridge = Arc::new(Bridge {
            marker: AtomicU64::new(0),
            gate: UpdateEffect::new(),
            body: Latest::new(None),
        });

        let firing = Arc::downgrade(&bridge);
        let trigger = Debouncer::with_handle(
            move || {
                if let Some(bridge) = firing.upgrade() {
                    bridge.fire();
                }
            },
            options,
            handle,
        );

        Self {
            watcher: UpdateEffect::new(),
            trigger,
            bridge,
        }
    }

    /// Evaluate for one commit.
    ///
    /// `body` replaces the logic any later firing will run, whether or not
    /// `deps` changed on this evaluation.
    pub fn evaluate<F, T>(&self, deps: &[Dep], body: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: IntoTeardown,
    {
        self.bridge
            .body
            .set(Some(Arc::new(move || body().into_teardown())));

        self.watcher.evaluate(deps, || self.trigger.run());
        self.bridge.evaluate_gate();
    }

    /// Start the owed run now.
    pub fn flush(&self) {
        self.trigger.flush();
    }

    /// Drop the owed run, if any. The current run keeps going.
    pub fn cancel(&self) {
        self.trigger.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.trigger.is_pending()
    }

    /// Cancel any pending run and tear down the current one.
    pub fn unmount(&self) {
        self.trigger.cancel();
        self.watcher.unmount();
        self.bridge.gate.unmount();
    }
}

impl fmt::Debug for DebouncedEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedEffect")
            .field("marker", &self.bridge.marker.load(Ordering::SeqCst))
            .field("trigger", &self.trigger)
            .finish()
    }
}
