//! Dependency-Gated Effect
//!
//! [`Effect`] is the post-commit primitive every other gate in the crate is
//! built on: "after this commit, compare these deps, and if they changed run
//! the cleanup of the last run followed by this body".
//!
//! # How Evaluation Works
//!
//! 1. The first evaluation (or the first after unmount) always runs the body.
//!
//! 2. Later evaluations compare the new deps against the last accepted deps.
//!    Unchanged deps leave the running session untouched.
//!
//! 3. Changed deps run the stored teardown, record the new deps, run the
//!    body, and keep whatever teardown it returns.
//!
//! # Locking
//!
//! Evaluations of one gate are serialized by a commit lock, so a debounced
//! firing on a runtime thread and a host commit never interleave their
//! teardown/run pairs. The state lock is never held while user code runs.
//! A body or teardown that re-enters its own gate deadlocks.

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::teardown::{IntoTeardown, Teardown};
use super::{EffectId, Phase};
use crate::deps::{self, Dep, DependencyList};

/// A side effect re-run whenever its dependency list changes.
///
/// # Example
///
/// ```
/// use lattice_hooks::{deps, Effect, Teardown};
///
/// let effect = Effect::new();
///
/// // Runs: first evaluation
/// effect.evaluate(&deps![1], || Teardown::new(|| println!("cleanup 1")));
/// // Skipped: deps unchanged
/// effect.evaluate(&deps![1], || Teardown::new(|| println!("cleanup 1b")));
/// // Prints "cleanup 1", then runs again
/// effect.evaluate(&deps![2], || Teardown::new(|| println!("cleanup 2")));
///
/// effect.unmount(); // prints "cleanup 2"
/// ```
pub struct Effect {
    id: EffectId,
    state: Mutex<EffectState>,
    commit: Mutex<()>,
}

struct EffectState {
    phase: Phase,
    /// `None` for gates evaluated without deps, which run every commit.
    deps: Option<DependencyList>,
    teardown: Option<Teardown>,
    run_count: usize,
}

impl Effect {
    pub fn new() -> Self {
        Self {
            id: EffectId::new(),
            state: Mutex::new(EffectState {
                phase: Phase::Uninitialized,
                deps: None,
                teardown: None,
                run_count: 0,
            }),
            commit: Mutex::new(()),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Evaluate the gate for one commit.
    ///
    /// Returns `true` if the body ran.
    pub fn evaluate<F, T>(&self, deps: &[Dep], body: F) -> bool
    where
        F: FnOnce() -> T,
        T: IntoTeardown,
    {
        self.commit(Some(deps), body)
    }

    /// Evaluate a gate that has no dependency list: the body runs on every
    /// commit, after the previous run's teardown.
    pub fn evaluate_always<F, T>(&self, body: F) -> bool
    where
        F: FnOnce() -> T,
        T: IntoTeardown,
    {
        self.commit(None, body)
    }

    fn commit<F, T>(&self, deps: Option<&[Dep]>, body: F) -> bool
    where
        F: FnOnce() -> T,
        T: IntoTeardown,
    {
        let _commit = self.commit.lock();

        let previous = {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Active => {
                    let unchanged = match (&state.deps, deps) {
                        (Some(last), Some(next)) => deps::same(last, next),
                        _ => false,
                    };
                    if unchanged {
                        trace!(effect = %self.id, "deps unchanged, keeping session");
                        return false;
                    }
                }
                Phase::TornDown => debug!(effect = %self.id, "effect revived after unmount"),
                Phase::Uninitialized => {}
            }

            state.phase = Phase::Active;
            state.deps = deps.map(|d| d.iter().cloned().collect());
            state.teardown.take()
        };

        if let Some(teardown) = previous {
            debug!(effect = %self.id, "tearing down previous session");
            teardown.run();
        }

        debug!(effect = %self.id, "running effect body");
        let teardown = body().into_teardown();

        let mut state = self.state.lock();
        state.teardown = teardown;
        state.run_count += 1;
        true
    }

    /// Run the last teardown and mark the gate torn down.
    pub fn unmount(&self) {
        let _commit = self.commit.lock();

        let teardown = {
            let mut state = self.state.lock();
            state.phase = Phase::TornDown;
            state.deps = None;
            state.teardown.take()
        };

        if let Some(teardown) = teardown {
            debug!(effect = %self.id, "unmount teardown");
            teardown.run();
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Check if the effect has been unmounted.
    pub fn is_torn_down(&self) -> bool {
        self.phase() == Phase::TornDown
    }

    /// Get the number of times the body has run.
    pub fn run_count(&self) -> usize {
        self.state.lock().run_count
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("phase", &state.phase)
            .field("deps", &state.deps)
            .field("run_count", &state.run_count)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    /// Records runs and teardowns in order.
    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn logged(log: &Arc<Mutex<Vec<String>>>, name: &str) -> Teardown {
        log.lock().push(format!("run {name}"));
        let log = log.clone();
        let name = name.to_string();
        Teardown::new(move || log.lock().push(format!("teardown {name}")))
    }

    #[test]
    fn effect_runs_on_first_evaluation() {
        let run_count = Arc::new(AtomicI32::new(0));
        let effect = Effect::new();

        assert_eq!(effect.phase(), Phase::Uninitialized);
        assert!(effect.evaluate(&deps![1], || {
            run_count.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(effect.phase(), Phase::Active);
    }

    #[test]
    fn effect_reruns_only_on_change() {
        let log = journal();
        let effect = Effect::new();

        effect.evaluate(&deps![1], || logged(&log, "a"));
        assert!(!effect.evaluate(&deps![1], || logged(&log, "b")));
        effect.evaluate(&deps![2], || logged(&log, "c"));

        // Body invoked exactly twice, teardown strictly before the second run
        assert_eq!(*log.lock(), vec!["run a", "teardown a", "run c"]);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn unmount_runs_last_teardown() {
        let log = journal();
        let effect = Effect::new();

        effect.evaluate(&deps![0], || logged(&log, "only"));
        effect.unmount();

        assert_eq!(*log.lock(), vec!["run only", "teardown only"]);
        assert!(effect.is_torn_down());

        // A second unmount has nothing left to run
        effect.unmount();
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn revived_effect_behaves_as_new() {
        let log = journal();
        let effect = Effect::new();

        effect.evaluate(&deps![1], || logged(&log, "a"));
        effect.unmount();

        // Same deps as before unmount, still runs
        assert!(effect.evaluate(&deps![1], || logged(&log, "b")));
        assert_eq!(*log.lock(), vec!["run a", "teardown a", "run b"]);
        assert_eq!(effect.phase(), Phase::Active);
    }

    #[test]
    fn evaluate_always_runs_every_commit() {
        let log = journal();
        let effect = Effect::new();

        effect.evaluate_always(|| logged(&log, "1"));
        effect.evaluate_always(|| logged(&log, "2"));

        assert_eq!(*log.lock(), vec!["run 1", "teardown 1", "run 2"]);
    }

    #[test]
    fn empty_deps_run_once() {
        let run_count = Arc::new(AtomicI32::new(0));
        let effect = Effect::new();

        for _ in 0..3 {
            effect.evaluate(&[], || {
                run_count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_body_keeps_previous_teardown_order() {
        let log = journal();
        let effect = Arc::new(Effect::new());

        effect.evaluate(&deps![1], || logged(&log, "a"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            effect.evaluate(&deps![2], || -> Teardown { panic!("body failed") });
        }));
        assert!(result.is_err());

        // Cleanup of the previous session ran before the panic
        assert_eq!(*log.lock(), vec!["run a", "teardown a"]);

        // Bookkeeping still consistent: same deps is a no-op, new deps runs
        assert!(!effect.evaluate(&deps![2], || logged(&log, "skipped")));
        assert!(effect.evaluate(&deps![3], || logged(&log, "b")));
        assert_eq!(log.lock().last().map(String::as_str), Some("run b"));
    }
}
