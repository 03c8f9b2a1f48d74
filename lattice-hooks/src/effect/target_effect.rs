//! Target-Aware Effect Gate
//!
//! [`TargetEffect`] extends the dependency gate with target identity. On
//! every evaluation the targets are resolved again, and the session is
//! replaced when *either* the resolved nodes *or* the declared deps changed.
//! Replacement is always a full teardown followed by a fresh run; there is
//! no partial update of a running session.
//!
//! # Targets That Are Not Ready
//!
//! The body only ever sees fully resolved nodes. An evaluation in which some
//! target resolves to `None` is still recorded, so the moment the target
//! appears counts as a change, but no body is started for it. If a running
//! session's target disappears, that session is torn down and the gate waits.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::target::{same_nodes, Resolved, Targets};
use super::teardown::{IntoTeardown, Teardown};
use super::{EffectId, Phase};
use crate::deps::{self, Dep, DependencyList};

/// An effect gated on deps and on the identity of resolved targets.
pub struct TargetEffect<N> {
    id: EffectId,
    state: Mutex<TargetState<N>>,
    commit: Mutex<()>,
}

struct TargetState<N> {
    phase: Phase,
    deps: DependencyList,
    nodes: Resolved<N>,
    teardown: Option<Teardown>,
    run_count: usize,
}

impl<N> TargetEffect<N> {
    pub fn new() -> Self {
        Self {
            id: EffectId::new(),
            state: Mutex::new(TargetState {
                phase: Phase::Uninitialized,
                deps: DependencyList::new(),
                nodes: Resolved::new(),
                teardown: None,
                run_count: 0,
            }),
            commit: Mutex::new(()),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Evaluate the gate for one commit.
    ///
    /// Returns `true` if the body ran.
    pub fn evaluate<F, T>(&self, deps: &[Dep], targets: &Targets<N>, body: F) -> bool
    where
        F: FnOnce(&[Arc<N>]) -> T,
        T: IntoTeardown,
    {
        let _commit = self.commit.lock();
        let nodes = targets.resolve_all();

        let previous = {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Active => {
                    let targets_changed = nodes.len() != state.nodes.len()
                        || !same_nodes(&state.nodes, &nodes);
                    if !targets_changed && deps::same(&state.deps, deps) {
                        trace!(effect = %self.id, "targets and deps unchanged");
                        return false;
                    }
                }
                Phase::TornDown => debug!(effect = %self.id, "target effect revived after unmount"),
                Phase::Uninitialized => {}
            }

            state.phase = Phase::Active;
            state.deps = deps.iter().cloned().collect();
            state.nodes = nodes.clone();
            state.teardown.take()
        };

        if let Some(teardown) = previous {
            debug!(effect = %self.id, "tearing down previous target session");
            teardown.run();
        }

        let ready: Option<Vec<Arc<N>>> = nodes.into_iter().collect();
        let Some(ready) = ready else {
            debug!(effect = %self.id, "targets not ready, deferring start");
            return false;
        };

        debug!(effect = %self.id, targets = ready.len(), "running target effect body");
        let teardown = body(&ready).into_teardown();

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
            state.deps.clear();
            state.nodes.clear();
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

    /// Get the number of times the body has run.
    pub fn run_count(&self) -> usize {
        self.state.lock().run_count
    }

    /// Whether a started session is currently holding a teardown.
    pub fn has_session(&self) -> bool {
        self.state.lock().teardown.is_some()
    }
}

impl<N> Default for TargetEffect<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for TargetEffect<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TargetEffect")
            .field("id", &self.id)
            .field("phase", &state.phase)
            .field("deps", &state.deps)
            .field("targets", &state.nodes.len())
            .field("run_count", &state.run_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use crate::effect::{NodeRef, TargetHandle};
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Debug)]
    struct Element(u32);

    fn counting(counter: &Arc<AtomicI32>) -> impl FnOnce(&[Arc<Element>]) -> Teardown {
        let counter = counter.clone();
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Teardown::new(|| {})
        }
    }

    #[test]
    fn reruns_when_target_identity_changes() {
        let runs = Arc::new(AtomicI32::new(0));
        let effect = TargetEffect::new();
        let node_ref = NodeRef::new();
        let targets = Targets::from(&node_ref);

        node_ref.set(Arc::new(Element(1)));
        assert!(effect.evaluate(&deps![1], &targets, counting(&runs)));
        assert!(!effect.evaluate(&deps![1], &targets, counting(&runs)));

        // Remounted node: same deps, new object
        node_ref.set(Arc::new(Element(1)));
        assert!(effect.evaluate(&deps![1], &targets, counting(&runs)));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reruns_when_deps_change() {
        let runs = Arc::new(AtomicI32::new(0));
        let effect = TargetEffect::new();
        let targets = Targets::from(Arc::new(Element(7)));

        effect.evaluate(&deps![1], &targets, counting(&runs));
        effect.evaluate(&deps![1], &targets, counting(&runs));
        effect.evaluate(&deps![2], &targets, counting(&runs));

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn target_count_change_forces_rerun() {
        let runs = Arc::new(AtomicI32::new(0));
        let effect = TargetEffect::new();
        let a = Arc::new(Element(1));

        let one: Targets<Element> = vec![TargetHandle::from(a.clone())].into();
        let b = Arc::new(Element(2));
        let two: Targets<Element> = [a.clone(), b]
            .into_iter()
            .map(TargetHandle::from)
            .collect();

        effect.evaluate(&deps![], &one, counting(&runs));
        effect.evaluate(&deps![], &two, counting(&runs));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn body_receives_resolved_nodes() {
        let effect = TargetEffect::new();
        let targets: Targets<Element> = [Arc::new(Element(3)), Arc::new(Element(4))]
            .into_iter()
            .map(TargetHandle::from)
            .collect();

        let mut seen = Vec::new();
        effect.evaluate(&deps![], &targets, |nodes| {
            seen.extend(nodes.iter().map(|n| n.0));
        });
        assert_eq!(seen, vec![3, 4]);
    }

    #[test]
    fn waits_for_unresolved_target() {
        let runs = Arc::new(AtomicI32::new(0));
        let effect = TargetEffect::new();
        let node_ref = NodeRef::new();
        let targets = Targets::from(&node_ref);

        // Not mounted yet
        assert!(!effect.evaluate(&deps![], &targets, counting(&runs)));
        assert!(!effect.evaluate(&deps![], &targets, counting(&runs)));
        assert_eq!(effect.phase(), Phase::Active);

        node_ref.set(Arc::new(Element(1)));
        assert!(effect.evaluate(&deps![], &targets, counting(&runs)));
        assert!(effect.has_session());

        // Node goes away: old session is torn down and nothing restarts
        node_ref.clear();
        assert!(!effect.evaluate(&deps![], &targets, counting(&runs)));
        assert!(!effect.has_session());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unmount_then_revive() {
        let torn_down = Arc::new(AtomicI32::new(0));
        let effect = TargetEffect::new();
        let targets = Targets::from(Arc::new(Element(1)));

        let body = |_: &[Arc<Element>]| {
            let torn_down = torn_down.clone();
            Teardown::new(move || {
                torn_down.fetch_add(1, Ordering::SeqCst);
            })
        };

        effect.evaluate(&deps![1], &targets, body);
        effect.unmount();
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
        assert_eq!(effect.phase(), Phase::TornDown);

        assert!(effect.evaluate(&deps![1], &targets, body));
        assert_eq!(effect.phase(), Phase::Active);
    }
}
