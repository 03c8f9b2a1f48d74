//! Effect Gates
//!
//! An effect gate owns one logical side effect of a component instance. The
//! host calls `evaluate` once per commit, passing this commit's dependency
//! list and effect body, and `unmount` once at end of life. The gate decides
//! whether the previous run must be torn down and the body started again.
//!
//! # Lifecycle
//!
//! ```text
//!   Uninitialized ──first evaluate──▶ Active ──unmount──▶ TornDown
//!                                      │  ▲                   │
//!                      deps changed:   └──┘                   │
//!                      teardown, run                          │
//!   ◀────────────────────── evaluate again (revived) ─────────┘
//! ```
//!
//! A torn-down gate that is evaluated again (a hot-reloaded component, a
//! remount that reuses the instance) behaves exactly like a fresh one.
//!
//! # Ordering
//!
//! Teardown of run N always completes before run N+1 starts. The previous
//! teardown runs *before* the new body, so a body that panics never skips
//! the cleanup of its predecessor.
//!
//! # Gates
//!
//! - [`Effect`]: gated on a dependency list.
//! - [`UpdateEffect`]: like `Effect`, but skips the first evaluation.
//! - [`TargetEffect`]: gated on a dependency list *and* the identity of
//!   resolved target nodes.
//! - [`Mount`] / [`Unmount`]: run a callback at the start or end of life.

mod teardown;
mod gate;
mod update;
mod target;
mod target_effect;
mod lifecycle;

pub use teardown::{Teardown, IntoTeardown};
pub use gate::Effect;
pub use update::UpdateEffect;
pub use target::{NodeRef, Resolved, TargetHandle, Targets, same_nodes};
pub use target_effect::TargetEffect;
pub use lifecycle::{Mount, Unmount};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a hook instance, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Where a gate is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never evaluated, or revived after unmount.
    Uninitialized,

    /// Holds the session started by the last accepted evaluation.
    Active,

    /// Unmounted. The last teardown has run.
    TornDown,
}
