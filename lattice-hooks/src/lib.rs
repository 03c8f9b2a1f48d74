//! Lattice Hooks
//!
//! This crate provides effect scheduling and lifecycle hooks for the Lattice
//! reactive UI framework. It implements:
//!
//! - Dependency-gated effects with strict teardown-before-rerun ordering
//! - Target-aware effects that also re-run when a resolved node changes
//! - Debounced triggers, debounced effects and debounced values
//! - Async effects with cooperative, between-step cancellation
//! - Small lifecycle utilities (mount, unmount, timers, latest-value cells)
//!
//! # Host Model
//!
//! Every hook is a plain object owned by one component instance. The host
//! calls `evaluate(...)` on it once per commit, with that commit's deps and
//! closures, and `unmount()` once at end of life. Nothing here renders or
//! diffs; the hooks only decide *whether* and *when* side effects run.
//!
//! # Architecture
//!
//! - `deps`: dependency lists and the shallow comparator
//! - `cell`: instance-scoped cells (`Latest`, `MemoizedFn`, ...)
//! - `effect`: the effect gates and target resolution
//! - `timing`: debouncing and timers on a tokio runtime
//! - `task`: async effects and cooperative cancellation
//!
//! # Example
//!
//! ```rust
//! use lattice_hooks::{deps, Effect, Teardown};
//!
//! let effect = Effect::new();
//! let user_id = 7;
//!
//! // On every commit:
//! effect.evaluate(&deps![user_id], move || {
//!     println!("subscribe {user_id}");
//!     Teardown::new(move || println!("unsubscribe {user_id}"))
//! });
//!
//! // At end of life:
//! effect.unmount();
//! ```

pub mod deps;
pub mod cell;
pub mod effect;
pub mod timing;
pub mod task;
mod error;

pub use deps::{Dep, DependencyList};
pub use cell::{Creation, Latest, MemoizedFn, Previous};
pub use effect::{
    Effect, EffectId, IntoTeardown, Mount, NodeRef, Phase, TargetEffect, TargetHandle, Targets,
    Teardown, Unmount, UpdateEffect,
};
pub use timing::{
    DebounceOptions, DebouncedEffect, DebouncedValue, Debouncer, Interval, IntervalOptions, Timeout,
};
pub use task::{AsyncBody, AsyncEffect, CancelToken, LockFn};
pub use error::{HookError, Result};
