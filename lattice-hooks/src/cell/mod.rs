//! Instance Cells
//!
//! Hooks need state that survives from one evaluation to the next without
//! itself causing anything to re-run. The host frameworks call this a ref;
//! here it is [`Latest`], a shared cell owned by a single hook instance.
//!
//! The other types in this module are small utilities built on that idea:
//!
//! - [`MemoizedFn`]: a stable callable that always forwards to the most
//!   recently supplied function.
//! - [`Previous`]: remembers the value from before the last change.
//! - [`Creation`]: creates a value once and keeps it until its deps change.

mod latest;
mod memoized;
mod previous;
mod creation;

pub use latest::Latest;
pub use memoized::MemoizedFn;
pub use previous::Previous;
pub use creation::Creation;
