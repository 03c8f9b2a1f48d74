//! Async Hooks
//!
//! Hooks whose work is asynchronous. Cancellation here is always
//! cooperative: a [`CancelToken`] is set and checked at well-defined points,
//! and in-flight work is never aborted on the owner's behalf.
//!
//! - [`AsyncEffect`]: a dependency-gated effect with an async body.
//! - [`LockFn`]: an async function that ignores calls while one is running.

mod cancel;
mod async_effect;
mod lock;

pub use cancel::CancelToken;
pub use async_effect::{AsyncBody, AsyncEffect};
pub use lock::LockFn;
