//! Error types for the hooks crate.
//!
//! Very little can fail here. Effect bodies are plain closures and their
//! panics are never caught, so the only errors are environmental: a
//! timer-driven hook needs a tokio runtime to schedule on, and an async
//! effect task can die with a panic that the owner may want to observe.

use thiserror::Error;
use tokio::runtime::Handle;

/// Errors reported by hook constructors and async effect observers.
#[derive(Debug, Error)]
pub enum HookError {
    /// A timer-driven hook was created outside of a tokio runtime.
    #[error("{0} requires a tokio runtime, but none is running on this thread")]
    NoRuntime(&'static str),

    /// The task driving an async effect body panicked or was aborted.
    #[error("async effect task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HookError>;

/// Grab the runtime handle for a hook that schedules work.
pub(crate) fn runtime_handle(owner: &'static str) -> Result<Handle> {
    Handle::try_current().map_err(|_| {
        if cfg!(debug_assertions) {
            tracing::warn!(owner, "hook constructed without a tokio runtime");
        }
        HookError::NoRuntime(owner)
    })
}
