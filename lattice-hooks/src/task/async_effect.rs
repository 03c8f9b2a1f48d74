//! Async Effect Runner
//!
//! An [`AsyncEffect`] is gated exactly like [`Effect`]: the body runs on the
//! first evaluation and whenever the deps change. The body returns async
//! work, which is spawned onto the runtime:
//!
//! - [`AsyncBody::Future`]: awaited to completion. There are no steps to
//!   stop between, so a superseded future simply runs to the end. It still
//!   receives the session's [`CancelToken`] and may check it itself.
//! - [`AsyncBody::Steps`]: a stream advanced one item at a time. After each
//!   step the runner stops if the stream ended or the token was cancelled.
//!
//! # Cancellation
//!
//! The teardown of a session only cancels its token and returns. Nothing is
//! aborted: a step that is already running completes, and a superseded
//! stream performs at most that one more step before the runner notices.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::cancel::CancelToken;
use crate::deps::Dep;
use crate::effect::{Effect, EffectId, Teardown};
use crate::error::{runtime_handle, Result};

/// The async work produced by one run of an async effect body.
pub enum AsyncBody {
    Future(BoxFuture<'static, ()>),
    Steps(BoxStream<'static, ()>),
}

impl AsyncBody {
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        AsyncBody::Future(future.boxed())
    }

    pub fn steps<S>(steps: S) -> Self
    where
        S: Stream<Item = ()> + Send + 'static,
    {
        AsyncBody::Steps(steps.boxed())
    }
}

impl fmt::Debug for AsyncBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncBody::Future(_) => f.write_str("AsyncBody::Future"),
            AsyncBody::Steps(_) => f.write_str("AsyncBody::Steps"),
        }
    }
}

/// Drive one session's work to completion or cancellation.
async fn drive(id: EffectId, work: AsyncBody, token: CancelToken) {
    match work {
        AsyncBody::Future(future) => future.await,
        AsyncBody::Steps(mut steps) => {
            let mut completed = 0usize;
            while steps.next().await.is_some() {
                completed += 1;
                if token.is_cancelled() {
                    debug!(effect = %id, completed, "async effect cancelled between steps");
                    return;
                }
                trace!(effect = %id, completed, "async effect step done");
            }
        }
    }
}

/// An effect whose body is asynchronous.
pub struct AsyncEffect {
    gate: Effect,
    handle: Handle,
    current: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AsyncEffect {
    pub fn new() -> Result<Self> {
        Ok(Self::with_handle(runtime_handle("AsyncEffect")?))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            gate: Effect::new(),
            handle,
            current: Arc::default(),
        }
    }

    pub fn id(&self) -> EffectId {
        self.gate.id()
    }

    /// Evaluate for one commit.
    ///
    /// Returns `true` if a new session was started. The previous session's
    /// token is cancelled first.
    pub fn evaluate<F>(&self, deps: &[Dep], body: F) -> bool
    where
        F: FnOnce(CancelToken) -> AsyncBody,
    {
        let id = self.gate.id();
        self.gate.evaluate(deps, || {
            let token = CancelToken::new();
            let work = body(token.clone());
            debug!(effect = %id, ?work, "starting async effect session");

            let task = self.handle.spawn(drive(id, work, token.clone()));
            *self.current.lock() = Some(task);

            Teardown::new(move || token.cancel())
        })
    }

    /// Cancel the current session's token.
    pub fn unmount(&self) {
        self.gate.unmount();
    }

    /// Wait for the most recently started session to finish.
    ///
    /// A panic inside the body surfaces here as [`HookError::Task`].
    ///
    /// [`HookError::Task`]: crate::HookError::Task
    pub async fn settled(&self) -> Result<()> {
        let task = self.current.lock().take();
        if let Some(task) = task {
            task.await?;
        }
        Ok(())
    }
}

impl fmt::Debug for AsyncEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncEffect")
            .field("gate", &self.gate)
            .field("in_flight", &self.current.lock().is_some())
            .finish()
    }
}
