//! Time-Driven Hooks
//!
//! Everything in this module schedules work on a tokio runtime: the
//! runtime current at construction time, or an explicit [`Handle`] passed to
//! the `with_handle` constructors. Constructing one of these hooks outside a
//! runtime fails with [`HookError::NoRuntime`](crate::HookError::NoRuntime).
//!
//! - [`Debouncer`]: coalesce bursts of calls into one delayed invocation.
//! - [`DebouncedEffect`]: an effect whose runs start at most once per quiet
//!   period, with cleanup ordering left intact.
//! - [`DebouncedValue`]: a value that lags its input by a quiet period.
//! - [`Timeout`] / [`Interval`]: run the latest callback after / every delay.
//!
//! [`Handle`]: tokio::runtime::Handle

mod options;
mod debounce;
mod debounced_effect;
mod debounced_value;
mod timer;

pub use options::{DebounceOptions, IntervalOptions};
pub use debounce::Debouncer;
pub use debounced_effect::DebouncedEffect;
pub use debounced_value::DebouncedValue;
pub use timer::{Interval, Timeout};
