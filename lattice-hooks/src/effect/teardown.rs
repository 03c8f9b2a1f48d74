//! Teardown actions returned by effect bodies.

use std::fmt;

/// Cleanup returned by an effect body.
///
/// The gate that receives it owns it exclusively and runs it exactly once:
/// before the next run of the same effect, or at unmount.
pub struct Teardown(Box<dyn FnOnce() + Send>);

impl Teardown {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Consume and run the cleanup.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Teardown")
    }
}

/// What an effect body may return.
///
/// `()` means "nothing to clean up".
pub trait IntoTeardown {
    fn into_teardown(self) -> Option<Teardown>;
}

impl IntoTeardown for () {
    fn into_teardown(self) -> Option<Teardown> {
        None
    }
}

impl IntoTeardown for Teardown {
    fn into_teardown(self) -> Option<Teardown> {
        Some(self)
    }
}

impl IntoTeardown for Option<Teardown> {
    fn into_teardown(self) -> Option<Teardown> {
        self
    }
}
