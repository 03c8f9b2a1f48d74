//! Timer configuration.
//!
//! Options deserialize from the same shape the host passes around, with
//! durations in milliseconds:
//!
//! ```json
//! { "wait": 300, "leading": false, "trailing": true, "maxWait": 1000 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

/// Configuration for [`Debouncer`](super::Debouncer) and everything built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebounceOptions {
    /// Quiet period after the last call before the trailing edge fires.
    #[serde(with = "millis")]
    pub wait: Duration,

    /// Fire on the first call of a burst.
    pub leading: bool,

    /// Fire once the burst has been quiet for `wait`.
    pub trailing: bool,

    /// Upper bound on how long a burst may delay a firing.
    #[serde(with = "opt_millis")]
    pub max_wait: Option<Duration>,
}

impl DebounceOptions {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            ..Self::default()
        }
    }

    pub fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    pub fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// `max_wait` never undercuts `wait`.
    pub(crate) fn effective_max_wait(&self) -> Option<Duration> {
        self.max_wait.map(|max| max.max(self.wait))
    }
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            wait: DEFAULT_WAIT,
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

/// Configuration for [`Interval`](super::Interval).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalOptions {
    /// Also run the callback as soon as the interval starts.
    pub immediate: bool,
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
