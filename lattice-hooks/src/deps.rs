//! Dependency Lists
//!
//! Every gated hook receives a fresh dependency list on each evaluation and
//! keeps only the most recently accepted one. Deciding whether an effect must
//! be re-run comes down to comparing those two lists.
//!
//! # Comparison Rules
//!
//! The comparison is positional and *shallow*:
//!
//! - Lists of different length are never equal.
//! - Scalars compare by value.
//! - Floats compare by identity: two NaNs are the same key, while `0.0` and
//!   `-0.0` are different keys.
//! - Strings compare by value.
//! - References compare by pointer. Two `Arc`s holding equal data are still
//!   different keys unless they point to the same allocation.
//!
//! Nested structures are never inspected. Wrap a value in [`Dep::reference`]
//! if its identity is what should drive the effect, or project the relevant
//! scalar out of it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use smallvec::SmallVec;

/// An ordered list of comparison keys.
pub type DependencyList = SmallVec<[Dep; 4]>;

/// A single opaque comparison key.
#[derive(Clone)]
pub enum Dep {
    /// The absent value. `None` converts to this.
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Arc<str>),
    /// An object compared by pointer identity only.
    Ref(Arc<dyn Any + Send + Sync>),
}

impl Dep {
    /// Use the identity of a shared allocation as a key.
    pub fn reference<T: Any + Send + Sync>(value: &Arc<T>) -> Self {
        Dep::Ref(Arc::clone(value) as Arc<dyn Any + Send + Sync>)
    }

    /// Identity-or-NaN-safe equality for a single slot.
    pub fn is_same(&self, other: &Dep) -> bool {
        match (self, other) {
            (Dep::Unit, Dep::Unit) => true,
            (Dep::Bool(a), Dep::Bool(b)) => a == b,
            (Dep::Int(a), Dep::Int(b)) => a == b,
            (Dep::UInt(a), Dep::UInt(b)) => a == b,
            (Dep::Float(a), Dep::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Dep::Str(a), Dep::Str(b)) => a == b,
            (Dep::Ref(a), Dep::Ref(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dep::Unit => f.write_str("Unit"),
            Dep::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Dep::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Dep::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            Dep::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Dep::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Dep::Ref(v) => f
                .debug_tuple("Ref")
                .field(&(Arc::as_ptr(v) as *const ()))
                .finish(),
        }
    }
}

macro_rules! dep_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Dep {
                fn from(value: $source) -> Self {
                    Dep::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

dep_from!(Int as i64: i8, i16, i32, i64);
dep_from!(UInt as u64: u8, u16, u32, u64);
dep_from!(Float as f64: f32, f64);

impl From<()> for Dep {
    fn from(_: ()) -> Self {
        Dep::Unit
    }
}

impl From<bool> for Dep {
    fn from(value: bool) -> Self {
        Dep::Bool(value)
    }
}

impl From<usize> for Dep {
    fn from(value: usize) -> Self {
        Dep::UInt(value as u64)
    }
}

impl From<&str> for Dep {
    fn from(value: &str) -> Self {
        Dep::Str(Arc::from(value))
    }
}

impl From<String> for Dep {
    fn from(value: String) -> Self {
        Dep::Str(Arc::from(value))
    }
}

impl From<Arc<str>> for Dep {
    fn from(value: Arc<str>) -> Self {
        Dep::Str(value)
    }
}

impl From<Duration> for Dep {
    fn from(value: Duration) -> Self {
        Dep::UInt(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl<T: Into<Dep>> From<Option<T>> for Dep {
    fn from(value: Option<T>) -> Self {
        value.map_or(Dep::Unit, Into::into)
    }
}

/// Build a [`DependencyList`] from anything convertible into [`Dep`].
///
/// ```
/// use lattice_hooks::deps;
///
/// let list = deps![1, "query", true];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! deps {
    ($($value:expr),* $(,)?) => {{
        let list: $crate::DependencyList =
            [$($crate::Dep::from($value)),*].into_iter().collect();
        list
    }};
}

/// Ordered equality over two slices with a caller-supplied slot predicate.
///
/// This is the shape every comparison in the crate takes: lengths first,
/// then each position in order, stopping at the first mismatch.
pub fn same_by<T, F>(old: &[T], new: &[T], mut eq: F) -> bool
where
    F: FnMut(&T, &T) -> bool,
{
    old.len() == new.len() && old.iter().zip(new).all(|(a, b)| eq(a, b))
}

/// Returns true when two dependency lists should be treated as unchanged.
pub fn same(old: &[Dep], new: &[Dep]) -> bool {
    // Same slice instance: same address and same length.
    if std::ptr::eq(old, new) {
        return true;
    }
    same_by(old, new, Dep::is_same)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_instance_is_same() {
        let list = deps![1, "a", 2.5];
        assert!(same(&list, &list));
    }

    #[test]
    fn positional_difference_is_detected() {
        assert!(same(&deps![1, 2], &deps![1, 2]));
        assert!(!same(&deps![1, 2], &deps![1, 3]));
        assert!(!same(&deps![1, 2], &deps![2, 1]));
    }

    #[test]
    fn nan_equals_nan() {
        assert!(same(&deps![f64::NAN], &deps![f64::NAN]));
    }

    #[test]
    fn signed_zeros_differ() {
        assert!(!same(&deps![0.0], &deps![-0.0]));
    }

    #[test]
    fn different_lengths_never_equal() {
        assert!(!same(&deps![1], &deps![1, 2]));
        assert!(!same(&deps![1, 2], &deps![1]));
        assert!(!same(&deps![], &deps![()]));
        assert!(same(&deps![], &deps![]));
    }

    #[test]
    fn references_compare_by_pointer() {
        let a = Arc::new(vec![1, 2, 3]);
        let b = Arc::new(vec![1, 2, 3]);

        assert!(same(&[Dep::reference(&a)], &[Dep::reference(&a)]));
        // Equal contents, different allocations
        assert!(!same(&[Dep::reference(&a)], &[Dep::reference(&b)]));
    }

    #[test]
    fn variants_never_cross_compare() {
        assert!(!Dep::from(1i32).is_same(&Dep::from(1u32)));
        assert!(!Dep::from(1i32).is_same(&Dep::from(1.0)));
        assert!(!Dep::Unit.is_same(&Dep::from(false)));
    }

    #[test]
    fn option_maps_none_to_unit() {
        assert!(Dep::from(None::<u32>).is_same(&Dep::Unit));
        assert!(Dep::from(Some(3u32)).is_same(&Dep::from(3u32)));
    }

    #[test]
    fn strings_compare_by_value() {
        let owned = String::from("query");
        assert!(same(&deps![owned], &deps!["query"]));
    }

    #[test]
    fn same_by_uses_predicate() {
        let loose = |a: &i32, b: &i32| (a - b).abs() <= 1;
        assert!(same_by(&[1, 5], &[2, 4], loose));
        assert!(!same_by(&[1, 5], &[3, 5], loose));
    }
}
