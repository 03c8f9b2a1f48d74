//! Target Resolution
//!
//! Some effects attach to concrete objects owned by the host, typically
//! rendered nodes. The object behind a logical target can change without any
//! declared dependency changing: conditional rendering can drop a node and
//! mount a fresh one in its place. Targets are therefore re-resolved on every
//! evaluation and compared by identity.
//!
//! # Handles
//!
//! - [`TargetHandle::Node`]: the object itself.
//! - [`TargetHandle::Ref`]: a [`NodeRef`] the host fills in when the node
//!   mounts and clears when it unmounts.
//! - [`TargetHandle::Thunk`]: a function asked for the object each time.
//!
//! A handle that resolves to `None` is "not ready" rather than an error.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::cell::Latest;
use crate::deps::same_by;

/// The resolved form of a target list, one slot per handle.
pub type Resolved<N> = SmallVec<[Option<Arc<N>>; 2]>;

type Thunk<N> = Arc<dyn Fn() -> Option<Arc<N>> + Send + Sync>;

/// A ref cell for a host-owned node.
pub struct NodeRef<N> {
    current: Latest<Option<Arc<N>>>,
}

impl<N> NodeRef<N> {
    /// An empty ref. Resolves to `None` until [`NodeRef::set`] is called.
    pub fn new() -> Self {
        Self {
            current: Latest::new(None),
        }
    }

    /// Called by the host when the node mounts.
    pub fn set(&self, node: Arc<N>) {
        self.current.set(Some(node));
    }

    /// Called by the host when the node unmounts.
    pub fn clear(&self) {
        self.current.set(None);
    }

    pub fn get(&self) -> Option<Arc<N>> {
        self.current.get()
    }
}

impl<N> Default for NodeRef<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for NodeRef<N> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
        }
    }
}

impl<N> fmt::Debug for NodeRef<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("mounted", &self.current.with(Option::is_some))
            .finish()
    }
}

/// One logical target.
pub enum TargetHandle<N> {
    Node(Arc<N>),
    Ref(NodeRef<N>),
    Thunk(Thunk<N>),
}

impl<N> TargetHandle<N> {
    /// A target computed on demand.
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn() -> Option<Arc<N>> + Send + Sync + 'static,
    {
        TargetHandle::Thunk(Arc::new(f))
    }

    /// The object behind this handle right now, if any.
    pub fn resolve(&self) -> Option<Arc<N>> {
        match self {
            TargetHandle::Node(node) => Some(Arc::clone(node)),
            TargetHandle::Ref(node_ref) => node_ref.get(),
            TargetHandle::Thunk(f) => f(),
        }
    }
}

impl<N> Clone for TargetHandle<N> {
    fn clone(&self) -> Self {
        match self {
            TargetHandle::Node(node) => TargetHandle::Node(Arc::clone(node)),
            TargetHandle::Ref(node_ref) => TargetHandle::Ref(node_ref.clone()),
            TargetHandle::Thunk(f) => TargetHandle::Thunk(Arc::clone(f)),
        }
    }
}

impl<N> fmt::Debug for TargetHandle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetHandle::Node(node) => f
                .debug_tuple("Node")
                .field(&Arc::as_ptr(node))
                .finish(),
            TargetHandle::Ref(node_ref) => f.debug_tuple("Ref").field(node_ref).finish(),
            TargetHandle::Thunk(_) => f.write_str("Thunk"),
        }
    }
}

impl<N> From<Arc<N>> for TargetHandle<N> {
    fn from(node: Arc<N>) -> Self {
        TargetHandle::Node(node)
    }
}

impl<N> From<NodeRef<N>> for TargetHandle<N> {
    fn from(node_ref: NodeRef<N>) -> Self {
        TargetHandle::Ref(node_ref)
    }
}

impl<N> From<&NodeRef<N>> for TargetHandle<N> {
    fn from(node_ref: &NodeRef<N>) -> Self {
        TargetHandle::Ref(node_ref.clone())
    }
}

/// An ordered list of targets. Built from a single handle or many.
pub struct Targets<N>(SmallVec<[TargetHandle<N>; 2]>);

impl<N> Targets<N> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve every handle, in order.
    pub fn resolve_all(&self) -> Resolved<N> {
        self.0.iter().map(TargetHandle::resolve).collect()
    }
}

impl<N> Clone for Targets<N> {
    fn clone(&self) -> Self {
        Targets(self.0.clone())
    }
}

impl<N> fmt::Debug for Targets<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<N> From<TargetHandle<N>> for Targets<N> {
    fn from(handle: TargetHandle<N>) -> Self {
        Targets(std::iter::once(handle).collect())
    }
}

impl<N> From<Arc<N>> for Targets<N> {
    fn from(node: Arc<N>) -> Self {
        TargetHandle::from(node).into()
    }
}

impl<N> From<&NodeRef<N>> for Targets<N> {
    fn from(node_ref: &NodeRef<N>) -> Self {
        TargetHandle::from(node_ref).into()
    }
}

impl<N> From<Vec<TargetHandle<N>>> for Targets<N> {
    fn from(handles: Vec<TargetHandle<N>>) -> Self {
        Targets(handles.into_iter().collect())
    }
}

impl<N> FromIterator<TargetHandle<N>> for Targets<N> {
    fn from_iter<I: IntoIterator<Item = TargetHandle<N>>>(iter: I) -> Self {
        Targets(iter.into_iter().collect())
    }
}

/// Compare two resolved lists by length and per-slot identity.
pub fn same_nodes<N>(old: &[Option<Arc<N>>], new: &[Option<Arc<N>>]) -> bool {
    same_by(old, new, |a, b| match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    })
}
