use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::observable::{ObservableId, SubscriptionId};
use crate::resolve;

pub(crate) type NodeRef = Rc<dyn Node>;

/// Identity-keyed, read-ordered set of nodes.
pub(crate) type NodeSet = IndexMap<ObservableId, NodeRef>;

/// Type-erased view of an observable cell, used wherever the graph is walked
/// without knowing the value types involved.
pub(crate) trait Node {
    fn id(&self) -> ObservableId;
    fn label(&self) -> Option<String>;
    fn is_computed(&self) -> bool;
    fn dependency_nodes(&self) -> SmallVec<[NodeRef; 4]>;
    fn subscribe_dependent(&self, on_change: Rc<dyn Fn()>) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
    fn subscriber_count(&self) -> usize;
}

/// A handle to an observable of any value type.
///
/// Equality and hashing are by identity.
#[derive(Clone)]
pub struct AnyObservable(pub(crate) NodeRef);

impl AnyObservable {
    pub fn id(&self) -> ObservableId {
        self.0.id()
    }

    pub fn label(&self) -> Option<String> {
        self.0.label()
    }

    pub fn is_computed(&self) -> bool {
        self.0.is_computed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscriber_count()
    }

    /// Direct dependencies, in subscription order. Empty for leaves.
    pub fn dependencies(&self) -> Vec<AnyObservable> {
        self.0
            .dependency_nodes()
            .into_iter()
            .map(AnyObservable)
            .collect()
    }

    /// Members of `candidates` reachable through this observable's
    /// dependency graph.
    pub fn resolve(&self, candidates: &[AnyObservable]) -> Vec<AnyObservable> {
        resolve::resolve_public(self.0.as_ref(), candidates)
    }
}

impl PartialEq for AnyObservable {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for AnyObservable {}

impl Hash for AnyObservable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for AnyObservable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyObservable")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("computed", &self.is_computed())
            .finish()
    }
}
