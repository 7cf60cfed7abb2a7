#![forbid(unsafe_code)]

//! Observable cells.
//!
//! # Invariants
//!
//! 1. A cell is a leaf or computed for its whole life; the variant is fixed
//!    at construction.
//! 2. The stored value is the last assigned value (leaf) or the result of
//!    the last derivation call (computed), replaced whole.
//! 3. Writing a value equal to the current one changes nothing and notifies
//!    nobody.
//! 4. Subscribers are notified in subscription order, from a snapshot taken
//!    after the value is stored and all borrows are released.
//! 5. After setup, no dependency of a computed cell is reachable through
//!    another of its dependencies.
//!
//! # Failure Modes
//!
//! - **Pruned intermediate unchanged**: a computed cell that reads `a` and
//!   `b = f(a)` subscribes only to `b`. If a change of `a` leaves `b` equal,
//!   the cell is not re-derived, even if its own derivation would now give a
//!   different result.
//! - **Cyclic graph**: a write that loops back onto itself (a subscriber
//!   writing into its own source) panics as soon as the source is notified
//!   again while its first delivery is still running.
//! - **Very deep chain**: nesting deeper than
//!   `EngineConfig::max_cascade_depth` deliveries panics instead of
//!   overflowing the stack.
//! - **Re-entrant access**: writing a cell from inside its own `with` closure
//!   panics on the `RefCell` borrow.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{HoneyError, Result};
use crate::format::{self, Formatter};
use crate::node::{AnyObservable, Node, NodeRef, NodeSet};
use crate::resolve::{self, Dependencies};
use crate::{propagate, recording, stats};

static NEXT_OBSERVABLE: AtomicU64 = AtomicU64::new(1);
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservableId(u64);

impl ObservableId {
    fn next() -> Self {
        Self(NEXT_OBSERVABLE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of one `subscribe` call. Subscribing the same closure twice
/// yields two ids and two notifications per change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

type Subscriber<T> = Rc<dyn Fn(&T)>;
type Derivation<T> = Rc<dyn Fn(Option<&T>) -> T>;

enum Kind<T: 'static> {
    Leaf {
        format: Option<Formatter<T>>,
    },
    Computed {
        derivation: Derivation<T>,
        dependencies: Dependencies,
    },
}

struct State<T: 'static> {
    value: T,
    subscribers: IndexMap<SubscriptionId, Subscriber<T>>,
    kind: Kind<T>,
}

struct Shared<T: 'static> {
    id: ObservableId,
    label: RefCell<Option<String>>,
    state: RefCell<State<T>>,
}

impl<T: 'static> Node for Shared<T> {
    fn id(&self) -> ObservableId {
        self.id
    }

    fn label(&self) -> Option<String> {
        self.label.borrow().clone()
    }

    fn is_computed(&self) -> bool {
        matches!(self.state.borrow().kind, Kind::Computed { .. })
    }

    fn dependency_nodes(&self) -> SmallVec<[NodeRef; 4]> {
        match &self.state.borrow().kind {
            Kind::Leaf { .. } => SmallVec::new(),
            Kind::Computed { dependencies, .. } => {
                dependencies.values().map(|d| d.node.clone()).collect()
            }
        }
    }

    fn subscribe_dependent(&self, on_change: Rc<dyn Fn()>) -> SubscriptionId {
        let id = SubscriptionId::next();
        let subscriber: Subscriber<T> = Rc::new(move |_: &T| on_change());
        self.state.borrow_mut().subscribers.insert(id, subscriber);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.state.borrow_mut().subscribers.shift_remove(&id);
        removed.is_some()
    }

    fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}

impl<T: 'static> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Kind::Computed { dependencies, .. } = &mut self.state.get_mut().kind {
            for (_, dep) in dependencies.drain(..) {
                dep.node.unsubscribe(dep.subscription);
            }
        }
    }
}

/// A reactive cell.
///
/// Cloning an `Observable` creates a new handle to the **same** cell.
/// Reading it while a computed observable is being set up makes that
/// computed observable depend on it; writing it pushes the new value to all
/// subscribers synchronously.
///
/// ```rust
/// use honey_core::*;
///
/// let price = Observable::new(10);
/// let total = Observable::computed({
///     let price = price.clone();
///     move || price.get() * 2
/// });
/// assert_eq!(total.get(), 20);
///
/// price.set(15);
/// assert_eq!(total.get(), 30);
/// ```
pub struct Observable<T: 'static> {
    shared: Rc<Shared<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Observable");
        d.field("id", &self.shared.id);
        if let Some(label) = self.shared.label.borrow().as_deref() {
            d.field("label", &label);
        }
        if let Ok(state) = self.shared.state.try_borrow() {
            d.field("value", &state.value)
                .field("computed", &matches!(state.kind, Kind::Computed { .. }))
                .field("subscribers", &state.subscribers.len());
        } else {
            d.field("value", &"<borrowed>");
        }
        d.finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// A leaf holding `value`.
    pub fn new(value: T) -> Self {
        Self::from_kind(value, Kind::Leaf { format: None })
    }

    /// A leaf bound to the registered format `name`.
    pub fn with_format(value: T, name: &str) -> Result<Self> {
        let formatter = format::lookup::<T>(name)?;
        Ok(Self::from_kind(
            value,
            Kind::Leaf {
                format: Some(formatter),
            },
        ))
    }

    /// A computed observable. `derive` runs once immediately; whatever it
    /// reads becomes a dependency.
    pub fn computed(derive: impl Fn() -> T + 'static) -> Self {
        Self::computed_with(move |_| derive())
    }

    /// Like [`computed`](Self::computed), but `derive` also receives the
    /// previous value (`None` on the first run).
    pub fn computed_with(derive: impl Fn(Option<&T>) -> T + 'static) -> Self {
        let derivation: Derivation<T> = Rc::new(derive);
        let (value, recorded) = recording::record(|| derivation(None));
        let this = Self::from_kind(
            value,
            Kind::Computed {
                derivation,
                dependencies: Dependencies::new(),
            },
        );
        let dependencies = this.wire(&recorded);
        log::debug!(
            "{} set up: read {}, subscribed to {}",
            this.id(),
            recorded.len(),
            dependencies.len()
        );
        this.store_dependencies(dependencies);
        stats::bump(|s| s.setups += 1);
        this
    }

    fn from_kind(value: T, kind: Kind<T>) -> Self {
        Self {
            shared: Rc::new(Shared {
                id: ObservableId::next(),
                label: RefCell::new(None),
                state: RefCell::new(State {
                    value,
                    subscribers: IndexMap::new(),
                    kind,
                }),
            }),
        }
    }

    /// Attaches a debug label shown in logs and graph dumps.
    pub fn named(self, label: impl Into<String>) -> Self {
        *self.shared.label.borrow_mut() = Some(label.into());
        self
    }

    pub fn id(&self) -> ObservableId {
        self.shared.id
    }

    pub fn label(&self) -> Option<String> {
        self.shared.label()
    }

    pub fn is_computed(&self) -> bool {
        self.shared.is_computed()
    }

    pub fn as_any(&self) -> AnyObservable {
        AnyObservable(self.node())
    }

    /// Same cell?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    fn node(&self) -> NodeRef {
        self.shared.clone()
    }

    fn track(&self) {
        recording::register_read(self.shared.id, || self.node());
    }

    /// Current value. Registers a read with an active recording episode.
    pub fn get(&self) -> T {
        self.track();
        self.shared.state.borrow().value.clone()
    }

    /// Borrows the current value. Registers a read like [`get`](Self::get).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.shared.state.borrow().value)
    }

    pub fn get_untracked(&self) -> T {
        self.shared.state.borrow().value.clone()
    }

    /// Writes `value` and notifies subscribers if it differs from the
    /// current value. Returns whether anything changed.
    ///
    /// On a computed observable the argument is ignored: the derivation is
    /// re-run against the current value instead, exactly like
    /// [`refresh`](Self::refresh).
    pub fn set(&self, value: T) -> bool {
        if self.is_computed() {
            return self.refresh();
        }
        self.commit(value)
    }

    /// Read-modify-write through [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut value = self.get_untracked();
        f(&mut value);
        self.set(value)
    }

    /// Runs the bound sanitizer on `text` and writes the result.
    pub fn set_formatted(&self, text: &str) -> Result<bool> {
        let formatter = match &self.shared.state.borrow().kind {
            Kind::Leaf {
                format: Some(formatter),
            } => formatter.clone(),
            _ => return Err(HoneyError::NoFormat(self.id())),
        };
        let value = formatter.sanitize(text)?;
        Ok(self.set(value))
    }

    /// The current value through the bound formatter, if any.
    pub fn formatted(&self) -> Option<String> {
        let state = self.shared.state.borrow();
        match &state.kind {
            Kind::Leaf {
                format: Some(formatter),
            } => Some(formatter.format(&state.value)),
            _ => None,
        }
    }

    /// Re-runs the derivation against the current value and propagates the
    /// result. A no-op on leaves.
    pub fn refresh(&self) -> bool {
        let (derivation, previous) = {
            let state = self.shared.state.borrow();
            match &state.kind {
                Kind::Computed { derivation, .. } => (derivation.clone(), state.value.clone()),
                Kind::Leaf { .. } => return false,
            }
        };
        stats::bump(|s| s.recomputes += 1);
        let next = recording::untracked(|| derivation(Some(&previous)));
        self.commit(next)
    }

    fn commit(&self, next: T) -> bool {
        let (value, subscribers, _old) = {
            let mut state = self.shared.state.borrow_mut();
            if state.value == next {
                drop(state);
                stats::bump(|s| s.suppressed_writes += 1);
                log::trace!("{}: unchanged write suppressed", self.id());
                return false;
            }
            let old = std::mem::replace(&mut state.value, next);
            let subscribers: SmallVec<[Subscriber<T>; 4]> =
                state.subscribers.values().cloned().collect();
            (state.value.clone(), subscribers, old)
        };
        stats::bump(|s| s.writes += 1);
        propagate::deliver(self.id(), &value, &subscribers);
        true
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.shared
            .state
            .borrow_mut()
            .subscribers
            .insert(id, Rc::new(f));
        log::trace!("{}: subscriber {id:?} added", self.id());
        id
    }

    /// Removes a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriber_count()
    }

    /// Direct dependencies in subscription order. Empty for leaves.
    pub fn dependencies(&self) -> Vec<AnyObservable> {
        self.as_any().dependencies()
    }

    /// Members of `candidates` reachable through this observable's
    /// dependencies (directly or transitively). Pure.
    pub fn resolve(&self, candidates: &[AnyObservable]) -> Vec<AnyObservable> {
        self.as_any().resolve(candidates)
    }

    /// Re-discovers dependencies by running the derivation under recording,
    /// replaces the current subscriptions with the new minimal set, and
    /// propagates the new value if it changed.
    ///
    /// Fails without touching the current wiring if the derivation now reads
    /// this observable, directly or through one of its reads. A no-op on
    /// leaves.
    pub fn rewire(&self) -> Result<bool> {
        let (derivation, previous) = {
            let state = self.shared.state.borrow();
            match &state.kind {
                Kind::Computed { derivation, .. } => (derivation.clone(), state.value.clone()),
                Kind::Leaf { .. } => return Ok(false),
            }
        };
        let (next, recorded) = recording::record(|| derivation(Some(&previous)));

        let me = self.id();
        for node in recorded.values() {
            if node.id() == me || resolve::reaches(node.as_ref(), me) {
                log::warn!("{me}: rewire rejected, {} depends on it", node.id());
                return Err(HoneyError::CyclicDependency(me, node.id()));
            }
        }

        self.dispose();
        let dependencies = self.wire(&recorded);
        log::debug!("{me} rewired: subscribed to {}", dependencies.len());
        self.store_dependencies(dependencies);
        stats::bump(|s| s.setups += 1);
        Ok(self.commit(next))
    }

    /// Unsubscribes a computed observable from all of its dependencies. It
    /// keeps its last value and no longer updates on its own.
    pub fn dispose(&self) {
        let old = match &mut self.shared.state.borrow_mut().kind {
            Kind::Computed { dependencies, .. } => std::mem::take(dependencies),
            Kind::Leaf { .. } => return,
        };
        for dep in old.values() {
            dep.node.unsubscribe(dep.subscription);
        }
    }

    fn wire(&self, recorded: &NodeSet) -> Dependencies {
        let weak: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        let on_change: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                Observable { shared }.refresh();
            }
        });
        resolve::minimal_dependencies(self.id(), recorded, &on_change)
    }

    fn store_dependencies(&self, wired: Dependencies) {
        if let Kind::Computed { dependencies, .. } = &mut self.shared.state.borrow_mut().kind {
            *dependencies = wired;
        }
    }
}
