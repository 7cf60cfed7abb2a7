//! Dependency discovery.
//!
//! While a recording episode is active on the current thread, every read of
//! an observable registers that observable (once) in the episode's set.
//! Episodes nest: starting one saves the enclosing episode and ending it
//! restores it, so each episode only ever sees its own reads. The saved
//! state is restored by a drop guard, which also covers a derivation that
//! panics.

use std::cell::RefCell;

use crate::node::{AnyObservable, NodeRef, NodeSet};
use crate::observable::ObservableId;

thread_local! {
    static RECORDING: RefCell<Option<NodeSet>> = const { RefCell::new(None) };
}

struct Episode {
    outer: Option<Option<NodeSet>>,
}

impl Episode {
    fn begin(slot: Option<NodeSet>) -> Self {
        let outer = RECORDING.with(|r| std::mem::replace(&mut *r.borrow_mut(), slot));
        Self { outer: Some(outer) }
    }

    fn end(&mut self) -> Option<NodeSet> {
        let outer = self.outer.take()?;
        RECORDING
            .try_with(|r| std::mem::replace(&mut *r.borrow_mut(), outer))
            .ok()
            .flatten()
    }
}

impl Drop for Episode {
    fn drop(&mut self) {
        self.end();
    }
}

pub(crate) fn register_read(id: ObservableId, node: impl FnOnce() -> NodeRef) {
    RECORDING.with(|r| {
        if let Some(set) = r.borrow_mut().as_mut()
            && !set.contains_key(&id)
        {
            log::trace!("recorded read of {id}");
            set.insert(id, node());
        }
    });
}

/// Runs `f` inside a fresh recording episode and returns what it read, in
/// first-read order.
pub(crate) fn record<R>(f: impl FnOnce() -> R) -> (R, NodeSet) {
    let mut episode = Episode::begin(Some(NodeSet::default()));
    let out = f();
    let recorded = episode.end().unwrap_or_default();
    (out, recorded)
}

/// Runs `f` with recording suspended. Reads inside `f` are invisible to any
/// enclosing episode.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _episode = Episode::begin(None);
    f()
}

pub fn is_recording() -> bool {
    RECORDING.with(|r| r.borrow().is_some())
}

/// Runs `f` under recording and hands back the observables it read.
///
/// ```rust
/// use honey_core::*;
///
/// let a = Observable::new(1);
/// let b = Observable::new(2);
/// let (sum, read) = record_reads(|| a.get() + b.get() + a.get());
/// assert_eq!(sum, 4);
/// assert_eq!(read, vec![a.as_any(), b.as_any()]);
/// ```
pub fn record_reads<R>(f: impl FnOnce() -> R) -> (R, Vec<AnyObservable>) {
    let (out, recorded) = record(f);
    (out, recorded.into_values().map(AnyObservable).collect())
}
