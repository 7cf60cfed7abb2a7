//! Subscription pruning.
//!
//! A derivation that reads both `a` and `b`, where `b` itself depends on `a`,
//! only needs to subscribe to `b`: a change of `a` reaches it through `b`'s
//! own recomputation. Subscribing to both would re-derive twice per change.
//!
//! [`minimal_dependencies`] walks the recorded reads in first-read order and
//! keeps a subscription only for reads that no other kept read covers. The
//! first path found to a shared ancestor wins, so the chosen set depends on
//! read order; every choice is transitively complete.

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::config;
use crate::node::{AnyObservable, Node, NodeRef, NodeSet};
use crate::observable::{ObservableId, SubscriptionId};
use crate::stats;

pub(crate) struct Dependency {
    pub(crate) node: NodeRef,
    pub(crate) subscription: SubscriptionId,
}

pub(crate) type Dependencies = IndexMap<ObservableId, Dependency>;

/// Members of `candidates` reachable through `node`'s dependencies, in
/// depth-first discovery order. Pure.
pub(crate) fn shared_dependencies(node: &dyn Node, candidates: &NodeSet) -> NodeSet {
    let mut shared = NodeSet::default();
    let mut visited = HashSet::new();
    collect_shared(node, candidates, &mut shared, &mut visited);
    shared
}

fn collect_shared(
    node: &dyn Node,
    candidates: &NodeSet,
    shared: &mut NodeSet,
    visited: &mut HashSet<ObservableId>,
) {
    for dep in node.dependency_nodes() {
        let id = dep.id();
        // a node seen through another path contributes nothing new
        if !visited.insert(id) {
            continue;
        }
        if candidates.contains_key(&id) {
            shared.insert(id, dep.clone());
        }
        collect_shared(dep.as_ref(), candidates, shared, visited);
    }
}

/// Whether `target` is reachable from `node` through dependency edges.
pub(crate) fn reaches(node: &dyn Node, target: ObservableId) -> bool {
    let mut visited = HashSet::new();
    let mut stack: Vec<NodeRef> = node.dependency_nodes().into_vec();
    while let Some(next) = stack.pop() {
        let id = next.id();
        if id == target {
            return true;
        }
        if visited.insert(id) {
            stack.extend(next.dependency_nodes());
        }
    }
    false
}

pub(crate) fn resolve_public(node: &dyn Node, candidates: &[AnyObservable]) -> Vec<AnyObservable> {
    let candidates: NodeSet = candidates
        .iter()
        .map(|c| (c.id(), c.0.clone()))
        .collect();
    shared_dependencies(node, &candidates)
        .into_values()
        .map(AnyObservable)
        .collect()
}

/// Subscribes `owner` to the minimal covering subset of `recorded`.
pub(crate) fn minimal_dependencies(
    owner: ObservableId,
    recorded: &NodeSet,
    on_change: &Rc<dyn Fn()>,
) -> Dependencies {
    let verbose = config().log_pruning;
    let mut pending: VecDeque<NodeRef> = recorded.values().cloned().collect();
    let mut confirmed = Dependencies::new();

    while let Some(dep) = pending.pop_front() {
        for (shared_id, _) in shared_dependencies(dep.as_ref(), recorded) {
            if let Some(covered) = confirmed.shift_remove(&shared_id) {
                covered.node.unsubscribe(covered.subscription);
                stats::bump(|s| s.prunes += 1);
                if verbose {
                    log::debug!("{owner}: dropping {shared_id}, covered by {}", dep.id());
                }
            } else if let Some(pos) = pending.iter().position(|p| p.id() == shared_id) {
                pending.remove(pos);
                stats::bump(|s| s.prunes += 1);
                if verbose {
                    log::debug!("{owner}: skipping {shared_id}, covered by {}", dep.id());
                }
            }
        }

        let subscription = dep.subscribe_dependent(on_change.clone());
        log::trace!("{owner} subscribed to {}", dep.id());
        confirmed.insert(dep.id(), Dependency { node: dep, subscription });
    }

    confirmed
}
