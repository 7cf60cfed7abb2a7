//! Property tests for dependency pruning and cascade delivery over random
//! acyclic graphs.
//!
//! Every computed node is `1 + sum(inputs)`, and writes only ever increment a
//! leaf, so every write strictly increases all of its descendants. That keeps
//! equality suppression out of the way: any node left behind is a missed
//! update, not a suppressed one.

use honey_core::*;
use proptest::collection::vec;
use proptest::prelude::*;

struct Graph {
    leaves: usize,
    nodes: Vec<Observable<i64>>,
    inputs: Vec<Vec<usize>>,
}

fn build(leaves: usize, computeds: &[Vec<usize>]) -> Graph {
    let mut nodes = Vec::new();
    let mut inputs = Vec::new();
    for i in 0..leaves {
        nodes.push(Observable::new(i as i64));
        inputs.push(Vec::new());
    }
    for raw in computeds {
        let n = nodes.len();
        let picks: Vec<usize> = raw.iter().map(|r| r % n).collect();
        let reads: Vec<Observable<i64>> = picks.iter().map(|&p| nodes[p].clone()).collect();
        nodes.push(Observable::computed(move || {
            1 + reads.iter().map(|o| o.get()).sum::<i64>()
        }));
        inputs.push(picks);
    }
    Graph {
        leaves,
        nodes,
        inputs,
    }
}

fn expected(graph: &Graph) -> Vec<i64> {
    let mut values: Vec<i64> = Vec::with_capacity(graph.nodes.len());
    for (i, picks) in graph.inputs.iter().enumerate() {
        let v = if i < graph.leaves {
            graph.nodes[i].get_untracked()
        } else {
            1 + picks.iter().map(|&p| values[p]).sum::<i64>()
        };
        values.push(v);
    }
    values
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1usize..4, vec(vec(any::<usize>(), 1..4), 1..8))
}

proptest! {
    #[test]
    fn dependencies_are_minimal_and_complete((leaves, computeds) in graph_strategy()) {
        let graph = build(leaves, &computeds);

        for (i, picks) in graph.inputs.iter().enumerate().skip(graph.leaves) {
            let deps = graph.nodes[i].dependencies();

            for x in &deps {
                for y in &deps {
                    if x != y {
                        prop_assert!(x.resolve(std::slice::from_ref(y)).is_empty());
                    }
                }
            }

            for &p in picks {
                let read = graph.nodes[p].as_any();
                let covered = deps.contains(&read)
                    || deps.iter().any(|d| !d.resolve(std::slice::from_ref(&read)).is_empty());
                prop_assert!(covered);
            }
        }
    }

    #[test]
    fn writes_reach_every_dependent(
        (leaves, computeds) in graph_strategy(),
        writes in vec(any::<usize>(), 1..10),
    ) {
        let graph = build(leaves, &computeds);
        prop_assert_eq!(
            graph.nodes.iter().map(|n| n.get_untracked()).collect::<Vec<_>>(),
            expected(&graph)
        );

        for w in writes {
            graph.nodes[w % graph.leaves].update(|v| *v += 1);
            let want = expected(&graph);
            for (i, node) in graph.nodes.iter().enumerate() {
                prop_assert_eq!(node.get_untracked(), want[i]);
            }
        }
    }
}
