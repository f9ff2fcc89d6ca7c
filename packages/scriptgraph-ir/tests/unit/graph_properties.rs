//! Property tests for the graph substrate and the CFGs built on it

#[path = "../common/mod.rs"]
mod common;

use common::{assert_flow_complete, assert_snapshot_symmetric, assert_symmetric, flow};
use proptest::prelude::*;
use scriptgraph_ir::shared::graph::{IdGraph, NodeId};

fn graph_from(nodes: usize, edges: &[(usize, usize)]) -> IdGraph<usize> {
    let mut graph = IdGraph::new();
    for n in 0..nodes {
        graph.add_node(n);
    }
    for &(a, b) in edges {
        graph.add_edge(NodeId(a % nodes), NodeId(b % nodes)).unwrap();
    }
    graph
}

fn arb_graph() -> impl Strategy<Value = IdGraph<usize>> {
    (1usize..24).prop_flat_map(|nodes| {
        prop::collection::vec((0..nodes, 0..nodes), 0..64)
            .prop_map(move |edges| graph_from(nodes, &edges))
    })
}

proptest! {
    #[test]
    fn test_succ_pred_symmetry(graph in arb_graph()) {
        assert_symmetric(&graph);
    }

    #[test]
    fn test_edge_count_matches_adjacency(graph in arb_graph()) {
        let from_succ: usize = graph.node_ids().map(|id| graph.succ(id).len()).sum();
        let from_pred: usize = graph.node_ids().map(|id| graph.pred(id).len()).sum();
        prop_assert_eq!(from_succ, graph.edge_count());
        prop_assert_eq!(from_pred, graph.edge_count());
    }

    #[test]
    fn test_reachability_is_closed(graph in arb_graph()) {
        let reached = graph.reachable_from(&[NodeId(0)]).unwrap();
        for &id in &reached {
            for next in graph.succ(id) {
                prop_assert!(reached.contains(next));
            }
        }
        // Idempotent: starting from everything reached finds nothing new
        let roots: Vec<NodeId> = reached.iter().copied().collect();
        prop_assert_eq!(graph.reachable_from(&roots).unwrap(), reached);
    }

    #[test]
    fn test_scc_partition_covers_every_node(graph in arb_graph()) {
        let mut seen: Vec<NodeId> = graph.sccs().into_iter().flatten().collect();
        seen.sort();
        let all: Vec<NodeId> = graph.node_ids().collect();
        prop_assert_eq!(seen, all);
    }

    #[test]
    fn test_loop_nesting_yields_complete_cfgs(depth in 1usize..5, guarded in any::<bool>()) {
        let mut body = String::from("s = s + 1;");
        for level in 0..depth {
            body = if guarded && level % 2 == 0 {
                format!("for (let i{0} = 0; i{0} < n; i{0}++) {{ if (i{0} > 2) {{ continue; }} {1} }}", level, body)
            } else {
                format!("while (s < n) {{ {} }}", body)
            };
        }
        let source = format!("function f(n) {{ let s = 0; try {{ {} }} finally {{ done(); }} return s; }}", body);
        let (module, result) = flow("p.ets", &source);
        assert_flow_complete(&module, &result);
        for snapshot in &result.snapshots {
            assert_snapshot_symmetric(snapshot);
        }
        for cfg in &result.cfgs {
            assert_symmetric(cfg.graph());
        }
    }
}

proptest! {
    #[test]
    fn test_leading_loops_keep_a_single_entry(depth in 1usize..4, form in 0usize..3) {
        let mut body = String::from("g();");
        for _ in 0..depth {
            body = match form {
                0 => format!("while (flag) {{ {} }}", body),
                1 => format!("do {{ {} }} while (flag);", body),
                _ => format!("for (;;) {{ if (flag) {{ break; }} {} }}", body),
            };
        }
        let source = format!("function f() {{ {} }}\n{}", body, body);
        let (module, result) = flow("lead.ets", &source);
        assert_flow_complete(&module, &result);
        for snapshot in &result.snapshots {
            let roots: Vec<usize> = snapshot
                .blocks
                .iter()
                .filter(|b| b.preds.is_empty())
                .map(|b| b.id)
                .collect();
            prop_assert_eq!(roots, vec![0]);
        }
    }
}

#[test]
fn test_unknown_ids_fail_loudly() {
    let graph = graph_from(2, &[(0, 1)]);
    assert!(graph.get_node(NodeId(7)).is_err());
    assert!(graph.bfs(&[NodeId(9)]).is_err());
}
