//! Structural assertions over graphs and CFG snapshots

use std::fmt::Debug;
use std::hash::Hash;

use scriptgraph_ir::features::flow_graph::{Cfg, CfgSnapshot, FlowGraphResult};
use scriptgraph_ir::features::ir_generation::IrModule;
use scriptgraph_ir::shared::graph::IdGraph;

/// `b ∈ succ(a) ⇔ a ∈ pred(b)`, with no duplicates on either side
pub fn assert_symmetric<N: Clone + Eq + Hash + Debug>(graph: &IdGraph<N>) {
    for a in graph.node_ids() {
        for &b in graph.succ(a) {
            assert!(graph.pred(b).contains(&a), "{:?} -> {:?} missing pred", a, b);
        }
        for &p in graph.pred(a) {
            assert!(graph.succ(p).contains(&a), "{:?} <- {:?} missing succ", a, p);
        }
        let mut succ = graph.succ(a).to_vec();
        succ.sort();
        succ.dedup();
        assert_eq!(succ.len(), graph.succ(a).len(), "parallel edges at {:?}", a);
    }
}

/// Same property on the serialized form
pub fn assert_snapshot_symmetric(snapshot: &CfgSnapshot) {
    for block in &snapshot.blocks {
        for &s in &block.succs {
            let target = snapshot
                .blocks
                .iter()
                .find(|b| b.id == s)
                .unwrap_or_else(|| panic!("{}: dangling successor {}", snapshot.function, s));
            assert!(target.preds.contains(&block.id), "{}: B{} -> B{}", snapshot.function, block.id, s);
        }
    }
}

/// The entry has no predecessor and every other block has one
pub fn assert_blocks_complete(snapshot: &CfgSnapshot) {
    let entry = &snapshot.blocks[0];
    assert!(
        entry.preds.is_empty(),
        "{}: entry has predecessors {:?}",
        snapshot.function,
        entry.preds
    );
    for block in snapshot.blocks.iter().filter(|b| b.id != 0) {
        assert!(
            !block.preds.is_empty(),
            "{}: B{} has no predecessor",
            snapshot.function,
            block.id
        );
    }
}

/// Blocks, concatenated in id order, hold exactly the function's body
pub fn assert_cfg_covers_body(module: &IrModule, cfg: &Cfg) {
    let function = module
        .functions
        .iter()
        .find(|f| f.id == cfg.function())
        .unwrap_or_else(|| panic!("no function {}", cfg.function()));
    let expected: Vec<String> = function.body.stmts.iter().map(|s| s.to_string()).collect();
    let actual: Vec<String> = cfg
        .blocks()
        .iter()
        .flat_map(|b| b.stmts.iter().map(|s| s.to_string()))
        .collect();
    assert_eq!(actual, expected, "{}: statements lost or duplicated", cfg.function());
    assert!(cfg.entry().preds.is_empty(), "{}: entry has predecessors", cfg.function());
}

/// [`assert_cfg_covers_body`] and [`assert_blocks_complete`] for every function
pub fn assert_flow_complete(module: &IrModule, result: &FlowGraphResult) {
    assert_eq!(result.cfgs.len(), module.functions.len());
    for cfg in &result.cfgs {
        assert_cfg_covers_body(module, cfg);
    }
    for snapshot in &result.snapshots {
        assert_blocks_complete(snapshot);
    }
}
