//! CFG shape and snapshot tests
//!
//! Block ids, predecessor and successor lists are asserted exactly;
//! statement text only by the protocol calls it must contain.

#[path = "../common/mod.rs"]
mod common;

use common::{assert_blocks_complete, assert_flow_complete, assert_snapshot_symmetric, flow};
use pretty_assertions::assert_eq;
use scriptgraph_ir::features::flow_graph::{BlockKind, CfgSnapshot};

fn snapshot_of(source: &str, function: &str) -> CfgSnapshot {
    let (module, result) = flow("golden.ets", source);
    assert_flow_complete(&module, &result);
    let id = &module
        .function_named(function)
        .unwrap_or_else(|| panic!("no function {}", function))
        .id;
    result
        .snapshots
        .iter()
        .find(|s| &s.function == id)
        .cloned()
        .unwrap()
}

fn shape(snapshot: &CfgSnapshot) -> Vec<(usize, Vec<usize>, Vec<usize>)> {
    snapshot
        .blocks
        .iter()
        .map(|b| (b.id, b.preds.clone(), b.succs.clone()))
        .collect()
}

fn block_text(snapshot: &CfgSnapshot, id: usize) -> String {
    snapshot.blocks[id].stmts.join("\n")
}

#[test]
fn test_for_of_destructuring_four_blocks() {
    let snapshot = snapshot_of(
        "function sum() {\n\
           const pairs = [[1, 2], [3, 4]];\n\
           let total = 0;\n\
           for (const [a, b] of pairs) { total = total + a + b; }\n\
           return total;\n\
         }",
        "sum",
    );
    assert_eq!(
        shape(&snapshot),
        vec![
            (0, vec![], vec![1]),
            (1, vec![0, 2], vec![2, 3]),
            (2, vec![1], vec![1]),
            (3, vec![1], vec![]),
        ]
    );

    let entry = block_text(&snapshot, 0);
    assert!(entry.contains("newarray"), "{}", entry);
    assert!(entry.contains(".iterator()"), "{}", entry);
    let header = block_text(&snapshot, 1);
    assert!(header.contains(".next()"), "{}", header);
    assert!(header.contains(".done"), "{}", header);
    let body = block_text(&snapshot, 2);
    assert!(body.contains(".value"), "{}", body);
    assert!(body.contains("[0]") && body.contains("[1]"), "{}", body);
    assert!(block_text(&snapshot, 3).starts_with("return"));

    let kinds: Vec<BlockKind> = snapshot.blocks.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![BlockKind::Entry, BlockKind::LoopHeader, BlockKind::Body, BlockKind::Exit]
    );
}

#[test]
fn test_while_header_has_entry_and_back_edge() {
    let snapshot = snapshot_of(
        "function count(n) { let i = 0; while (i < n) { i = i + 1; } return i; }",
        "count",
    );
    let header = snapshot
        .blocks
        .iter()
        .find(|b| b.kind == BlockKind::LoopHeader)
        .unwrap();
    assert_eq!(header.preds.len(), 2);
    assert_eq!(header.preds[0], 0);
    assert_eq!(header.succs.len(), 2);
    let body = header.succs[0];
    assert!(snapshot.blocks[body].succs.contains(&header.id));
    assert_snapshot_symmetric(&snapshot);
}

#[test]
fn test_else_if_chain_leans_right() {
    let snapshot = snapshot_of(
        "function pick(x) {\n\
           if (x > 1) { a(); } else if (x > 0) { b(); } else { c(); }\n\
           return x;\n\
         }",
        "pick",
    );
    let branches: Vec<_> = snapshot.blocks.iter().filter(|b| b.succs.len() == 2).collect();
    assert_eq!(branches.len(), 2);
    let (first, second) = (branches[0], branches[1]);
    assert_eq!(first.id, 0);
    // The `else if` test sits in the else successor of the first test
    assert_eq!(first.succs[1], second.id);
    assert_eq!(second.preds, vec![first.id]);
    assert_blocks_complete(&snapshot);
    assert_snapshot_symmetric(&snapshot);
}

#[test]
fn test_exception_edge_follows_normal_edge() {
    let snapshot = snapshot_of(
        "function guarded() { try { risky(); } catch (e) { report(e); } return 1; }",
        "guarded",
    );
    let handler = snapshot
        .blocks
        .iter()
        .find(|b| b.kind == BlockKind::Handler)
        .expect("handler block");
    assert!(block_text(&snapshot, handler.id).contains("caughtexception"));
    let protected = snapshot
        .blocks
        .iter()
        .find(|b| b.stmts.iter().any(|s| s.contains("risky")))
        .unwrap();
    assert_eq!(protected.succs.last(), Some(&handler.id));
    assert!(protected.succs.len() >= 2);
    assert_blocks_complete(&snapshot);
    assert_snapshot_symmetric(&snapshot);
}

#[test]
fn test_golden_file_roundtrip() {
    let source = "function f(xs) { let n = 0; for (const x of xs) { if (x) { n = n + 1; } } return n; }";
    let snapshot = snapshot_of(source, "f");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.cfg.json");
    std::fs::write(&path, snapshot.to_json().unwrap()).unwrap();

    let golden = CfgSnapshot::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let again = snapshot_of(source, "f");
    assert_eq!(golden, again);
    assert_eq!(golden.fingerprint, Some(again.compute_fingerprint()));
}

#[test]
fn test_fingerprint_tracks_body_changes() {
    let a = snapshot_of("function f(x) { return x; }", "f");
    let b = snapshot_of("function f(x) { return x + 1; }", "f");
    assert_ne!(a.fingerprint, b.fingerprint);
}

#[test]
fn test_leading_while_gets_empty_entry() {
    let snapshot = snapshot_of("function spin() { while (flag) { g(); } }", "spin");
    assert!(snapshot.blocks[0].stmts.is_empty());
    assert_eq!(snapshot.blocks[0].succs, vec![1]);
    let header = &snapshot.blocks[1];
    assert_eq!(header.kind, BlockKind::LoopHeader);
    assert_eq!(header.preds[0], 0);
    assert_eq!(header.preds.len(), 2);
    assert_blocks_complete(&snapshot);
    assert_snapshot_symmetric(&snapshot);
}

#[test]
fn test_leading_do_while_and_for_ever() {
    for (source, name) in [
        ("function again() { do { g(); } while (flag); }", "again"),
        ("function ever() { for (;;) { if (flag) { break; } } }", "ever"),
    ] {
        let snapshot = snapshot_of(source, name);
        let roots: Vec<usize> = snapshot
            .blocks
            .iter()
            .filter(|b| b.preds.is_empty())
            .map(|b| b.id)
            .collect();
        assert_eq!(roots, vec![0], "{}", name);
        assert_eq!(snapshot.blocks[1].kind, BlockKind::LoopHeader, "{}", name);
    }
}
