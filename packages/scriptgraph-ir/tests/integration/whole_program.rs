//! Whole-program call graph and keep-path analysis through the pipeline

#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use common::{analyze, assert_symmetric, files, fixture_app, roots};
use pretty_assertions::assert_eq;
use scriptgraph_ir::config::{PipelineConfig, Preset};
use scriptgraph_ir::features::keep_path::{AnalyzeKeepPathUseCase, KeepPathAnalyzer};
use scriptgraph_ir::{Orchestrator, UNKNOWN_NODE};

fn callees(result: &scriptgraph_ir::AnalysisResult, decl: &str) -> BTreeSet<String> {
    result
        .call_graph
        .as_ref()
        .unwrap()
        .callees(decl)
        .unwrap()
        .iter()
        .map(|n| n.to_string())
        .collect()
}

#[test]
fn test_calls_resolve_across_modules() {
    let result = analyze(&fixture_app(), &["@main.ets: main"]);
    assert!(result.failures.is_empty());

    let main = callees(&result, "@main.ets: main");
    for expected in [
        "@model/square.ets: Square.constructor",
        "@model/base.ets: Shape.describe",
        "@model/square.ets: Square.area",
        "@lib/util.ets: format",
        UNKNOWN_NODE,
    ] {
        assert!(main.contains(expected), "missing {} in {:?}", expected, main);
    }
    assert!(callees(&result, "@model/square.ets: Square.constructor")
        .contains("@model/base.ets: Shape.constructor"));
    assert!(callees(&result, "@lib/util.ets: format").contains("@lib/util.ets: pad"));
}

#[test]
fn test_keep_path_skips_dead_and_unknown_reachable_code() {
    let result = analyze(&fixture_app(), &["@main.ets: main"]);
    for kept in [
        "@main.ets: main",
        "@lib/util.ets: format",
        "@lib/util.ets: pad",
        "@model/base.ets: Shape.describe",
        "@model/base.ets: Shape.area",
        "@model/square.ets: Square.area",
    ] {
        assert!(result.is_kept(kept), "{} should be kept", kept);
    }
    // Reachable only if the unknown sink propagated keep
    for dropped in ["@main.ets: orphan", "@lib/util.ets: unused"] {
        assert!(!result.is_kept(dropped), "{} should not be kept", dropped);
    }
    assert!(result.keep.as_ref().unwrap().reaches_unknown);
}

#[test]
fn test_keep_path_is_idempotent() {
    let result = analyze(&fixture_app(), &["@main.ets: main"]);
    let graph = result.call_graph.as_ref().unwrap();
    let first = result.keep.as_ref().unwrap();
    let kept: Vec<String> = first.markers.kept().cloned().collect();
    let second = AnalyzeKeepPathUseCase::new(KeepPathAnalyzer::default())
        .execute(graph, &kept)
        .unwrap();
    assert_eq!(first.markers, second.markers);
}

#[test]
fn test_one_node_per_function_and_deduplicated_edges() {
    let result = analyze(
        &[("a.ets", "function f() { g(); g(); g(); }\nfunction g() {}\nf(); f();")],
        &[],
    );
    let graph = result.call_graph.as_ref().unwrap();
    let f = graph.node_id("@a.ets: f").unwrap();
    let g = graph.node_id("@a.ets: g").unwrap();
    assert_eq!(graph.call_edges().succ(f), &[g]);
    assert_eq!(graph.edge(f, g).unwrap().call_sites.len(), 3);
    let module = graph.node_id("@a.ets: %dflt").unwrap();
    assert_eq!(graph.edge(module, f).unwrap().call_sites.len(), 2);
    assert_symmetric(graph.graph());
    assert_symmetric(graph.call_edges());
}

#[test]
fn test_mutual_recursion_across_units() {
    let result = analyze(
        &[
            ("even.ets", "import { odd } from './odd';\nexport function even(n) { return n == 0 ? true : odd(n - 1); }"),
            ("odd.ets", "import { even } from './even';\nexport function odd(n) { return n == 0 ? false : even(n - 1); }"),
        ],
        &[],
    );
    let groups = result.call_graph.as_ref().unwrap().recursion_groups();
    assert_eq!(
        groups,
        vec![vec!["@even.ets: even".to_string(), "@odd.ets: odd".to_string()]]
    );
}

#[test]
fn test_results_independent_of_worker_count() {
    let run = |workers: usize| {
        let config = PipelineConfig::preset(Preset::Balanced)
            .parallel(|c| c.num_workers(workers))
            .build()
            .unwrap();
        Orchestrator::from_config(config)
            .analyze_sources(&files(&fixture_app()), &roots(&["@main.ets: main"]))
            .unwrap()
    };
    let one = run(1);
    let many = run(8);
    assert_eq!(one.triples(), many.triples());
    assert_eq!(one.keep.unwrap().markers, many.keep.unwrap().markers);
    for (a, b) in one.units.iter().zip(&many.units) {
        assert_eq!(a.snapshots(), b.snapshots());
    }
}

#[test]
fn test_yaml_config_drives_pipeline() {
    let yaml = PipelineConfig::preset(Preset::Thorough).to_yaml().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.yaml");
    std::fs::write(&path, yaml).unwrap();

    let config = PipelineConfig::from_yaml(path.to_str().unwrap()).unwrap();
    let result = Orchestrator::from_config(config)
        .analyze_sources(&files(&fixture_app()), &[])
        .unwrap();
    // Thorough keeps every export even without explicit roots
    assert!(result.is_kept("@lib/util.ets: unused"));
    assert!(result.is_kept("@model/base.ets: Shape"));
    assert!(!result.is_kept("@main.ets: orphan"));
}

#[test]
fn test_missing_module_is_reported_as_unresolved_target() {
    let result = analyze(
        &[(
            "app.ets",
            "import { track } from './analytics';\nexport function run() { track(); local(); }\nfunction local() {}",
        )],
        &["@app.ets: run"],
    );
    let unresolved: Vec<&scriptgraph_ir::Diagnostic> = result
        .diagnostics()
        .filter(|d| d.kind == scriptgraph_ir::DiagnosticKind::UnresolvedTarget)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].message.contains("./analytics"));
    assert_eq!(unresolved[0].function.as_deref(), Some("@app.ets: run"));
    assert!(result.is_kept("@app.ets: local"));
}

#[test]
fn test_prebuilt_units_match_source_analysis() {
    let pairs = fixture_app();
    let units: Vec<_> = pairs
        .iter()
        .map(|(path, source)| common::parse(path, source))
        .collect();
    let config = PipelineConfig::preset(Preset::Balanced).build().unwrap();
    let from_units = Orchestrator::from_config(config)
        .analyze_units(&units, &roots(&["@main.ets: main"]))
        .unwrap();
    let from_sources = analyze(&pairs, &["@main.ets: main"]);
    assert_eq!(from_units.triples(), from_sources.triples());

    let callers: Vec<String> = from_units
        .call_graph
        .as_ref()
        .unwrap()
        .callers("@lib/util.ets: pad")
        .unwrap()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(callers, vec!["@lib/util.ets: format".to_string()]);
}
