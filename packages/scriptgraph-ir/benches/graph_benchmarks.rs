//! Benchmarks for the analysis stages
//!
//! - IdGraph construction and traversal
//! - Lowering + CFG construction of one unit
//! - Whole-program pipeline at increasing unit counts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scriptgraph_ir::config::{PipelineConfig, Preset};
use scriptgraph_ir::features::flow_graph::{BuildFlowGraphsUseCase, CfgBuilder};
use scriptgraph_ir::features::ir_generation::{AstLowerer, GenerateIrUseCase};
use scriptgraph_ir::features::parsing::{SourceParser, TypeScriptParser};
use scriptgraph_ir::shared::graph::{IdGraph, NodeId};
use scriptgraph_ir::Orchestrator;

// ============================================================================
// Fixtures
// ============================================================================

fn unit_source(index: usize, total: usize) -> String {
    let next = (index + 1) % total;
    format!(
        r#"import {{ step{next} }} from './m{next}';

export function step{index}(n: number): number {{
    let acc = 0;
    for (let i = 0; i < n; i++) {{
        if (i % 3 === 0) {{
            acc += i;
        }} else if (i % 5 === 0) {{
            continue;
        }}
        try {{
            acc = acc + helper{index}(i);
        }} catch (e) {{
            acc = 0;
        }}
    }}
    const add = (x) => acc + x;
    return n > 0 ? step{next}(add(n - 1)) : acc;
}}

function helper{index}(v: number): number {{
    while (v > 10) {{
        v = v / 2;
    }}
    return v;
}}
"#
    )
}

fn program(total: usize) -> Vec<(String, String)> {
    (0..total)
        .map(|i| (format!("m{}.ets", i), unit_source(i, total)))
        .collect()
}

// ============================================================================
// Graph substrate
// ============================================================================

fn bench_id_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_graph");

    for size in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &size, |b, &size| {
            b.iter(|| {
                let mut graph = IdGraph::with_capacity(size);
                for n in 0..size {
                    graph.add_node(n);
                }
                for n in 0..size {
                    let _ = graph.add_edge(NodeId(n), NodeId((n * 7 + 1) % size));
                    let _ = graph.add_edge(NodeId(n), NodeId((n + 1) % size));
                }
                black_box(graph)
            });
        });

        let mut graph = IdGraph::with_capacity(size);
        for n in 0..size {
            graph.add_node(n);
        }
        for n in 0..size {
            let _ = graph.add_edge(NodeId(n), NodeId((n * 7 + 1) % size));
        }
        group.bench_with_input(BenchmarkId::new("bfs", size), &graph, |b, graph| {
            b.iter(|| black_box(graph.bfs(&[NodeId(0)])))
        });
        group.bench_with_input(BenchmarkId::new("sccs", size), &graph, |b, graph| {
            b.iter(|| black_box(graph.sccs()))
        });
    }

    group.finish();
}

// ============================================================================
// Per-unit stages
// ============================================================================

fn bench_unit_stages(c: &mut Criterion) {
    let source = unit_source(0, 2);
    let unit = TypeScriptParser::new().parse(&source, "m0.ets").unwrap();
    let lower = GenerateIrUseCase::new(AstLowerer::default());
    let module = lower.execute(&unit).unwrap();
    let flow = BuildFlowGraphsUseCase::new(CfgBuilder::default());

    let mut group = c.benchmark_group("unit_stages");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("parse", |b| {
        let parser = TypeScriptParser::new();
        b.iter(|| black_box(parser.parse(black_box(&source), "m0.ets")))
    });
    group.bench_function("lower", |b| b.iter(|| black_box(lower.execute(&unit))));
    group.bench_function("cfg", |b| b.iter(|| black_box(flow.execute(&module))));
    group.finish();
}

// ============================================================================
// Whole program
// ============================================================================

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for units in [8usize, 64] {
        let files = program(units);
        let roots = vec!["@m0.ets: step0".to_string()];
        group.throughput(Throughput::Elements(units as u64));
        for workers in [1usize, 4] {
            let config = PipelineConfig::preset(Preset::Balanced)
                .parallel(|p| p.num_workers(workers))
                .build()
                .unwrap();
            let orchestrator = Orchestrator::from_config(config);
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{}", workers), units),
                &files,
                |b, files| b.iter(|| black_box(orchestrator.analyze_sources(files, &roots))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_id_graph, bench_unit_stages, bench_pipeline);
criterion_main!(benches);
