//! Source fixtures and one-call pipelines

use scriptgraph_ir::config::{PipelineConfig, Preset};
use scriptgraph_ir::features::flow_graph::{BuildFlowGraphsUseCase, CfgBuilder, FlowGraphResult};
use scriptgraph_ir::features::ir_generation::{AstLowerer, GenerateIrUseCase, IrModule};
use scriptgraph_ir::features::parsing::{SourceParser, SourceUnit, TypeScriptParser};
use scriptgraph_ir::{AnalysisResult, Orchestrator};

pub fn parse(path: &str, source: &str) -> SourceUnit {
    TypeScriptParser::new().parse(source, path).unwrap()
}

pub fn lower(path: &str, source: &str) -> IrModule {
    GenerateIrUseCase::new(AstLowerer::default())
        .execute(&parse(path, source))
        .unwrap()
}

pub fn flow(path: &str, source: &str) -> (IrModule, FlowGraphResult) {
    let module = lower(path, source);
    let result = BuildFlowGraphsUseCase::new(CfgBuilder::default())
        .execute(&module)
        .unwrap();
    (module, result)
}

/// Rendered statements of one function
pub fn listing(module: &IrModule, qualified: &str) -> Vec<String> {
    module
        .function_named(qualified)
        .unwrap_or_else(|| panic!("no function {}", qualified))
        .body
        .stmts
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn files(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(path, source)| (path.to_string(), source.to_string()))
        .collect()
}

pub fn roots(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub fn analyze(pairs: &[(&str, &str)], root_ids: &[&str]) -> AnalysisResult {
    let config = PipelineConfig::preset(Preset::Balanced).build().unwrap();
    Orchestrator::from_config(config)
        .analyze_sources(&files(pairs), &roots(root_ids))
        .unwrap()
}

/// Small app: util (re-exported through lib/index), a class hierarchy split
/// across two units, and an entry point
pub fn fixture_app() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "lib/util.ets",
            "export function format(x: number) { return pad(x); }\n\
             function pad(x: number) { return x; }\n\
             export function unused() { return 0; }",
        ),
        ("lib/index.ets", "export { format as fmt } from './util';"),
        (
            "model/base.ets",
            "export class Shape { area() { return 0; } describe() { return this.area(); } }",
        ),
        (
            "model/square.ets",
            "import { Shape } from './base';\n\
             export class Square extends Shape {\n\
               side: number;\n\
               constructor(side: number) { super(); this.side = side; }\n\
               area() { return this.side * this.side; }\n\
             }",
        ),
        (
            "main.ets",
            "import { fmt } from './lib';\n\
             import { Square } from './model/square';\n\
             export function main() {\n\
               const s = new Square(2);\n\
               const d = s.describe();\n\
               onReady(() => d);\n\
               return fmt(s.area());\n\
             }\n\
             function orphan() { return 1; }",
        ),
    ]
}
