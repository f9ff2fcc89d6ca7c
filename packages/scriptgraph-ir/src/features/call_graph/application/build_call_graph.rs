use tracing::info;

use crate::features::call_graph::domain::{CallGraph, UnitFragment};
use crate::features::call_graph::ports::FragmentMerger;
use crate::shared::models::Result;

/// Merge fragments sequentially, then freeze
pub struct BuildCallGraphUseCase<M: FragmentMerger> {
    merger: M,
}

impl<M: FragmentMerger> BuildCallGraphUseCase<M> {
    pub fn new(merger: M) -> Self {
        Self { merger }
    }

    pub fn execute<I>(mut self, fragments: I) -> Result<CallGraph>
    where
        I: IntoIterator<Item = UnitFragment>,
    {
        for fragment in fragments {
            self.merger.merge(fragment)?;
        }
        let units = self.merger.fragment_count();
        let graph = self.merger.freeze()?;
        info!(
            units,
            nodes = graph.node_count(),
            call_sites = graph.call_site_count(),
            "Built call graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::call_graph::CallGraphBuilder;
    use crate::features::ir_generation::{AstLowerer, GenerateIrUseCase};
    use crate::features::parsing::{SourceParser, TypeScriptParser};

    fn fragment(path: &str, source: &str) -> UnitFragment {
        let unit = TypeScriptParser::new().parse(source, path).unwrap();
        let module = GenerateIrUseCase::new(AstLowerer::default())
            .execute(&unit)
            .unwrap();
        UnitFragment::from_module(&module)
    }

    #[test]
    fn test_cross_module_method_dispatch() {
        let base = fragment(
            "base.ets",
            "export class Base { greet() { return 1; } }",
        );
        let app = fragment(
            "app.ets",
            "import { Base } from './base';\n\
             class Child extends Base {}\n\
             export function main() { const c = new Child(); return c.greet(); }",
        );
        let graph = BuildCallGraphUseCase::new(CallGraphBuilder::default())
            .execute(vec![app, base])
            .unwrap();
        let callees: Vec<String> = graph
            .callees("@app.ets: main")
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            callees,
            vec![
                "@app.ets: Child.constructor".to_string(),
                "@base.ets: Base.greet".to_string()
            ]
        );
        assert_eq!(graph.exported(), &["@app.ets: main".to_string(), "@base.ets: Base".to_string()]);
    }
}
