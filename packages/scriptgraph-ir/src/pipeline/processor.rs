//! Single-unit processing
//!
//! Pure with respect to other units: nothing here touches shared state, so
//! any number of units can run at once.

use crate::features::call_graph::UnitFragment;
use crate::features::flow_graph::application::FlowGraphResult;
use crate::features::flow_graph::{BuildFlowGraphsUseCase, FlowAnalyzer};
use crate::features::ir_generation::domain::IrModule;
use crate::features::ir_generation::{GenerateIrUseCase, IrGenerator};
use crate::features::parsing::domain::SourceUnit;
use crate::features::parsing::{ParseUnitUseCase, SourceParser};
use crate::shared::models::Result;

/// Everything one unit produces
#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub module: IrModule,
    /// `None` when the CFG stage is disabled
    pub flow: Option<FlowGraphResult>,
    pub fragment: UnitFragment,
}

pub struct UnitProcessor<P: SourceParser, G: IrGenerator, F: FlowAnalyzer> {
    parse: ParseUnitUseCase<P>,
    lower: GenerateIrUseCase<G>,
    flow: Option<BuildFlowGraphsUseCase<F>>,
}

impl<P: SourceParser, G: IrGenerator, F: FlowAnalyzer> UnitProcessor<P, G, F> {
    pub fn new(parser: P, generator: G, flow: Option<F>) -> Self {
        Self {
            parse: ParseUnitUseCase::new(parser),
            lower: GenerateIrUseCase::new(generator),
            flow: flow.map(BuildFlowGraphsUseCase::new),
        }
    }

    pub fn process_source(&self, source: &str, file_path: &str) -> Result<UnitOutput> {
        let unit = self.parse.execute(source, file_path)?;
        self.process_unit(&unit)
    }

    pub fn process_unit(&self, unit: &SourceUnit) -> Result<UnitOutput> {
        let module = self.lower.execute(unit)?;
        let flow = match &self.flow {
            Some(flow) => Some(flow.execute(&module)?),
            None => None,
        };
        let fragment = UnitFragment::from_module(&module);
        Ok(UnitOutput {
            module,
            flow,
            fragment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::CfgBuilder;
    use crate::features::ir_generation::AstLowerer;
    use crate::features::parsing::TypeScriptParser;

    fn processor(cfg: bool) -> UnitProcessor<TypeScriptParser, AstLowerer, CfgBuilder> {
        UnitProcessor::new(
            TypeScriptParser::new(),
            AstLowerer::default(),
            cfg.then(CfgBuilder::default),
        )
    }

    #[test]
    fn test_unit_output_lines_up() {
        let output = processor(true)
            .process_source("function f() { g(); }\nfunction g() {}\nf();", "a.ets")
            .unwrap();
        let flow = output.flow.unwrap();
        assert_eq!(flow.cfgs.len(), output.module.functions.len());
        assert_eq!(output.fragment.functions.len(), 3);
        assert_eq!(output.fragment.call_sites.len(), 2);
    }

    #[test]
    fn test_cfg_stage_can_be_skipped() {
        let output = processor(false).process_source("let x = 1;", "a.ets").unwrap();
        assert!(output.flow.is_none());
        assert_eq!(output.fragment.file_path, "a.ets");
    }
}
