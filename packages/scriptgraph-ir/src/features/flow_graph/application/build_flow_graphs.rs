use tracing::debug;

use crate::features::flow_graph::domain::{Cfg, CfgSnapshot};
use crate::features::flow_graph::ports::FlowAnalyzer;
use crate::features::ir_generation::domain::IrModule;
use crate::shared::models::Result;

/// CFGs of one module, in function order
#[derive(Debug, Clone)]
pub struct FlowGraphResult {
    pub cfgs: Vec<Cfg>,
    pub snapshots: Vec<CfgSnapshot>,
}

impl FlowGraphResult {
    pub fn cfg(&self, function: &str) -> Option<&Cfg> {
        self.cfgs.iter().find(|c| c.function() == function)
    }

    pub fn total_blocks(&self) -> usize {
        self.cfgs.iter().map(Cfg::len).sum()
    }
}

pub struct BuildFlowGraphsUseCase<A: FlowAnalyzer> {
    analyzer: A,
}

impl<A: FlowAnalyzer> BuildFlowGraphsUseCase<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    pub fn execute(&self, module: &IrModule) -> Result<FlowGraphResult> {
        let fingerprint = self.analyzer.fingerprints();
        let mut cfgs = Vec::with_capacity(module.functions.len());
        let mut snapshots = Vec::with_capacity(module.functions.len());
        for function in &module.functions {
            let cfg = self
                .analyzer
                .build_cfg(function)
                .map_err(|e| e.with_file(&module.file_path))?;
            snapshots.push(cfg.snapshot(fingerprint));
            cfgs.push(cfg);
        }
        let result = FlowGraphResult { cfgs, snapshots };
        debug!(
            file = %module.file_path,
            functions = result.cfgs.len(),
            blocks = result.total_blocks(),
            "Built flow graphs"
        );
        Ok(result)
    }
}
