//! Pipeline results

use std::time::Duration;

use crate::features::call_graph::{CallGraph, CallTriple};
use crate::features::flow_graph::application::FlowGraphResult;
use crate::features::flow_graph::CfgSnapshot;
use crate::features::ir_generation::domain::IrModule;
use crate::features::keep_path::KeepReport;
use crate::shared::models::{Diagnostic, Diagnostics};

/// Per-unit output kept after aggregation
#[derive(Debug, Clone)]
pub struct UnitResult {
    pub file_path: String,
    pub module: IrModule,
    pub flow: Option<FlowGraphResult>,
}

impl UnitResult {
    pub fn snapshots(&self) -> &[CfgSnapshot] {
        self.flow.as_ref().map(|f| f.snapshots.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Successful units in input order
    pub units: Vec<UnitResult>,
    pub call_graph: Option<CallGraph>,
    pub keep: Option<KeepReport>,
    /// One `UnitFailed` entry per dropped unit
    pub failures: Diagnostics,
    pub elapsed: Duration,
}

impl AnalysisResult {
    pub fn unit(&self, file_path: &str) -> Option<&UnitResult> {
        self.units.iter().find(|u| u.file_path == file_path)
    }

    /// Per-unit diagnostics, then unresolved call targets, then unit failures
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.units
            .iter()
            .flat_map(|u| u.module.diagnostics.iter())
            .chain(self.call_graph.iter().flat_map(|g| g.diagnostics().iter()))
            .chain(self.failures.iter())
    }

    pub fn triples(&self) -> Vec<CallTriple> {
        self.call_graph
            .as_ref()
            .map(CallGraph::triples)
            .unwrap_or_default()
    }

    pub fn is_kept(&self, decl: &str) -> bool {
        self.keep.as_ref().is_some_and(|k| k.is_kept(decl))
    }
}
