use tracing::{info, warn};

use crate::features::call_graph::CallGraph;
use crate::features::keep_path::domain::KeepReport;
use crate::features::keep_path::ports::ReachabilityAnalyzer;
use crate::shared::models::Result;

pub struct AnalyzeKeepPathUseCase<A: ReachabilityAnalyzer> {
    analyzer: A,
}

impl<A: ReachabilityAnalyzer> AnalyzeKeepPathUseCase<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    pub fn execute(&self, graph: &CallGraph, roots: &[String]) -> Result<KeepReport> {
        let report = self.analyzer.analyze(graph, roots)?;
        for root in &report.missing_roots {
            warn!(root = %root, "Keep root not found in call graph");
        }
        info!(
            roots = report.roots.len(),
            kept = report.markers.kept_count(),
            declarations = report.markers.len(),
            "Keep-path analysis done"
        );
        Ok(report)
    }
}
