//! Keep-path ports

use crate::features::call_graph::CallGraph;
use crate::features::keep_path::domain::KeepReport;
use crate::shared::models::Result;

/// Reachability over a frozen call graph
pub trait ReachabilityAnalyzer: Send + Sync {
    /// Mark everything reachable from `roots`; roots absent from the graph
    /// are reported in [`KeepReport::missing_roots`]
    fn analyze(&self, graph: &CallGraph, roots: &[String]) -> Result<KeepReport>;
}
