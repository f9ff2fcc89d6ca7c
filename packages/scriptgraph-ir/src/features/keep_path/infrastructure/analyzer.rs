//! BFS keep-path analyzer

use tracing::debug;

use crate::config::KeepPathConfig;
use crate::features::call_graph::CallGraph;
use crate::features::keep_path::domain::{KeepMarkers, KeepReport};
use crate::features::keep_path::ports::ReachabilityAnalyzer;
use crate::shared::graph::NodeId;
use crate::shared::models::Result;

#[derive(Debug, Clone, Default)]
pub struct KeepPathAnalyzer {
    config: KeepPathConfig,
}

impl KeepPathAnalyzer {
    pub fn new(config: KeepPathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeepPathConfig {
        &self.config
    }
}

impl ReachabilityAnalyzer for KeepPathAnalyzer {
    fn analyze(&self, graph: &CallGraph, roots: &[String]) -> Result<KeepReport> {
        let mut requested: Vec<&str> = roots.iter().map(String::as_str).collect();
        if self.config.exports_as_roots {
            requested.extend(graph.exported().iter().map(String::as_str));
        }

        let mut start: Vec<NodeId> = Vec::with_capacity(requested.len());
        let mut used = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();
        for root in requested {
            match graph.node_id(root) {
                Ok(id) if !start.contains(&id) => {
                    start.push(id);
                    used.push(root.to_string());
                }
                Ok(_) => {}
                Err(_) => missing.push(root.to_string()),
            }
        }

        let edges = if self.config.follow_dependency_edges {
            graph.graph()
        } else {
            graph.call_edges()
        };
        let unknown = graph.unknown();
        let reached = edges.bfs_filtered(&start, |id| id != unknown)?;

        let mut markers = KeepMarkers::new();
        for (_, decl) in graph.declarations() {
            markers.set(decl, false);
        }
        let mut reaches_unknown = false;
        for id in reached {
            match graph.node(id)?.decl_id() {
                Some(decl) => markers.set(decl, true),
                None => reaches_unknown = true,
            }
        }

        debug!(
            roots = used.len(),
            missing = missing.len(),
            kept = markers.kept_count(),
            total = markers.len(),
            "Computed keep markers"
        );
        Ok(KeepReport {
            markers,
            roots: used,
            missing_roots: missing,
            reaches_unknown,
        })
    }
}
