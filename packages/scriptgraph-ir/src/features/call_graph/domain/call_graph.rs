//! Frozen whole-program call graph
//!
//! Produced by `CallGraphBuilder::freeze`; read-only afterwards. Node 0 is
//! always the shared unknown sink.

use rustc_hash::FxHashMap;

use super::node::{CallNode, CallTriple, EdgeInfo, UNKNOWN_NODE};
use crate::shared::graph::{GraphError, IdGraph, NodeId};
use crate::shared::models::{DeclId, Diagnostics};

#[derive(Debug, Clone)]
pub struct CallGraph {
    /// Calls and dependency edges
    pub(crate) graph: IdGraph<CallNode>,
    /// Same node ids, call edges only
    pub(crate) calls: IdGraph<CallNode>,
    pub(crate) edges: FxHashMap<(NodeId, NodeId), EdgeInfo>,
    /// Declarations exported by any unit
    pub(crate) exported: Vec<DeclId>,
    pub(crate) files: Vec<String>,
    /// Call sites naming a target that is not in the program
    pub(crate) diagnostics: Diagnostics,
}

impl CallGraph {
    pub fn unknown(&self) -> NodeId {
        NodeId(0)
    }

    pub fn graph(&self) -> &IdGraph<CallNode> {
        &self.graph
    }

    pub fn call_edges(&self) -> &IdGraph<CallNode> {
        &self.calls
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn exported(&self) -> &[DeclId] {
        &self.exported
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Node of a function or class declaration
    pub fn node_id(&self, decl: &str) -> Result<NodeId, GraphError> {
        let function = CallNode::Function(decl.to_string());
        if let Ok(id) = self.graph.get_id(&function) {
            return Ok(id);
        }
        self.graph.get_id(&CallNode::Class(decl.to_string()))
    }

    pub fn contains(&self, decl: &str) -> bool {
        self.node_id(decl).is_ok()
    }

    pub fn node(&self, id: NodeId) -> Result<&CallNode, GraphError> {
        self.graph.get_node(id)
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&EdgeInfo> {
        self.edges.get(&(from, to))
    }

    /// Every declaration node (the sink excluded) in id order
    pub fn declarations(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.graph
            .node_ids()
            .zip(self.graph.nodes())
            .filter_map(|(id, node)| node.decl_id().map(|d| (id, d)))
    }

    /// Direct call targets of `decl`, unknown sink included
    pub fn callees(&self, decl: &str) -> Result<Vec<&CallNode>, GraphError> {
        let id = self.node_id(decl)?;
        self.calls.succ(id).iter().map(|&n| self.node(n)).collect()
    }

    pub fn callers(&self, decl: &str) -> Result<Vec<&CallNode>, GraphError> {
        let id = self.node_id(decl)?;
        self.calls.pred(id).iter().map(|&n| self.node(n)).collect()
    }

    /// Whether any call site of `decl` could not be resolved
    pub fn calls_unknown(&self, decl: &str) -> bool {
        self.node_id(decl)
            .map(|id| self.calls.contains_edge(id, self.unknown()))
            .unwrap_or(false)
    }

    /// One triple per call site, grouped by caller in node order
    pub fn triples(&self) -> Vec<CallTriple> {
        let mut triples = Vec::new();
        for (from, to) in self.calls.edges() {
            let (Ok(caller), Ok(callee)) = (self.node(from), self.node(to)) else {
                continue;
            };
            let Some(info) = self.edges.get(&(from, to)) else {
                continue;
            };
            for site in &info.call_sites {
                triples.push(CallTriple {
                    caller: caller.to_string(),
                    callee: callee.to_string(),
                    call_site: site.clone(),
                });
            }
        }
        triples
    }

    pub fn call_site_count(&self) -> usize {
        self.edges.values().map(|e| e.call_sites.len()).sum()
    }

    /// Mutually (or self) recursive function groups
    pub fn recursion_groups(&self) -> Vec<Vec<DeclId>> {
        self.calls
            .cycles()
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter_map(|id| self.calls.get_node(id).ok())
                    .map(|node| node.decl_id().unwrap_or(UNKNOWN_NODE).to_string())
                    .collect()
            })
            .collect()
    }
}
