//! ID-indexed directed graph
//!
//! Nodes live in an arena (`Vec<N>`) and are addressed by dense [`NodeId`]s.
//! Cycles (loops, recursion) are ordinary data: edges are pairs of ids, never
//! references, so traversals carry explicit visited sets.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Dense node identifier, unique within one graph and never reused
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup failures. Always a contract violation on the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node id {0} not found in graph")]
    UnknownId(usize),

    #[error("node {0} not found in graph")]
    UnknownNode(String),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Generic directed graph with a bijective node ↔ id mapping
///
/// Successor and predecessor lists keep insertion order; consumers rely on
/// it (a conditional branch stores its true edge first).
#[derive(Debug, Clone)]
pub struct IdGraph<N> {
    nodes: Vec<N>,
    ids: FxHashMap<N, NodeId>,
    succ: FxHashMap<NodeId, Vec<NodeId>>,
    pred: FxHashMap<NodeId, Vec<NodeId>>,
    edge_count: usize,
}

impl<N> Default for IdGraph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            ids: FxHashMap::default(),
            succ: FxHashMap::default(),
            pred: FxHashMap::default(),
            edge_count: 0,
        }
    }
}

impl<N> IdGraph<N>
where
    N: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut ids = FxHashMap::default();
        ids.reserve(capacity);
        Self {
            nodes: Vec::with_capacity(capacity),
            ids,
            ..Self::default()
        }
    }

    /// Insert a node and return its id
    ///
    /// Inserting a node that is already present returns the existing id, so
    /// the node ↔ id mapping stays bijective.
    pub fn add_node(&mut self, node: N) -> NodeId {
        if let Some(&id) = self.ids.get(&node) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.ids.insert(node.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn get_node(&self, id: NodeId) -> GraphResult<&N> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownId(id.0))
    }

    pub fn get_id(&self, node: &N) -> GraphResult<NodeId> {
        self.ids
            .get(node)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(format!("{:?}", node)))
    }

    pub fn contains(&self, node: &N) -> bool {
        self.ids.contains_key(node)
    }

    pub fn contains_id(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Add edge `from → to`
    ///
    /// Both endpoints are checked before anything is written, so a failed
    /// call leaves no half-edge behind. Returns `false` when the edge
    /// already existed.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> GraphResult<bool> {
        if !self.contains_id(from) {
            return Err(GraphError::UnknownId(from.0));
        }
        if !self.contains_id(to) {
            return Err(GraphError::UnknownId(to.0));
        }
        if self.contains_edge(from, to) {
            return Ok(false);
        }
        self.succ.entry(from).or_default().push(to);
        self.pred.entry(to).or_default().push(from);
        self.edge_count += 1;
        Ok(true)
    }

    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.succ
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    /// Successors in insertion order (empty when the id is unknown)
    pub fn succ(&self, id: NodeId) -> &[NodeId] {
        self.succ.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Predecessors in insertion order (empty when the id is unknown)
    pub fn pred(&self, id: NodeId) -> &[NodeId] {
        self.pred.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lazy, restartable iteration over all nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// All edges, grouped by source id, in insertion order per source
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.node_ids()
            .flat_map(move |from| self.succ(from).iter().map(move |&to| (from, to)))
    }

    /// Nodes without predecessors
    pub fn roots(&self) -> Vec<NodeId> {
        self.node_ids().filter(|&id| self.pred(id).is_empty()).collect()
    }
}
