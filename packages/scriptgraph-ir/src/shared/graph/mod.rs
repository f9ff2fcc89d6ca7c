//! Graph substrate
//!
//! Every graph-shaped artifact (CFGs, the call graph) is an [`IdGraph`].

mod id_graph;
mod traversal;

pub use id_graph::{GraphError, GraphResult, IdGraph, NodeId};
