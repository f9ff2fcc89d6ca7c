//! Call graph domain models

mod call_graph;
mod fragment;
mod node;

pub use call_graph::CallGraph;
pub use fragment::{CallSite, ClassEntry, FunctionEntry, UnitFragment};
pub use node::{CallNode, CallTriple, EdgeInfo, UNKNOWN_NODE};
