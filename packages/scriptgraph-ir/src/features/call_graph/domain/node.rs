//! Call-graph nodes and edges

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::ir_generation::domain::RefKind;
use crate::shared::models::DeclId;

/// Name of the shared sink in triples and keep markers
pub const UNKNOWN_NODE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CallNode {
    /// Every unresolvable target
    Unknown,
    Function(DeclId),
    Class(DeclId),
}

impl CallNode {
    pub fn decl_id(&self) -> Option<&str> {
        match self {
            CallNode::Function(id) | CallNode::Class(id) => Some(id),
            CallNode::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CallNode::Unknown)
    }
}

impl fmt::Display for CallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.decl_id().unwrap_or(UNKNOWN_NODE))
    }
}

/// Everything recorded for one `(from, to)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Call-site ids in merge order
    pub call_sites: Vec<String>,
    /// Non-call dependency kinds, deduplicated
    pub refs: Vec<RefKind>,
}

impl EdgeInfo {
    pub fn is_call(&self) -> bool {
        !self.call_sites.is_empty()
    }

    pub(crate) fn add_ref(&mut self, kind: RefKind) {
        if !self.refs.contains(&kind) {
            self.refs.push(kind);
        }
    }
}

/// `(caller, callee | "unknown", call site)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallTriple {
    pub caller: DeclId,
    pub callee: String,
    pub call_site: String,
}
