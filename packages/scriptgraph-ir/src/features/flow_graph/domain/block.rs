//! Basic block model

use serde::{Deserialize, Serialize};

use crate::features::ir_generation::domain::IrStmt;

/// Role of a block in its function's control flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Entry,
    /// Target of a back-edge
    LoopHeader,
    /// Start of an exception handler
    Handler,
    /// No successors (return or uncaught throw)
    Exit,
    Body,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Entry => "entry",
            BlockKind::LoopHeader => "loop_header",
            BlockKind::Handler => "handler",
            BlockKind::Exit => "exit",
            BlockKind::Body => "body",
        }
    }
}

/// Maximal straight-line statement run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: usize,
    pub kind: BlockKind,
    /// Index of the first statement in the function body
    pub first_stmt: usize,
    pub stmts: Vec<IrStmt>,
    pub preds: Vec<usize>,
    /// Normal successors first (true edge before false edge), then the handler
    pub succs: Vec<usize>,
}

impl BasicBlock {
    pub fn is_exit(&self) -> bool {
        self.succs.is_empty()
    }

    /// Body indices covered by this block
    pub fn stmt_range(&self) -> std::ops::Range<usize> {
        self.first_stmt..self.first_stmt + self.stmts.len()
    }

    pub fn terminator(&self) -> Option<&IrStmt> {
        self.stmts.last().filter(|s| s.is_terminator())
    }
}
