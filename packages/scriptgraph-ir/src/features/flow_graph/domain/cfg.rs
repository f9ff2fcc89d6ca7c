//! Per-function control-flow graph

use rustc_hash::FxHashSet;

use super::block::{BasicBlock, BlockKind};
use super::snapshot::{BlockSnapshot, CfgSnapshot};
use crate::features::ir_generation::domain::{IrStmt, Label};
use crate::shared::graph::{IdGraph, NodeId};
use crate::shared::models::DeclId;

/// Immutable CFG of one function
///
/// Block `i` is node `i` of the underlying [`IdGraph`]; block 0 is the
/// only entry.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub(crate) function: DeclId,
    pub(crate) blocks: Vec<BasicBlock>,
    pub(crate) graph: IdGraph<usize>,
    /// Block each body label lands in
    pub(crate) label_blocks: Vec<usize>,
}

impl Cfg {
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn entry(&self) -> &BasicBlock {
        &self.blocks[0]
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: usize) -> Option<&BasicBlock> {
        self.blocks.get(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn graph(&self) -> &IdGraph<usize> {
        &self.graph
    }

    pub fn exits(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.blocks.iter().filter(|b| b.is_exit())
    }

    pub fn loop_headers(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.blocks.iter().filter(|b| b.kind == BlockKind::LoopHeader)
    }

    /// Block holding body statement `index`
    pub fn block_of_stmt(&self, index: usize) -> Option<&BasicBlock> {
        let pos = self
            .blocks
            .partition_point(|b| b.first_stmt <= index)
            .checked_sub(1)?;
        let block = &self.blocks[pos];
        block.stmt_range().contains(&index).then_some(block)
    }

    pub fn label_block(&self, label: Label) -> Option<usize> {
        self.label_blocks.get(label.0 as usize).copied()
    }

    /// Blocks not reachable from the entry
    pub fn unreachable_blocks(&self) -> Vec<usize> {
        let reached: FxHashSet<NodeId> = self
            .graph
            .reachable_from(&[NodeId(0)])
            .unwrap_or_default();
        (0..self.blocks.len())
            .filter(|&b| !reached.contains(&NodeId(b)))
            .collect()
    }

    /// Statement text with jump targets named by block
    pub fn render_stmt(&self, stmt: &IrStmt) -> String {
        let block = |label: &Label| match self.label_block(*label) {
            Some(b) => format!("B{}", b),
            None => label.to_string(),
        };
        match stmt {
            IrStmt::If {
                cond,
                then_to,
                else_to,
            } => format!("if {} goto {} else {}", cond, block(then_to), block(else_to)),
            IrStmt::Goto(target) => format!("goto {}", block(target)),
            other => other.to_string(),
        }
    }

    pub fn snapshot(&self, fingerprint: bool) -> CfgSnapshot {
        let snapshot = CfgSnapshot {
            function: self.function.clone(),
            blocks: self
                .blocks
                .iter()
                .map(|b| BlockSnapshot {
                    id: b.id,
                    kind: b.kind,
                    stmts: b.stmts.iter().map(|s| self.render_stmt(s)).collect(),
                    preds: b.preds.clone(),
                    succs: b.succs.clone(),
                })
                .collect(),
            fingerprint: None,
        };
        if fingerprint {
            snapshot.with_fingerprint()
        } else {
            snapshot
        }
    }
}
