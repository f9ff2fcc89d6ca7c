//! Leader-based CFG construction
//!
//! Leaders: the first statement, every jump target, the statement after
//! each terminator, both boundaries of every trap and every handler start.
//! Each block then gets its normal successors (`[then, else]` for a
//! branch, the target of a jump, the next block on fall-through) followed
//! by an exception edge to the innermost handler protecting it.
//!
//! Blocks are never merged: a label that starts a block keeps it even when
//! it has a single predecessor. When the first statement is itself a jump
//! target (a function opening with a loop) an empty entry block precedes
//! it, so block 0 never has predecessors.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::CfgConfig;
use crate::features::flow_graph::domain::{BasicBlock, BlockKind, Cfg};
use crate::features::flow_graph::ports::FlowAnalyzer;
use crate::features::ir_generation::domain::{IrBody, IrFunction, IrStmt, Label};
use crate::shared::graph::{IdGraph, NodeId};
use crate::shared::models::{Result, ScriptGraphError};

#[derive(Debug, Clone, Default)]
pub struct CfgBuilder {
    config: CfgConfig,
}

impl CfgBuilder {
    pub fn new(config: CfgConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CfgConfig {
        &self.config
    }

    pub fn build(&self, function: &IrFunction) -> Result<Cfg> {
        let body = &function.body;
        let target = |label: Label| -> Result<usize> {
            body.target(label)
                .filter(|&at| at < body.len())
                .ok_or_else(|| {
                    ScriptGraphError::flow_graph(format!("{} of {} has no target", label, function.id))
                })
        };

        if body.is_empty() {
            return Ok(single_block(function));
        }

        let starts = leaders(body, &target)?;
        // Block ids of statement runs start at 1 behind a synthetic entry
        let shift = usize::from(jumps_to_start(body, &target)?);
        let mut block_of = vec![0usize; body.len()];
        for (b, &start) in starts.iter().enumerate() {
            let end = starts.get(b + 1).copied().unwrap_or(body.len());
            block_of[start..end].fill(b + shift);
        }

        let count = starts.len() + shift;
        let mut graph: IdGraph<usize> = IdGraph::with_capacity(count);
        for b in 0..count {
            graph.add_node(b);
        }
        if shift == 1 {
            graph.add_edge(NodeId(0), NodeId(1))?;
        }

        let mut handlers = FxHashSet::default();
        for (b, &start) in starts.iter().enumerate() {
            let end = starts.get(b + 1).copied().unwrap_or(body.len());
            let from = NodeId(b + shift);
            match &body.stmts[end - 1] {
                IrStmt::If {
                    then_to, else_to, ..
                } => {
                    graph.add_edge(from, NodeId(block_of[target(*then_to)?]))?;
                    graph.add_edge(from, NodeId(block_of[target(*else_to)?]))?;
                }
                IrStmt::Goto(to) => {
                    graph.add_edge(from, NodeId(block_of[target(*to)?]))?;
                }
                IrStmt::Return(_) | IrStmt::Throw(_) => {}
                _ => {
                    if b + 1 < starts.len() {
                        graph.add_edge(from, NodeId(b + shift + 1))?;
                    }
                }
            }
            if let Some(handler) = body.handlers_of(start).next() {
                let handler = block_of[target(handler)?];
                handlers.insert(handler);
                if self.config.exception_edges {
                    graph.add_edge(from, NodeId(handler))?;
                }
            }
        }

        let mut loop_headers = FxHashSet::default();
        for (from, to) in graph.edges() {
            if to.index() <= from.index() && !handlers.contains(&to.index()) {
                loop_headers.insert(to.index());
            }
        }

        let ranges = (shift == 1)
            .then_some((0, 0))
            .into_iter()
            .chain(starts.iter().enumerate().map(|(b, &start)| {
                (start, starts.get(b + 1).copied().unwrap_or(body.len()))
            }));
        let blocks: Vec<BasicBlock> = ranges
            .enumerate()
            .map(|(b, (start, end))| {
                let id = NodeId(b);
                let succs: Vec<usize> = graph.succ(id).iter().map(|n| n.index()).collect();
                let kind = if b == 0 {
                    BlockKind::Entry
                } else if handlers.contains(&b) {
                    BlockKind::Handler
                } else if loop_headers.contains(&b) {
                    BlockKind::LoopHeader
                } else if succs.is_empty() {
                    BlockKind::Exit
                } else {
                    BlockKind::Body
                };
                BasicBlock {
                    id: b,
                    kind,
                    first_stmt: start,
                    stmts: body.stmts[start..end].to_vec(),
                    preds: graph.pred(id).iter().map(|n| n.index()).collect(),
                    succs,
                }
            })
            .collect();

        let label_blocks = body
            .labels
            .iter()
            .map(|&at| block_of[at.min(body.len() - 1)])
            .collect();

        debug!(
            function = %function.id,
            blocks = blocks.len(),
            edges = graph.edge_count(),
            "Built CFG"
        );
        Ok(Cfg {
            function: function.id.clone(),
            blocks,
            graph,
            label_blocks,
        })
    }
}

impl FlowAnalyzer for CfgBuilder {
    fn build_cfg(&self, function: &IrFunction) -> Result<Cfg> {
        self.build(function)
    }

    fn fingerprints(&self) -> bool {
        self.config.fingerprint
    }
}

/// Sorted, deduplicated block start indices
fn leaders<F>(body: &IrBody, target: &F) -> Result<Vec<usize>>
where
    F: Fn(Label) -> Result<usize>,
{
    let n = body.len();
    let mut is_leader = vec![false; n];
    is_leader[0] = true;
    for (i, stmt) in body.stmts.iter().enumerate() {
        for label in stmt.targets() {
            is_leader[target(label)?] = true;
        }
        if stmt.is_terminator() && i + 1 < n {
            is_leader[i + 1] = true;
        }
    }
    for trap in &body.traps {
        if trap.start < n {
            is_leader[trap.start] = true;
        }
        if trap.end < n {
            is_leader[trap.end] = true;
        }
        is_leader[target(trap.handler)?] = true;
    }
    Ok(is_leader
        .iter()
        .enumerate()
        .filter_map(|(i, &l)| l.then_some(i))
        .collect())
}

/// Whether any jump lands on the first statement
fn jumps_to_start<F>(body: &IrBody, target: &F) -> Result<bool>
where
    F: Fn(Label) -> Result<usize>,
{
    for label in body.stmts.iter().flat_map(IrStmt::targets) {
        if target(label)? == 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// CFG of a function without statements
fn single_block(function: &IrFunction) -> Cfg {
    let mut graph = IdGraph::new();
    graph.add_node(0usize);
    Cfg {
        function: function.id.clone(),
        blocks: vec![BasicBlock {
            id: 0,
            kind: BlockKind::Entry,
            first_stmt: 0,
            stmts: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
        }],
        graph,
        label_blocks: Vec::new(),
    }
}
