//! Linear body builder
//!
//! Appends statements, allocates temporaries and labels, and tracks trap
//! segments. After an unconditional transfer the builder is unreachable and
//! drops statements until a label that something jumps to is bound.

use crate::features::ir_generation::domain::{
    Condition, IrBody, IrStmt, Label, Operand, Place, Rvalue, Trap,
};
use crate::shared::models::Span;

#[derive(Debug, Clone, Copy)]
struct OpenTrap {
    handler: Label,
    start: usize,
}

#[derive(Debug, Default)]
pub(super) struct BodyBuilder {
    stmts: Vec<IrStmt>,
    spans: Vec<Span>,
    labels: Vec<Option<usize>>,
    referenced: Vec<bool>,
    traps: Vec<Trap>,
    open: Vec<OpenTrap>,
    temps: u32,
    reachable: bool,
    span: Span,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    #[cfg(feature = "trace")]
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn temp(&mut self) -> u32 {
        let n = self.temps;
        self.temps += 1;
        n
    }

    pub fn label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        self.referenced.push(false);
        label
    }

    /// Bind `label` to the next statement
    pub fn bind(&mut self, label: Label) {
        let idx = label.0 as usize;
        self.labels[idx] = Some(self.stmts.len());
        if self.referenced[idx] {
            self.reachable = true;
        }
    }

    pub fn is_referenced(&self, label: Label) -> bool {
        self.referenced[label.0 as usize]
    }

    fn reference(&mut self, label: Label) {
        self.referenced[label.0 as usize] = true;
    }

    pub fn emit(&mut self, stmt: IrStmt) {
        if !self.reachable {
            return;
        }
        for target in stmt.targets() {
            self.reference(target);
        }
        if stmt.is_unconditional_transfer() {
            self.reachable = false;
        }
        self.stmts.push(stmt);
        self.spans.push(self.span);
    }

    pub fn assign(&mut self, place: Place, value: Rvalue) {
        self.emit(IrStmt::Assign { place, value });
    }

    /// Evaluate `value` into a fresh temporary
    pub fn to_temp(&mut self, value: Rvalue) -> Operand {
        if let Rvalue::Use(op) = value {
            return op;
        }
        let t = self.temp();
        self.assign(Place::Temp(t), value);
        Operand::Temp(t)
    }

    pub fn goto(&mut self, target: Label) {
        self.emit(IrStmt::Goto(target));
    }

    pub fn branch(&mut self, cond: Condition, then_to: Label, else_to: Label) {
        self.emit(IrStmt::If {
            cond,
            then_to,
            else_to,
        });
    }

    // ── traps ──────────────────────────────────────────────────────────────

    /// Protect the following statements; an empty region leaves `handler` unreferenced
    pub fn open_trap(&mut self, handler: Label) {
        self.open.push(OpenTrap {
            handler,
            start: self.stmts.len(),
        });
    }

    pub fn close_trap(&mut self) {
        if let Some(open) = self.open.pop() {
            self.push_segment(open);
        }
    }

    pub fn open_trap_depth(&self) -> usize {
        self.open.len()
    }

    /// Close traps above `depth`; returns their handlers for [`resume_traps`]
    ///
    /// [`resume_traps`]: Self::resume_traps
    pub fn suspend_traps(&mut self, depth: usize) -> Vec<Label> {
        let mut suspended = Vec::new();
        while self.open.len() > depth {
            if let Some(open) = self.open.pop() {
                suspended.push(open.handler);
                self.push_segment(open);
            }
        }
        suspended.reverse();
        suspended
    }

    pub fn resume_traps(&mut self, handlers: Vec<Label>) {
        let start = self.stmts.len();
        self.open
            .extend(handlers.into_iter().map(|handler| OpenTrap { handler, start }));
    }

    fn push_segment(&mut self, open: OpenTrap) {
        let end = self.stmts.len();
        if end > open.start {
            self.reference(open.handler);
            self.traps.push(Trap {
                start: open.start,
                end,
                handler: open.handler,
            });
        }
    }

    /// Finish the body, appending the implicit `return` when reachable
    pub fn finish(mut self) -> IrBody {
        while !self.open.is_empty() {
            self.close_trap();
        }
        if self.reachable || self.stmts.is_empty() {
            self.reachable = true;
            self.emit(IrStmt::Return(None));
        }
        let last = self.stmts.len().saturating_sub(1);
        IrBody {
            stmts: self.stmts,
            spans: self.spans,
            labels: self
                .labels
                .into_iter()
                .map(|at| at.unwrap_or(last).min(last))
                .collect(),
            traps: self.traps,
            temps: self.temps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_statements_are_dropped() {
        let mut b = BodyBuilder::new();
        b.emit(IrStmt::Return(None));
        b.assign(Place::Local("x".into()), Rvalue::Use(Operand::number(1)));
        let body = b.finish();
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_referenced_label_restores_reachability() {
        let mut b = BodyBuilder::new();
        let end = b.label();
        b.goto(end);
        b.assign(Place::Local("dead".into()), Rvalue::Use(Operand::number(0)));
        b.bind(end);
        let body = b.finish();
        assert_eq!(body.stmts.len(), 2);
        assert_eq!(body.target(end), Some(1));
    }

    #[test]
    fn test_suspended_trap_splits_segments() {
        let mut b = BodyBuilder::new();
        let handler = b.label();
        b.open_trap(handler);
        b.assign(Place::Local("a".into()), Rvalue::Use(Operand::number(1)));
        let suspended = b.suspend_traps(0);
        b.assign(Place::Local("f".into()), Rvalue::Use(Operand::number(2)));
        b.resume_traps(suspended);
        b.assign(Place::Local("b".into()), Rvalue::Use(Operand::number(3)));
        b.close_trap();
        let body = b.finish();
        let ranges: Vec<_> = body.traps.iter().map(|t| (t.start, t.end)).collect();
        assert_eq!(ranges, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_empty_trap_leaves_handler_unreferenced() {
        let mut b = BodyBuilder::new();
        let handler = b.label();
        b.open_trap(handler);
        b.close_trap();
        assert!(!b.is_referenced(handler));
        let body = b.finish();
        assert!(body.traps.is_empty());
    }
}
