//! IR statements and function bodies

use std::fmt;

use serde::{Deserialize, Serialize};

use super::callee::Call;
use super::value::{Condition, Operand, Place, Rvalue};
use crate::shared::models::Span;

/// Jump target, bound to a statement index once the body is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrStmt {
    /// Assignment to a temporary, local, field or element
    Assign { place: Place, value: Rvalue },
    /// Call evaluated for its effect only
    Invoke(Call),
    /// Conditional branch; `then_to` is the first successor
    If {
        cond: Condition,
        then_to: Label,
        else_to: Label,
    },
    Goto(Label),
    Return(Option<Operand>),
    Throw(Operand),
}

impl IrStmt {
    pub fn assign(place: Place, value: Rvalue) -> Self {
        IrStmt::Assign { place, value }
    }

    /// Ends a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            IrStmt::If { .. } | IrStmt::Goto(_) | IrStmt::Return(_) | IrStmt::Throw(_)
        )
    }

    /// Control never reaches the next statement
    pub fn is_unconditional_transfer(&self) -> bool {
        matches!(self, IrStmt::Goto(_) | IrStmt::Return(_) | IrStmt::Throw(_))
    }

    /// Explicit jump targets in successor order
    pub fn targets(&self) -> Vec<Label> {
        match self {
            IrStmt::If { then_to, else_to, .. } => vec![*then_to, *else_to],
            IrStmt::Goto(target) => vec![*target],
            _ => Vec::new(),
        }
    }

    /// Call performed by this statement, if any
    pub fn call(&self) -> Option<&Call> {
        match self {
            IrStmt::Invoke(call)
            | IrStmt::Assign {
                value: Rvalue::Call(call),
                ..
            } => Some(call),
            _ => None,
        }
    }
}

impl fmt::Display for IrStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrStmt::Assign { place, value } => write!(f, "{} = {}", place, value),
            IrStmt::Invoke(call) => write!(f, "{}", call),
            IrStmt::If { cond, .. } => write!(f, "if {}", cond),
            IrStmt::Goto(_) => f.write_str("goto"),
            IrStmt::Return(None) => f.write_str("return"),
            IrStmt::Return(Some(op)) => write!(f, "return {}", op),
            IrStmt::Throw(op) => write!(f, "throw {}", op),
        }
    }
}

/// Protected statement range `[start, end)` and its handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trap {
    pub start: usize,
    pub end: usize,
    pub handler: Label,
}

impl Trap {
    pub fn covers(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }
}

/// Linear statement list of one function
///
/// Traps are ordered innermost first for any statement they share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrBody {
    pub stmts: Vec<IrStmt>,
    pub spans: Vec<Span>,
    /// Statement index of each label
    pub labels: Vec<usize>,
    pub traps: Vec<Trap>,
    /// Number of temporaries allocated
    pub temps: u32,
}

impl IrBody {
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn target(&self, label: Label) -> Option<usize> {
        self.labels.get(label.0 as usize).copied()
    }

    /// Statements that perform a call, with their index
    pub fn call_sites(&self) -> impl Iterator<Item = (usize, &Call)> + '_ {
        self.stmts
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.call().map(|c| (i, c)))
    }

    /// Handlers protecting statement `index`, innermost first
    pub fn handlers_of(&self, index: usize) -> impl Iterator<Item = Label> + '_ {
        self.traps
            .iter()
            .filter(move |t| t.covers(index))
            .map(|t| t.handler)
    }
}

impl fmt::Display for IrBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.stmts.iter().enumerate() {
            for (label, _) in self.labels.iter().enumerate().filter(|(_, &at)| at == i) {
                writeln!(f, "{}:", Label(label as u32))?;
            }
            write!(f, "  {}", stmt)?;
            let targets = stmt.targets();
            if !targets.is_empty() {
                let names: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                write!(f, " -> {}", names.join(", "))?;
            }
            writeln!(f)?;
        }
        for trap in &self.traps {
            writeln!(f, "  trap [{}, {}) -> {}", trap.start, trap.end, trap.handler)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_targets_true_first() {
        let stmt = IrStmt::If {
            cond: Condition::truthy(Operand::local("c")),
            then_to: Label(3),
            else_to: Label(1),
        };
        assert_eq!(stmt.targets(), vec![Label(3), Label(1)]);
        assert!(stmt.is_terminator());
        assert!(!stmt.is_unconditional_transfer());
        assert_eq!(stmt.to_string(), "if c != false");
    }

    #[test]
    fn test_body_listing_shows_labels() {
        let body = IrBody {
            stmts: vec![IrStmt::Goto(Label(0)), IrStmt::Return(None)],
            spans: vec![Span::zero(); 2],
            labels: vec![1],
            traps: Vec::new(),
            temps: 0,
        };
        assert_eq!(body.to_string(), "  goto -> L0\nL0:\n  return\n");
    }
}
