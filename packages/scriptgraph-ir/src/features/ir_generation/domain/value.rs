//! IR values
//!
//! Operands are what statements read, places are what they write and
//! rvalues are the right-hand sides of assignments. Display impls produce
//! the textual statement form used by CFG snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::callee::{Call, DeclRef};
use crate::features::closure_resolution::EnvRef;
use crate::features::parsing::domain::{BinaryOp, Literal, UnaryOp};
use crate::shared::models::DeclId;

/// Unknown receiver / member / type placeholder
pub const UNKNOWN: &str = "%unk";

/// Environment link field
pub const PARENT_FIELD: &str = "%parent";

/// Environment received by a capturing function
pub const CLOSURES_LOCAL: &str = "%closures";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// Temporary `%n`; merge temps are assigned once per incoming path
    Temp(u32),
    /// Named local, parameter or environment (`x`, `x%1`, `%env0`)
    Local(String),
    This,
    /// Module-level binding or unresolved free name
    Global(String),
    Const(Literal),
    Unknown,
}

impl Operand {
    pub fn local(name: impl Into<String>) -> Self {
        Operand::Local(name.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Operand::Const(Literal::String(s.into()))
    }

    pub fn number(n: impl ToString) -> Self {
        Operand::Const(Literal::Number(n.to_string()))
    }

    pub fn bool(b: bool) -> Self {
        Operand::Const(Literal::Bool(b))
    }

    pub fn undefined() -> Self {
        Operand::Const(Literal::Undefined)
    }

    pub fn as_temp(&self) -> Option<u32> {
        match self {
            Operand::Temp(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(n) => write!(f, "%{}", n),
            Operand::Local(name) | Operand::Global(name) => f.write_str(name),
            Operand::This => f.write_str("this"),
            Operand::Const(lit) => write_literal(f, lit),
            Operand::Unknown => f.write_str(UNKNOWN),
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, lit: &Literal) -> fmt::Result {
    match lit {
        Literal::Number(n) => f.write_str(n),
        Literal::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
        Literal::Bool(b) => write!(f, "{}", b),
        Literal::Null => f.write_str("null"),
        Literal::Undefined => f.write_str("undefined"),
        Literal::Regex(r) => f.write_str(r),
    }
}

/// Assignment target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Place {
    Temp(u32),
    Local(String),
    Global(String),
    Field { base: Operand, field: String },
    Index { base: Operand, index: Operand },
}

impl Place {
    /// The same location read back as an operand, when it is a plain value
    pub fn as_operand(&self) -> Option<Operand> {
        match self {
            Place::Temp(n) => Some(Operand::Temp(*n)),
            Place::Local(name) => Some(Operand::Local(name.clone())),
            Place::Global(name) => Some(Operand::Global(name.clone())),
            Place::Field { .. } | Place::Index { .. } => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Temp(n) => write!(f, "%{}", n),
            Place::Local(name) | Place::Global(name) => f.write_str(name),
            Place::Field { base, field } => write!(f, "{}.{}", base, field),
            Place::Index { base, index } => write!(f, "{}[{}]", base, index),
        }
    }
}

/// Environment reference used when creating closures and environments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvOperand {
    Local(String),
    Closures,
}

impl fmt::Display for EnvOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvOperand::Local(name) => f.write_str(name),
            EnvOperand::Closures => f.write_str(CLOSURES_LOCAL),
        }
    }
}

impl From<EnvRef> for EnvOperand {
    fn from(env: EnvRef) -> Self {
        match env {
            EnvRef::Local(name) => EnvOperand::Local(name),
            EnvRef::Closures => EnvOperand::Closures,
        }
    }
}

fn write_env(f: &mut fmt::Formatter<'_>, env: &Option<EnvOperand>) -> fmt::Result {
    match env {
        Some(env) => write!(f, "({})", env),
        None => f.write_str("()"),
    }
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rvalue {
    Use(Operand),
    Binary {
        op: BinaryOp,
        left: Operand,
        right: Operand,
    },
    Unary {
        op: UnaryOp,
        arg: Operand,
    },
    Field {
        base: Operand,
        field: String,
    },
    Index {
        base: Operand,
        index: Operand,
    },
    /// `delete base.field`
    DeleteField {
        base: Operand,
        field: String,
    },
    Call(Call),
    /// Object allocation; the constructor runs as a separate call
    New(DeclRef),
    NewArray(usize),
    NewObject,
    /// Function value bound to an environment
    Closure {
        function: DeclId,
        env: Option<EnvOperand>,
    },
    /// Class value; methods receive `env` as their `%closures`
    Class {
        class: DeclId,
        env: Option<EnvOperand>,
    },
    /// Fresh environment linked to `parent`
    NewEnv(Option<EnvOperand>),
    Parameter(usize),
    CaughtException,
    Await(Operand),
    Yield {
        arg: Operand,
        delegate: bool,
    },
    Spread(Operand),
}

impl fmt::Display for Rvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rvalue::Use(op) => write!(f, "{}", op),
            Rvalue::Binary { op, left, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            Rvalue::Unary { op, arg } => write!(f, "{}{}", op.as_str(), arg),
            Rvalue::Field { base, field } => write!(f, "{}.{}", base, field),
            Rvalue::Index { base, index } => write!(f, "{}[{}]", base, index),
            Rvalue::DeleteField { base, field } => write!(f, "delete {}.{}", base, field),
            Rvalue::Call(call) => write!(f, "{}", call),
            Rvalue::New(class) => write!(f, "new {}", class),
            Rvalue::NewArray(len) => write!(f, "newarray [{}]", len),
            Rvalue::NewObject => f.write_str("newobject"),
            Rvalue::Closure { function, env } => {
                write!(f, "closure <{}>", function)?;
                write_env(f, env)
            }
            Rvalue::Class { class, env } => {
                write!(f, "class <{}>", class)?;
                write_env(f, env)
            }
            Rvalue::NewEnv(parent) => {
                f.write_str("newenv")?;
                write_env(f, parent)
            }
            Rvalue::Parameter(n) => write!(f, "parameter{}", n),
            Rvalue::CaughtException => f.write_str("caughtexception"),
            Rvalue::Await(op) => write!(f, "await {}", op),
            Rvalue::Yield { arg, delegate } => {
                write!(f, "{} {}", if *delegate { "yield*" } else { "yield" }, arg)
            }
            Rvalue::Spread(op) => write!(f, "...{}", op),
        }
    }
}

/// Branch condition: always a comparison so both edges are explicit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub op: BinaryOp,
    pub left: Operand,
    pub right: Operand,
}

impl Condition {
    /// `value != false`
    pub fn truthy(value: Operand) -> Self {
        Self {
            op: BinaryOp::NotEq,
            left: value,
            right: Operand::bool(false),
        }
    }

    /// `value == false`
    pub fn falsy(value: Operand) -> Self {
        Self {
            op: BinaryOp::Eq,
            left: value,
            right: Operand::bool(false),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.as_str(), self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_display() {
        assert_eq!(Operand::Temp(3).to_string(), "%3");
        assert_eq!(Operand::string("it's").to_string(), "'it\\'s'");
        assert_eq!(Operand::Unknown.to_string(), "%unk");
        assert_eq!(Operand::This.to_string(), "this");
    }

    #[test]
    fn test_rvalue_display() {
        let closure = Rvalue::Closure {
            function: "@a.ets: f.%AM0$f".to_string(),
            env: Some(EnvOperand::Local("%env0".to_string())),
        };
        assert_eq!(closure.to_string(), "closure <@a.ets: f.%AM0$f>(%env0)");
        assert_eq!(Rvalue::NewEnv(None).to_string(), "newenv()");
        assert_eq!(
            Rvalue::Unary {
                op: UnaryOp::TypeOf,
                arg: Operand::local("x")
            }
            .to_string(),
            "typeof x"
        );
        assert_eq!(Condition::falsy(Operand::Temp(2)).to_string(), "%2 == false");
    }
}
