//! Call forms and call targets

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{Operand, UNKNOWN};
use crate::shared::models::DeclId;

/// Reference to a class or function declaration
///
/// Named by `new`, `extends`, `instanceof`, annotations and value uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclRef {
    /// Declared in this unit
    Decl(DeclId),
    /// Imported from another module
    Imported { module: String, name: String },
    /// Unresolvable; keeps the source name for diagnostics
    Unknown(String),
}

impl DeclRef {
    pub fn is_unknown(&self) -> bool {
        matches!(self, DeclRef::Unknown(_))
    }
}

impl fmt::Display for DeclRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclRef::Decl(id) => write!(f, "<{}>", id),
            DeclRef::Imported { module, name } => write!(f, "<@import({}): {}>", module, name),
            DeclRef::Unknown(name) => write!(f, "<@{0}/{0}: {1}>", UNKNOWN, name),
        }
    }
}

/// Statically determined call target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callee {
    /// Function, method or constructor declared in this unit
    Decl(DeclId),
    /// Name exported by another module
    Imported { module: String, name: String },
    /// Member looked up on a class, following `extends` across modules
    Member { class: DeclRef, name: String },
    /// Unresolvable target; the member or function name is kept
    Unknown(String),
}

impl Callee {
    pub fn is_unknown(&self) -> bool {
        match self {
            Callee::Unknown(_) => true,
            Callee::Member { class, .. } => class.is_unknown(),
            _ => false,
        }
    }

    fn write_target(&self, f: &mut fmt::Formatter<'_>, member: bool) -> fmt::Result {
        match self {
            Callee::Decl(id) => write!(f, "<{}>", id),
            Callee::Imported { module, name } => write!(f, "<@import({}): {}>", module, name),
            Callee::Member {
                class: DeclRef::Decl(id),
                name,
            } => write!(f, "<{}.{}>", id, name),
            Callee::Member {
                class: DeclRef::Imported { module, name: class },
                name,
            } => write!(f, "<@import({}): {}.{}>", module, class, name),
            Callee::Member {
                class: DeclRef::Unknown(_),
                name,
            }
            | Callee::Unknown(name) => {
                let dot = if member { "." } else { "" };
                write!(f, "<@{0}/{0}: {1}{2}()>", UNKNOWN, dot, name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Direct call of a named function
    Static,
    /// Method call on a receiver
    Instance { base: Operand },
    /// Call through a function value
    Pointer { ptr: Operand },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub kind: CallKind,
    pub callee: Callee,
    pub args: Vec<Operand>,
}

impl Call {
    pub fn static_call(callee: Callee, args: Vec<Operand>) -> Self {
        Self {
            kind: CallKind::Static,
            callee,
            args,
        }
    }

    pub fn instance(base: Operand, callee: Callee, args: Vec<Operand>) -> Self {
        Self {
            kind: CallKind::Instance { base },
            callee,
            args,
        }
    }

    pub fn pointer(ptr: Operand, callee: Callee, args: Vec<Operand>) -> Self {
        Self {
            kind: CallKind::Pointer { ptr },
            callee,
            args,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CallKind::Static => {
                f.write_str("staticinvoke ")?;
                self.callee.write_target(f, false)?;
            }
            CallKind::Instance { base } => {
                write!(f, "instanceinvoke {}.", base)?;
                self.callee.write_target(f, true)?;
            }
            CallKind::Pointer { ptr } => {
                write!(f, "ptrinvoke {}", ptr)?;
                if !self.callee.is_unknown() {
                    self.callee.write_target(f, false)?;
                }
            }
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_member_call_display() {
        let call = Call::instance(
            Operand::local("arr"),
            Callee::Unknown("iterator".to_string()),
            vec![],
        );
        assert_eq!(call.to_string(), "instanceinvoke arr.<@%unk/%unk: .iterator()>()");
    }

    #[test]
    fn test_static_and_pointer_display() {
        let call = Call::static_call(
            Callee::Decl("@a.ets: f".to_string()),
            vec![Operand::Temp(0), Operand::number(1)],
        );
        assert_eq!(call.to_string(), "staticinvoke <@a.ets: f>(%0, 1)");

        let ptr = Call::pointer(Operand::local("cb"), Callee::Unknown("cb".to_string()), vec![]);
        assert_eq!(ptr.to_string(), "ptrinvoke cb()");
    }

    #[test]
    fn test_member_on_imported_class() {
        let callee = Callee::Member {
            class: DeclRef::Imported {
                module: "./base".to_string(),
                name: "Base".to_string(),
            },
            name: "run".to_string(),
        };
        let call = Call::instance(Operand::This, callee, vec![]);
        assert_eq!(call.to_string(), "instanceinvoke this.<@import(./base): Base.run>()");
    }
}
