//! IR domain models

mod callee;
mod module;
mod stmt;
mod value;

pub use callee::{Call, CallKind, Callee, DeclRef};
pub use module::{
    DependencyRef, ExportEntry, ExportTarget, FunctionKind, ImportEntry, IrClass, IrFunction,
    IrMethod, IrModule, RefKind,
};
pub use stmt::{IrBody, IrStmt, Label, Trap};
pub use value::{
    Condition, EnvOperand, Operand, Place, Rvalue, CLOSURES_LOCAL, PARENT_FIELD, UNKNOWN,
};
