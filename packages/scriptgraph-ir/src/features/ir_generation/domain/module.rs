//! Lowered module: functions, classes and cross-module references

use serde::{Deserialize, Serialize};

use super::callee::DeclRef;
use super::stmt::IrBody;
use crate::features::closure_resolution::Capture;
use crate::shared::models::{DeclId, Diagnostics, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// Synthetic `%dflt` holding module top-level code
    Module,
    Function,
    Arrow,
    Method,
    Constructor,
    /// Synthetic `%statInit` running static field initializers
    StaticInit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrFunction {
    pub id: DeclId,
    pub name: String,
    pub kind: FunctionKind,
    /// Parameter locals in declaration order (`%closures` excluded)
    pub params: Vec<String>,
    /// Owning class for methods, constructors and static initializers
    pub class: Option<DeclId>,
    pub is_static: bool,
    pub is_async: bool,
    pub is_generator: bool,
    pub captures: Vec<Capture>,
    pub body: IrBody,
    pub span: Span,
}

impl IrFunction {
    /// Receives its environment as `parameter0`
    pub fn has_closures(&self) -> bool {
        !self.captures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrMethod {
    pub name: String,
    pub id: DeclId,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrClass {
    pub id: DeclId,
    pub name: String,
    pub super_class: Option<DeclRef>,
    pub constructor: DeclId,
    pub methods: Vec<IrMethod>,
    pub fields: Vec<String>,
    pub static_init: Option<DeclId>,
    pub span: Span,
}

impl IrClass {
    /// Instance or static method declared directly on this class
    pub fn method(&self, name: &str) -> Option<&IrMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// What an exported name stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportTarget {
    /// Function or class declared in this unit
    Decl(DeclId),
    /// `export { a } from './m'` or re-export of an imported name
    Reexport { module: String, name: String },
    /// Plain value binding (no declaration node)
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    /// Exported name (`default` for default exports)
    pub name: String,
    pub target: ExportTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub local: String,
    pub module: String,
    /// Imported name; `default` or `*` for default and namespace imports
    pub imported: String,
}

/// Non-call dependency kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// Function or class used as a value
    Value,
    /// `new C()`
    Instantiate,
    /// `x instanceof C`
    InstanceOf,
    /// Type annotation
    TypeRef,
    /// Class to its members
    Contains,
    /// Subclass to superclass
    Extends,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRef {
    pub from: DeclId,
    pub to: DeclRef,
    pub kind: RefKind,
}

/// Everything lowered from one source unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrModule {
    pub file_path: String,
    /// `%dflt` first, then every other function in declaration order
    pub functions: Vec<IrFunction>,
    pub classes: Vec<IrClass>,
    pub imports: Vec<ImportEntry>,
    pub exports: Vec<ExportEntry>,
    pub dependencies: Vec<DependencyRef>,
    pub diagnostics: Diagnostics,
}

impl IrModule {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn function(&self, id: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.id == id)
    }

    /// Function by qualified name (`outer.inner`)
    pub fn function_named(&self, qualified: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| {
            crate::shared::utils::IdGenerator::split_decl_id(&f.id)
                .map(|(_, q)| q == qualified)
                .unwrap_or(false)
        })
    }

    pub fn class(&self, id: &str) -> Option<&IrClass> {
        self.classes.iter().find(|c| c.id == id)
    }
}
