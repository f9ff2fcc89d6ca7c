//! Scopes and bindings
//!
//! Scopes live in an arena addressed by [`ScopeId`]; parents are ids, so the
//! tree is plain data. AST nodes are identified by address ([`ScopeKey`]):
//! both resolver passes and the lowering walk the very same `SourceUnit`, and
//! a `finally` body lowered twice maps to the same scope both times.

use serde::{Deserialize, Serialize};

use crate::features::parsing::domain::{ClassDef, FunctionDef};
use crate::shared::models::DeclId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// Module top level (the `%dflt` function)
    Module,
    Function,
    Block,
    /// Loop head + body; may own a per-iteration environment
    Loop,
    Catch,
}

impl ScopeKind {
    /// Scopes that own a function body (module included)
    pub fn is_function_like(&self) -> bool {
        matches!(self, ScopeKind::Module | ScopeKind::Function)
    }
}

/// Identity of a function-like body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKey {
    /// Module top level
    Module,
    /// Explicit `FunctionDef` (address)
    Function(usize),
    /// Class constructor, explicit or synthesized (class address)
    Constructor(usize),
    /// Static initializer (class address)
    StaticInit(usize),
}

impl FunctionKey {
    pub fn of_function(def: &FunctionDef) -> Self {
        FunctionKey::Function(addr(def))
    }

    pub fn constructor_of(class: &ClassDef) -> Self {
        FunctionKey::Constructor(addr(class))
    }

    pub fn static_init_of(class: &ClassDef) -> Self {
        FunctionKey::StaticInit(addr(class))
    }
}

/// Identity of any scope-introducing node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Function(FunctionKey),
    Block(usize),
    Loop(usize),
    Catch(usize),
}

impl ScopeKey {
    pub fn block<T>(node: &T) -> Self {
        ScopeKey::Block(addr(node))
    }

    pub fn looping<T>(node: &T) -> Self {
        ScopeKey::Loop(addr(node))
    }

    pub fn catch<T>(node: &T) -> Self {
        ScopeKey::Catch(addr(node))
    }
}

#[inline]
pub(crate) fn addr<T>(node: &T) -> usize {
    node as *const T as usize
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Param,
    Function,
    Class,
    /// Imported name: `(module specifier, imported name)`; `*` for namespaces
    Import { source: String, imported: String },
    CatchParam,
    /// Name of a named function expression, visible inside itself
    SelfRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    /// Read or written from a nested function
    pub captured: bool,
    /// Stored in a loop environment that is renewed every iteration
    pub per_iteration: bool,
    /// Scope whose environment stores this binding (captured bindings only)
    pub env_scope: Option<ScopeId>,
    /// Statically known function or class this binding names
    pub decl: Option<DeclId>,
    /// Name used inside the owning function (`x`, `x%1` when shadowing)
    pub local_name: String,
    pub referenced: bool,
}

/// One node of the scope tree
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Enclosing function-like scope (itself for function-like scopes)
    pub function: ScopeId,
    pub bindings: Vec<BindingId>,
    /// Environment owned by this scope, set once captures are known
    pub env: Option<super::EnvParent>,
    pub env_local: Option<String>,
}

impl Scope {
    pub fn owns_env(&self) -> bool {
        self.env_local.is_some()
    }
}
