//! Closure resolution domain models

mod capture;
mod scope;
mod scope_tree;

pub use capture::{Capture, CaptureSet, EnvParent, EnvRef, Storage};
pub use scope::{Binding, BindingId, BindingKind, FunctionKey, Scope, ScopeId, ScopeKey, ScopeKind};
pub use scope_tree::{ClassScope, FunctionScope, MethodScope, ScopeTree};
