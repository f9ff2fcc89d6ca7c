//! Closure Resolution Feature
//!
//! Lexical scope analysis over a [`SourceUnit`](crate::features::parsing::SourceUnit):
//! binding resolution, free-variable capture sets, environment layout and
//! stable declaration ids for every function and class.
//!
//! ## Structure
//! - `domain/` - scopes, bindings, capture sets, storage locations
//! - `application/` - `ScopeResolver` (declare + resolve passes)

pub mod application;
pub mod domain;

pub use application::ScopeResolver;
pub use domain::{
    Binding, BindingId, BindingKind, Capture, CaptureSet, ClassScope, EnvParent, EnvRef,
    FunctionKey, FunctionScope, MethodScope, Scope, ScopeId, ScopeKey, ScopeKind, ScopeTree, Storage,
};
