//! Closure resolution use cases

mod resolve_scopes;

pub use resolve_scopes::ScopeResolver;
