//! Call graph infrastructure

pub mod builder;
pub mod symbols;

pub use builder::CallGraphBuilder;
pub use symbols::{module_key, resolve_specifier, SymbolTable};
