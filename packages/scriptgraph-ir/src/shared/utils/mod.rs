//! Utility modules shared across features
//!
//! - `id_generator`: Deterministic declaration ids and content hashes
//! - `scope_stack`: Qualified-name tracking while lowering

pub mod id_generator;
pub mod scope_stack;

pub use id_generator::{content_hash, IdGenerator};
pub use scope_stack::ScopeStack;
