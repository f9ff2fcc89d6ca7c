//! Parsing infrastructure
//!
//! This is where the tree-sitter dependency lives.

pub mod tree_sitter;

pub use self::tree_sitter::TypeScriptParser;
