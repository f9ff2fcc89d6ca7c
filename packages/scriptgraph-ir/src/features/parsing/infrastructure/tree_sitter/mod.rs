//! Tree-sitter front-end for TypeScript / ArkTS sources

mod converter;
pub mod node_kinds;
mod parser;

pub use parser::TypeScriptParser;
