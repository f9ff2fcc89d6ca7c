//! Parsing Feature
//!
//! Owns the source AST the analysis core consumes and a tree-sitter based
//! producer for it.
//!
//! ## Structure
//! - `domain/` - `SourceUnit`, statements, expressions, patterns
//! - `ports/` - `SourceParser` trait
//! - `application/` - `ParseUnitUseCase`
//! - `infrastructure/` - `TypeScriptParser` (tree-sitter adapter)

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::ParseUnitUseCase;
pub use domain::SourceUnit;
pub use infrastructure::TypeScriptParser;
pub use ports::SourceParser;
