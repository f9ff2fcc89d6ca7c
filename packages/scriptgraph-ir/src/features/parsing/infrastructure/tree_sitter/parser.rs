//! Tree-sitter parser implementation

use tree_sitter::Parser as TSParser;

use super::converter::AstConverter;
use crate::features::parsing::domain::SourceUnit;
use crate::features::parsing::ports::SourceParser;
use crate::shared::models::{Result, ScriptGraphError};

/// TypeScript / ArkTS parser backed by tree-sitter-typescript
///
/// Syntax errors do not fail the parse: tree-sitter recovers, and the
/// `ERROR` subtrees surface as unsupported nodes for the lowering to report.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptParser;

impl TypeScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for TypeScriptParser {
    fn parse(&self, source: &str, file_path: &str) -> Result<SourceUnit> {
        let mut parser = TSParser::new();
        let language = tree_sitter_typescript::language_typescript();
        parser.set_language(&language).map_err(|e| {
            ScriptGraphError::parse(format!("Failed to set language: {}", e)).with_file(file_path)
        })?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ScriptGraphError::parse("Failed to parse source").with_file(file_path))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(file = file_path, "Source contains syntax errors; continuing");
        }

        let body = AstConverter::new(source).convert_program(root);
        Ok(SourceUnit::new(file_path, body))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext, "ets" | "ts" | "js" | "mjs")
    }

    fn language_name(&self) -> &'static str {
        "typescript"
    }
}
