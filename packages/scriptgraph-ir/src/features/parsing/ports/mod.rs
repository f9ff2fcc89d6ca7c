//! Parsing ports (interfaces)

use crate::features::parsing::domain::SourceUnit;
use crate::shared::models::Result;

/// Front-end port
///
/// Anything that can turn source text into a [`SourceUnit`] plugs in here.
/// Producers never analyse; a construct they cannot map becomes
/// `StmtKind::Unsupported` / `ExprKind::Unsupported`.
pub trait SourceParser: Send + Sync {
    /// Parse source code into a source unit
    fn parse(&self, source: &str, file_path: &str) -> Result<SourceUnit>;

    /// Check if this parser handles the given file extension
    fn supports_extension(&self, ext: &str) -> bool;

    /// Get the language name
    fn language_name(&self) -> &'static str;
}
