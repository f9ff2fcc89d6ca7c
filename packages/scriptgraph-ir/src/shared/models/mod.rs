//! Shared models

mod diagnostic;
mod error;
mod span;

pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{ErrorKind, Result, ScriptGraphError};
pub use span::Span;

/// Declaration identifier type alias (`@<file>: <qualified name>`)
pub type DeclId = String;
