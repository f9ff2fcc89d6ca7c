//! Unit-level diagnostics
//!
//! Semantic gaps are never thrown. The lowering substitutes a placeholder,
//! records a diagnostic here and keeps going; the caller decides how to
//! report the accumulated list.

use serde::{Deserialize, Serialize};

use super::Span;

/// Diagnostic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// AST shape that is deliberately not lowered faithfully
    UnsupportedPattern,
    /// Assignment to something that is not a binding, field or element
    InvalidAssignmentTarget,
    /// Statements after a control transfer that were skipped
    UnreachableCode,
    /// Call/type target that resolved to the unknown placeholder
    UnresolvedTarget,
    /// `break`/`continue` with no enclosing target
    OrphanJump,
    /// A whole unit was dropped from aggregation
    UnitFailed,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedPattern => "unsupported_pattern",
            Self::InvalidAssignmentTarget => "invalid_assignment_target",
            Self::UnreachableCode => "unreachable_code",
            Self::UnresolvedTarget => "unresolved_target",
            Self::OrphanJump => "orphan_jump",
            Self::UnitFailed => "unit_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single diagnostic attached to partial IR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// Declaration the diagnostic was raised in, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            span,
            function: None,
        }
    }

    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::UnsupportedPattern, Severity::Warning, message, span)
    }

    pub fn unreachable(span: Span) -> Self {
        Self::new(
            DiagnosticKind::UnreachableCode,
            Severity::Info,
            "statement after control transfer is never executed",
            span,
        )
    }

    /// A unit dropped from aggregation
    pub fn unit_failed(file: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            DiagnosticKind::UnitFailed,
            Severity::Error,
            format!("{}: {}", file, reason),
            Span::zero(),
        )
    }

    pub fn in_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}] {}", self.kind.as_str(), self.span, self.message)
    }
}

/// Accumulator used by every per-unit stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_filter_by_kind() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::unsupported("with statement", Span::new(1, 0, 1, 4)));
        diags.push(Diagnostic::unreachable(Span::new(2, 0, 2, 4)));

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.of_kind(DiagnosticKind::UnsupportedPattern).count(), 1);
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_diagnostic_display_mentions_kind() {
        let d = Diagnostic::unsupported("computed key", Span::new(3, 1, 3, 9));
        assert!(d.to_string().starts_with("unsupported_pattern[3:1-3:9]"));
    }
}
