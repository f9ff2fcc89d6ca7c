//! Error types for the scriptgraph-ir crate
//!
//! Unified error handling across all features.
//!
//! Only contract violations travel through this type. Semantic gaps such as
//! unresolved call targets or unsupported patterns are recovered locally and
//! reported as [`Diagnostic`](super::Diagnostic)s instead.

use std::fmt;

/// Error kind categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Node or id absent from a graph
    NotFound,
    /// Front-end conversion errors
    Parse,
    /// IR generation errors
    IrGeneration,
    /// CFG construction errors
    FlowGraph,
    /// Call graph aggregation errors
    CallGraph,
    /// Configuration errors
    Config,
    /// Internal errors (bugs)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Parse => "parse",
            ErrorKind::IrGeneration => "ir_generation",
            ErrorKind::FlowGraph => "flow_graph",
            ErrorKind::CallGraph => "call_graph",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Unified error type
#[derive(Debug)]
pub struct ScriptGraphError {
    pub kind: ErrorKind,
    pub message: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ScriptGraphError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: None,
            line: None,
            source: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn ir_generation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IrGeneration, message)
    }

    pub fn flow_graph(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FlowGraph, message)
    }

    pub fn call_graph(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CallGraph, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for ScriptGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if let Some(ref file) = self.file_path {
            write!(f, " in {}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ScriptGraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScriptGraphError>;

impl From<crate::shared::graph::GraphError> for ScriptGraphError {
    fn from(err: crate::shared::graph::GraphError) -> Self {
        ScriptGraphError::not_found(err.to_string()).with_source(err)
    }
}

impl From<crate::config::ConfigError> for ScriptGraphError {
    fn from(err: crate::config::ConfigError) -> Self {
        let message = if err.is_schema_error() {
            format!("invalid config file: {}", err)
        } else {
            err.to_string()
        };
        ScriptGraphError::config(message).with_source(err)
    }
}

impl From<serde_json::Error> for ScriptGraphError {
    fn from(err: serde_json::Error) -> Self {
        ScriptGraphError::internal(format!("JSON serialization error: {}", err)).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScriptGraphError::parse("unexpected node")
            .with_file("entry.ets")
            .with_line(42);

        let msg = format!("{}", err);
        assert!(msg.contains("parse"));
        assert!(msg.contains("unexpected node"));
        assert!(msg.contains("entry.ets"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_graph_error_maps_to_not_found() {
        let err: ScriptGraphError = crate::shared::graph::GraphError::UnknownId(7).into();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_file_errors_are_labelled() {
        let err: ScriptGraphError = crate::config::ConfigError::MissingVersion.into();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.starts_with("invalid config file: "));

        let err: ScriptGraphError = crate::config::ConfigError::UnknownPreset("x".to_string()).into();
        assert!(!err.message.starts_with("invalid config file"));
    }
}
