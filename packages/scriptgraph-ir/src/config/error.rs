//! Configuration errors
//!
//! Raised by `PipelineConfig::build` and the YAML loader. Messages name the
//! offending field or stage so they can be shown to users unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric field outside its accepted range
    #[error("{field} = {value} is outside {min}..={max} ({hint})")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    #[error("config file has no 'version' key (expected 'version: 1')")]
    MissingVersion,

    #[error("config version {found} is not supported (known: {})", join_versions(supported))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("unknown preset '{0}' (expected fast, balanced, thorough or custom)")]
    UnknownPreset(String),

    /// Overrides given for a stage that is switched off
    #[error("stage '{stage}' is disabled but overridden: {hint}")]
    DisabledStageOverride { stage: String, hint: String },

    /// A stage enabled without the stage it consumes
    #[error("{issue}; {fix}")]
    CrossStageConflict { issue: String, fix: String },

    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn join_versions(versions: &[u32]) -> String {
    versions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Problem with the file rather than with the values in it
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::MissingVersion | Self::UnsupportedVersion { .. } | Self::Yaml(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_range_message_names_field() {
        let err = ConfigError::range_with_hint(
            "max_pattern_depth",
            0,
            1,
            64,
            "destructuring depth must be at least 1",
        );
        assert_eq!(
            err.to_string(),
            "max_pattern_depth = 0 is outside 1..=64 (destructuring depth must be at least 1)"
        );
        assert!(!err.is_schema_error());
    }

    #[test]
    fn test_version_errors_are_schema_errors() {
        let err = ConfigError::UnsupportedVersion {
            found: 2,
            supported: vec![1],
        };
        assert_eq!(err.to_string(), "config version 2 is not supported (known: 1)");
        assert!(err.is_schema_error());
        assert!(ConfigError::MissingVersion.is_schema_error());
    }

    #[test]
    fn test_cross_stage_conflict_message() {
        let err = ConfigError::CrossStageConflict {
            issue: "keep_path requires call_graph".to_string(),
            fix: "enable call_graph".to_string(),
        };
        assert_eq!(err.to_string(), "keep_path requires call_graph; enable call_graph");
    }
}
