//! Configuration validation
//!
//! Stage configs implement [`Validatable`]; [`CrossStageValidator`] checks
//! the dependencies between stages.

use super::error::{ConfigError, ConfigResult};
use super::pipeline_config::StageControl;

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

/// Extension trait for validating collections of configs
pub trait ValidatableCollection {
    fn validate_all(&self) -> ConfigResult<()>;
}

impl<T: Validatable> ValidatableCollection for Option<T> {
    fn validate_all(&self) -> ConfigResult<()> {
        if let Some(config) = self {
            config.validate()?;
        }
        Ok(())
    }
}

/// Cross-stage validator
pub struct CrossStageValidator;

impl CrossStageValidator {
    /// Validate stage dependencies
    ///
    /// Keep-path analysis runs over the call graph, and the call graph is
    /// assembled from per-unit CFG fragments.
    pub fn validate(stages: &StageControl) -> ConfigResult<()> {
        if stages.keep_path && !stages.call_graph {
            return Err(ConfigError::CrossStageConflict {
                issue: "Keep-path analysis requires the call graph".to_string(),
                fix: "Enable call_graph with .stages(|s| { s.call_graph = true; s }) or disable keep_path".to_string(),
            });
        }
        if stages.call_graph && !stages.cfg {
            return Err(ConfigError::CrossStageConflict {
                issue: "Call graph aggregation requires CFG construction".to_string(),
                fix: "Enable cfg or disable call_graph".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::stage_configs::LoweringConfig;

    #[test]
    fn test_default_stages_are_consistent() {
        assert!(CrossStageValidator::validate(&StageControl::default()).is_ok());
    }

    #[test]
    fn test_keep_path_without_call_graph() {
        let stages = StageControl {
            call_graph: false,
            ..StageControl::default()
        };
        assert!(matches!(
            CrossStageValidator::validate(&stages),
            Err(ConfigError::CrossStageConflict { .. })
        ));
    }

    #[test]
    fn test_optional_collection() {
        let none: Option<LoweringConfig> = None;
        assert!(none.validate_all().is_ok());
        let bad = Some(LoweringConfig::default().max_pattern_depth(0));
        assert!(bad.validate_all().is_err());
    }
}
