//! Configuration I/O (YAML)
//!
//! Defines YAML schema types. Loading and export live in
//! `pipeline_config.rs` next to the fields they touch.

use super::{pipeline_config::StageControl, stage_configs::*};
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Stage on/off switches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<StageControl>,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowering: Option<LoweringConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg: Option<CfgConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_graph: Option<CallGraphConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_path: Option<KeepPathConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<ParallelConfig>,
}

#[cfg(test)]
mod tests {
    use crate::config::error::ConfigError;
    use crate::config::{PipelineConfig, Preset};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PipelineConfig::preset(Preset::Balanced).lowering(|c| c.max_pattern_depth(5));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: balanced"));
        assert!(yaml.contains("max_pattern_depth: 5"));

        let loaded = PipelineConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(loaded.lowering().max_pattern_depth, 5);
    }

    #[test]
    fn test_yaml_loading() {
        let temp_file = write_temp(
            r#"
version: 1
preset: fast
stages:
  keep_path: true
overrides:
  keep_path:
    exports_as_roots: true
  call_graph:
    max_hierarchy_depth: 4
"#,
        );
        let path = temp_file.path().to_str().unwrap();

        let config = PipelineConfig::from_yaml(path).unwrap();
        assert!(config.keep_path().unwrap().exports_as_roots);
        assert_eq!(config.call_graph().unwrap().max_hierarchy_depth, 4);
        assert!(!config.lowering().track_types);
    }

    #[test]
    fn test_yaml_missing_version() {
        let temp_file = write_temp("preset: fast\n");
        let result = PipelineConfig::from_yaml(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::MissingVersion)));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let result = PipelineConfig::from_yaml_str("version: 2\npreset: fast\n");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::UnsupportedVersion { .. }
        ));
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let result = PipelineConfig::from_yaml_str("version: 1\npreset: fast\nextra: 1\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_yaml_unknown_preset() {
        let result = PipelineConfig::from_yaml_str("version: 1\npreset: turbo\n");
        assert!(matches!(result, Err(ConfigError::UnknownPreset(_))));
    }
}
