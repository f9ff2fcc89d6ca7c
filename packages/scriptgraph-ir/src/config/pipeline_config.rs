//! Pipeline configuration with StageControl
//!
//! Main configuration struct with preset-based defaults and override support.

use super::{
    error::{ConfigError, ConfigResult},
    preset::Preset,
    stage_configs::*,
    validation::{CrossStageValidator, ValidatableCollection},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Pipeline stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageId {
    Cfg,
    CallGraph,
    KeepPath,
}

/// Stage control (on/off switches for pipeline stages)
///
/// Lowering always runs; everything downstream can be switched off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageControl {
    #[serde(default = "default_true")]
    pub cfg: bool,
    #[serde(default = "default_true")]
    pub call_graph: bool,
    #[serde(default = "default_true")]
    pub keep_path: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StageControl {
    fn default() -> Self {
        Self {
            cfg: true,
            call_graph: true,
            keep_path: true,
        }
    }
}

impl StageControl {
    /// Lowering + CFG only
    pub fn per_unit_only() -> Self {
        Self {
            cfg: true,
            call_graph: false,
            keep_path: false,
        }
    }

    pub fn enable(mut self, stage: StageId) -> Self {
        self.set(stage, true);
        self
    }

    pub fn disable(mut self, stage: StageId) -> Self {
        self.set(stage, false);
        self
    }

    pub fn set(&mut self, stage: StageId, enabled: bool) {
        match stage {
            StageId::Cfg => self.cfg = enabled,
            StageId::CallGraph => self.call_graph = enabled,
            StageId::KeepPath => self.keep_path = enabled,
        }
    }

    pub fn is_enabled(&self, stage: StageId) -> bool {
        match stage {
            StageId::Cfg => self.cfg,
            StageId::CallGraph => self.call_graph,
            StageId::KeepPath => self.keep_path,
        }
    }
}

/// Pipeline configuration (builder)
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base preset
    pub(crate) preset: Preset,

    /// Stage control (on/off switches)
    pub stages: StageControl,

    /// Strict mode: error on disabled stage overrides (default: false)
    pub(crate) strict_mode: bool,

    /// Stage-specific overrides
    pub(crate) lowering: Option<LoweringConfig>,
    pub(crate) cfg: Option<CfgConfig>,
    pub(crate) call_graph: Option<CallGraphConfig>,
    pub(crate) keep_path: Option<KeepPathConfig>,
    pub(crate) parallel: Option<ParallelConfig>,
}

impl PipelineConfig {
    /// Level 1: Create from preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            stages: StageControl::default(),
            strict_mode: false,
            lowering: None,
            cfg: None,
            call_graph: None,
            keep_path: None,
            parallel: None,
        }
    }

    /// Enable strict mode (errors on disabled stage overrides)
    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    /// Configure stage control (closure-based)
    pub fn stages<F>(mut self, f: F) -> Self
    where
        F: FnOnce(StageControl) -> StageControl,
    {
        self.stages = f(self.stages);
        self
    }

    /// Level 2: Override lowering
    pub fn lowering<F>(mut self, f: F) -> Self
    where
        F: FnOnce(LoweringConfig) -> LoweringConfig,
    {
        self.lowering = Some(f(LoweringConfig::from_preset(self.preset)));
        self
    }

    /// Level 2: Override CFG construction
    pub fn cfg<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CfgConfig) -> CfgConfig,
    {
        self.cfg = Some(f(CfgConfig::from_preset(self.preset)));
        self
    }

    /// Level 2: Override call graph aggregation
    pub fn call_graph<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CallGraphConfig) -> CallGraphConfig,
    {
        self.call_graph = Some(f(CallGraphConfig::from_preset(self.preset)));
        self
    }

    /// Level 2: Override keep-path analysis
    pub fn keep_path<F>(mut self, f: F) -> Self
    where
        F: FnOnce(KeepPathConfig) -> KeepPathConfig,
    {
        self.keep_path = Some(f(KeepPathConfig::from_preset(self.preset)));
        self
    }

    /// Level 2: Override parallel config
    pub fn parallel<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ParallelConfig) -> ParallelConfig,
    {
        self.parallel = Some(f(ParallelConfig::from_preset(self.preset)));
        self
    }

    /// Build and validate
    pub fn build(self) -> ConfigResult<ValidatedConfig> {
        // Step 1: individual stage configs
        self.lowering.validate_all()?;
        self.cfg.validate_all()?;
        self.call_graph.validate_all()?;
        self.keep_path.validate_all()?;
        self.parallel.validate_all()?;

        // Step 2: StageControl consistency
        self.validate_stage_control()?;

        // Step 3: cross-stage dependencies
        CrossStageValidator::validate(&self.stages)?;

        Ok(ValidatedConfig(self))
    }

    fn validate_stage_control(&self) -> ConfigResult<()> {
        let overridden = [
            ("cfg", self.stages.cfg, self.cfg.is_some()),
            ("call_graph", self.stages.call_graph, self.call_graph.is_some()),
            ("keep_path", self.stages.keep_path, self.keep_path.is_some()),
        ];

        for (stage, enabled, has_override) in overridden {
            if enabled || !has_override {
                continue;
            }
            if self.strict_mode {
                return Err(ConfigError::DisabledStageOverride {
                    stage: stage.to_string(),
                    hint: format!("Remove .{}() override or enable the stage", stage),
                });
            }
            warn!(stage, "stage config ignored (stage disabled)");
        }

        Ok(())
    }

    pub fn get_preset(&self) -> Preset {
        self.preset
    }

    /// Load from YAML file (v1 schema)
    pub fn from_yaml(path: &str) -> ConfigResult<ValidatedConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a YAML document (v1 schema)
    pub fn from_yaml_str(content: &str) -> ConfigResult<ValidatedConfig> {
        use crate::config::io::ConfigExportV1;

        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        if raw.get("version").is_none() {
            return Err(ConfigError::MissingVersion);
        }
        let export: ConfigExportV1 = serde_yaml::from_value(raw)?;

        if export.version != 1 {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: vec![1],
            });
        }

        let preset: Preset = export.preset.parse()?;

        let mut config = Self::preset(preset);

        if let Some(stages) = export.stages {
            config.stages = stages;
        }

        if let Some(overrides) = export.overrides {
            config.lowering = overrides.lowering.or(config.lowering);
            config.cfg = overrides.cfg.or(config.cfg);
            config.call_graph = overrides.call_graph.or(config.call_graph);
            config.keep_path = overrides.keep_path.or(config.keep_path);
            config.parallel = overrides.parallel.or(config.parallel);
        }

        config.build()
    }

    /// Export to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        use crate::config::io::{ConfigExportV1, ConfigOverrides};

        let export = ConfigExportV1 {
            version: 1,
            preset: self.get_preset().to_string(),
            stages: Some(self.stages.clone()),
            overrides: Some(ConfigOverrides {
                lowering: self.lowering.clone(),
                cfg: self.cfg.clone(),
                call_graph: self.call_graph.clone(),
                keep_path: self.keep_path.clone(),
                parallel: self.parallel.clone(),
            }),
        };

        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }

    /// Human-readable description of the configuration
    pub fn describe(&self) -> String {
        let enabled: Vec<&str> = [
            (true, "Lowering"),
            (self.stages.cfg, "Cfg"),
            (self.stages.call_graph, "CallGraph"),
            (self.stages.keep_path, "KeepPath"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        format!("{} [{}]", self.preset, enabled.join(", "))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

/// Validated configuration (immutable, safe to use)
#[derive(Debug, Clone)]
pub struct ValidatedConfig(PipelineConfig);

impl Default for ValidatedConfig {
    fn default() -> Self {
        Self(PipelineConfig::default())
    }
}

impl ValidatedConfig {
    pub fn into_inner(self) -> PipelineConfig {
        self.0
    }

    pub fn describe(&self) -> String {
        self.0.describe()
    }

    pub fn stages(&self) -> &StageControl {
        &self.0.stages
    }

    /// Effective lowering config (always on)
    pub fn lowering(&self) -> LoweringConfig {
        self.0
            .lowering
            .clone()
            .unwrap_or_else(|| LoweringConfig::from_preset(self.0.preset))
    }

    /// Effective CFG config (None if stage disabled)
    pub fn cfg(&self) -> Option<CfgConfig> {
        if !self.0.stages.cfg {
            return None;
        }
        Some(
            self.0
                .cfg
                .clone()
                .unwrap_or_else(|| CfgConfig::from_preset(self.0.preset)),
        )
    }

    /// Effective call graph config (None if stage disabled)
    pub fn call_graph(&self) -> Option<CallGraphConfig> {
        if !self.0.stages.call_graph {
            return None;
        }
        Some(
            self.0
                .call_graph
                .clone()
                .unwrap_or_else(|| CallGraphConfig::from_preset(self.0.preset)),
        )
    }

    /// Effective keep-path config (None if stage disabled)
    pub fn keep_path(&self) -> Option<KeepPathConfig> {
        if !self.0.stages.keep_path {
            return None;
        }
        Some(
            self.0
                .keep_path
                .clone()
                .unwrap_or_else(|| KeepPathConfig::from_preset(self.0.preset)),
        )
    }

    /// Effective parallel config
    pub fn parallel(&self) -> ParallelConfig {
        self.0
            .parallel
            .clone()
            .unwrap_or_else(|| ParallelConfig::from_preset(self.0.preset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_build() {
        let config = PipelineConfig::preset(Preset::Fast).build().unwrap();
        assert!(!config.lowering().track_types);
        assert!(!config.call_graph().unwrap().dependency_edges);
    }

    #[test]
    fn test_override_replaces_preset_values() {
        let config = PipelineConfig::preset(Preset::Balanced)
            .lowering(|c| c.max_pattern_depth(3))
            .build()
            .unwrap();
        assert_eq!(config.lowering().max_pattern_depth, 3);
        assert!(config.lowering().track_types);
    }

    #[test]
    fn test_invalid_override_fails_build() {
        let result = PipelineConfig::preset(Preset::Balanced)
            .call_graph(|c| c.max_hierarchy_depth(0))
            .build();
        assert!(matches!(result, Err(ConfigError::Range { .. })));
    }

    #[test]
    fn test_disabled_stage_returns_none() {
        let config = PipelineConfig::preset(Preset::Balanced)
            .stages(|_| StageControl::per_unit_only())
            .build()
            .unwrap();
        assert!(config.call_graph().is_none());
        assert!(config.keep_path().is_none());
        assert!(config.cfg().is_some());
    }

    #[test]
    fn test_strict_mode_rejects_disabled_override() {
        let result = PipelineConfig::preset(Preset::Balanced)
            .strict_mode(true)
            .stages(|s| s.disable(StageId::KeepPath))
            .keep_path(|c| c.exports_as_roots(true))
            .build();
        assert!(matches!(result, Err(ConfigError::DisabledStageOverride { .. })));
    }

    #[test]
    fn test_describe() {
        let config = PipelineConfig::preset(Preset::Fast);
        assert_eq!(config.describe(), "fast [Lowering, Cfg, CallGraph, KeepPath]");
    }
}
