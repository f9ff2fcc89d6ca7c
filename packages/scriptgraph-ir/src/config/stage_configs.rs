//! Stage-specific configurations
//!
//! Every stage config is `#[serde(default)]`, has a `from_preset`
//! constructor, consuming builder setters and a [`Validatable`] impl.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};

// ============================================================================
// Lowering (AST → IR)
// ============================================================================

/// AST → IR lowering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Use annotations, `new C()` results and `this` to type receivers
    pub track_types: bool,

    /// Deepest destructuring nesting lowered faithfully (1..=64)
    pub max_pattern_depth: usize,

    /// Record an info diagnostic for every skipped unreachable statement
    pub report_unreachable: bool,
}

impl LoweringConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                track_types: false,
                max_pattern_depth: 4,
                report_unreachable: false,
            },
            Preset::Balanced | Preset::Custom => Self {
                track_types: true,
                max_pattern_depth: 16,
                report_unreachable: true,
            },
            Preset::Thorough => Self {
                track_types: true,
                max_pattern_depth: 64,
                report_unreachable: true,
            },
        }
    }

    /// Builder: Set track_types
    pub fn track_types(mut self, v: bool) -> Self {
        self.track_types = v;
        self
    }

    /// Builder: Set max_pattern_depth
    pub fn max_pattern_depth(mut self, v: usize) -> Self {
        self.max_pattern_depth = v;
        self
    }

    /// Builder: Set report_unreachable
    pub fn report_unreachable(mut self, v: bool) -> Self {
        self.report_unreachable = v;
        self
    }
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for LoweringConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_pattern_depth == 0 || self.max_pattern_depth > 64 {
            return Err(ConfigError::range_with_hint(
                "max_pattern_depth",
                self.max_pattern_depth,
                1,
                64,
                "Destructuring depth must be at least 1",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "lowering"
    }
}

// ============================================================================
// CFG construction
// ============================================================================

/// CFG construction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgConfig {
    /// Wire block → handler edges for protected regions
    pub exception_edges: bool,

    /// Compute a blake3 fingerprint for every snapshot
    pub fingerprint: bool,
}

impl CfgConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                exception_edges: true,
                fingerprint: false,
            },
            _ => Self {
                exception_edges: true,
                fingerprint: true,
            },
        }
    }

    /// Builder: Set exception_edges
    pub fn exception_edges(mut self, v: bool) -> Self {
        self.exception_edges = v;
        self
    }

    /// Builder: Set fingerprint
    pub fn fingerprint(mut self, v: bool) -> Self {
        self.fingerprint = v;
        self
    }
}

impl Default for CfgConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for CfgConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "cfg"
    }
}

// ============================================================================
// Call graph
// ============================================================================

/// Call-graph aggregation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallGraphConfig {
    /// Resolve `recv.m()` through the receiver's class hierarchy
    pub resolve_methods: bool,

    /// Follow import bindings into other units
    pub resolve_imports: bool,

    /// Add reference / type / inherit / member edges besides calls
    pub dependency_edges: bool,

    /// Longest `extends` chain walked during method lookup (1..=256)
    pub max_hierarchy_depth: usize,
}

impl CallGraphConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                resolve_methods: true,
                resolve_imports: true,
                dependency_edges: false,
                max_hierarchy_depth: 8,
            },
            Preset::Balanced | Preset::Custom => Self {
                resolve_methods: true,
                resolve_imports: true,
                dependency_edges: true,
                max_hierarchy_depth: 32,
            },
            Preset::Thorough => Self {
                resolve_methods: true,
                resolve_imports: true,
                dependency_edges: true,
                max_hierarchy_depth: 256,
            },
        }
    }

    /// Builder: Set resolve_methods
    pub fn resolve_methods(mut self, v: bool) -> Self {
        self.resolve_methods = v;
        self
    }

    /// Builder: Set resolve_imports
    pub fn resolve_imports(mut self, v: bool) -> Self {
        self.resolve_imports = v;
        self
    }

    /// Builder: Set dependency_edges
    pub fn dependency_edges(mut self, v: bool) -> Self {
        self.dependency_edges = v;
        self
    }

    /// Builder: Set max_hierarchy_depth
    pub fn max_hierarchy_depth(mut self, v: usize) -> Self {
        self.max_hierarchy_depth = v;
        self
    }
}

impl Default for CallGraphConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for CallGraphConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_hierarchy_depth == 0 || self.max_hierarchy_depth > 256 {
            return Err(ConfigError::range_with_hint(
                "max_hierarchy_depth",
                self.max_hierarchy_depth,
                1,
                256,
                "Method lookup must inspect at least the receiver's own class",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "call_graph"
    }
}

// ============================================================================
// Keep path
// ============================================================================

/// Keep-path reachability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepPathConfig {
    /// Treat every exported declaration as an additional root
    pub exports_as_roots: bool,

    /// Traverse reference / type / inherit / member edges, not only calls
    pub follow_dependency_edges: bool,
}

impl KeepPathConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Thorough => Self {
                exports_as_roots: true,
                follow_dependency_edges: true,
            },
            _ => Self {
                exports_as_roots: false,
                follow_dependency_edges: true,
            },
        }
    }

    /// Builder: Set exports_as_roots
    pub fn exports_as_roots(mut self, v: bool) -> Self {
        self.exports_as_roots = v;
        self
    }

    /// Builder: Set follow_dependency_edges
    pub fn follow_dependency_edges(mut self, v: bool) -> Self {
        self.follow_dependency_edges = v;
        self
    }
}

impl Default for KeepPathConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for KeepPathConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "keep_path"
    }
}

// ============================================================================
// Parallel execution
// ============================================================================

/// Parallel processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of workers (0=auto, 0..=256)
    pub num_workers: usize,

    /// Fan units out on a rayon pool (false = sequential)
    pub enable_rayon: bool,

    /// Worker thread stack size in MB (1..=64)
    pub stack_size_mb: usize,
}

impl ParallelConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Thorough => Self {
                num_workers: 0, // Auto
                enable_rayon: true,
                stack_size_mb: 16,
            },
            _ => Self {
                num_workers: 0, // Auto
                enable_rayon: true,
                stack_size_mb: 8,
            },
        }
    }

    /// Builder: Set num_workers
    pub fn num_workers(mut self, v: usize) -> Self {
        self.num_workers = v;
        self
    }

    /// Builder: Set enable_rayon
    pub fn enable_rayon(mut self, v: bool) -> Self {
        self.enable_rayon = v;
        self
    }

    /// Builder: Set stack_size_mb
    pub fn stack_size_mb(mut self, v: usize) -> Self {
        self.stack_size_mb = v;
        self
    }

    /// Worker count with `0` resolved to 75% of the available cores
    pub fn effective_workers(&self) -> usize {
        if self.num_workers > 0 {
            self.num_workers
        } else {
            (num_cpus::get() * 3 / 4).max(1)
        }
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for ParallelConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.num_workers > 256 {
            return Err(ConfigError::range_with_hint(
                "num_workers",
                self.num_workers,
                0,
                256,
                "Number of workers must be reasonable (0=auto)",
            ));
        }

        if self.stack_size_mb < 1 || self.stack_size_mb > 64 {
            return Err(ConfigError::range_with_hint(
                "stack_size_mb",
                self.stack_size_mb,
                1,
                64,
                "Stack size must be reasonable",
            ));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "parallel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom] {
            assert!(LoweringConfig::from_preset(preset).validate().is_ok());
            assert!(CfgConfig::from_preset(preset).validate().is_ok());
            assert!(CallGraphConfig::from_preset(preset).validate().is_ok());
            assert!(KeepPathConfig::from_preset(preset).validate().is_ok());
            assert!(ParallelConfig::from_preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_lowering_depth_range() {
        let cfg = LoweringConfig::default().max_pattern_depth(0);
        assert!(matches!(cfg.validate(), Err(ConfigError::Range { .. })));
        let cfg = LoweringConfig::default().max_pattern_depth(65);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_hierarchy_depth_range() {
        let cfg = CallGraphConfig::default().max_hierarchy_depth(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parallel_workers() {
        let cfg = ParallelConfig::default().num_workers(300);
        assert!(cfg.validate().is_err());
        assert_eq!(ParallelConfig::default().num_workers(3).effective_workers(), 3);
        assert!(ParallelConfig::default().effective_workers() >= 1);
    }

    #[test]
    fn test_serde_default_fills_missing_fields() {
        let cfg: LoweringConfig = serde_yaml::from_str("track_types: false").unwrap();
        assert!(!cfg.track_types);
        assert_eq!(cfg.max_pattern_depth, LoweringConfig::default().max_pattern_depth);
    }
}
