//! Configuration System
//!
//! Three levels of control:
//! - Level 1: Preset - Simple one-liner
//! - Level 2: Stage Override - Partial adjustment
//! - Level 3: YAML - Complete control
//!
//! # Examples
//!
//! ```rust,ignore
//! use scriptgraph_ir::config::{PipelineConfig, Preset};
//!
//! let config = PipelineConfig::preset(Preset::Fast).build()?;
//!
//! let config = PipelineConfig::preset(Preset::Balanced)
//!     .lowering(|c| c.max_pattern_depth(8))
//!     .keep_path(|c| c.exports_as_roots(true))
//!     .build()?;
//!
//! let config = PipelineConfig::from_yaml("analysis.yaml")?;
//! ```

pub mod error;
pub mod io;
pub mod pipeline_config;
pub mod preset;
pub mod stage_configs;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use pipeline_config::{PipelineConfig, StageControl, StageId, ValidatedConfig};
pub use preset::Preset;
pub use stage_configs::{
    CallGraphConfig, CfgConfig, KeepPathConfig, LoweringConfig, ParallelConfig,
};
pub use validation::{CrossStageValidator, Validatable, ValidatableCollection};
