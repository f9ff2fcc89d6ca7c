/*
 * ScriptGraph IR - whole-program analysis core for ArkTS / TypeScript
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Graph substrate, errors, diagnostics, naming
 * - config/      : Presets, stage configs, YAML
 * - features/    : Vertical slices (parsing → scopes → ir → cfg → call graph → keep path)
 * - pipeline/    : Per-unit fan-out and single-writer aggregation
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Lowering helpers thread a lot of context
#![allow(clippy::type_complexity)] // Fan-out closures over generic inputs
#![allow(clippy::module_inception)] // call_graph::domain::call_graph
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::collapsible_else_if)] // else if clarity
#![allow(clippy::match_like_matches_macro)] // Match for readability

pub mod config;
pub mod features;
pub mod pipeline;
pub mod shared;

use once_cell::sync::OnceCell;
use tracing::debug;

pub use config::{PipelineConfig, Preset, ValidatedConfig};
pub use features::call_graph::{CallGraph, CallNode, CallTriple, UNKNOWN_NODE};
pub use features::flow_graph::{BasicBlock, BlockKind, Cfg, CfgSnapshot};
pub use features::ir_generation::{IrBody, IrFunction, IrModule, IrStmt};
pub use features::keep_path::{KeepMarkers, KeepReport};
pub use features::parsing::SourceUnit;
pub use pipeline::{AnalysisResult, Orchestrator, UnitResult};
pub use shared::models::{Diagnostic, DiagnosticKind, Diagnostics, Result, ScriptGraphError};

// ═══════════════════════════════════════════════════════════════════════════
// Rayon Thread Pool
// ═══════════════════════════════════════════════════════════════════════════

static RAYON_THREADS: OnceCell<usize> = OnceCell::new();

/// Size the global rayon pool once (75% of cores)
///
/// Returns the pool's thread count. If something else already built the
/// global pool, its size is reported instead.
pub fn init_rayon() -> usize {
    *RAYON_THREADS.get_or_init(|| {
        let threads = config::ParallelConfig::default().effective_workers();
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            Ok(()) => {
                debug!(threads, cpus = num_cpus::get(), "Initialized rayon pool");
                threads
            }
            Err(_) => rayon::current_num_threads(),
        }
    })
}

/// Analyse `(file path, source)` pairs with the tree-sitter front-end
pub fn analyze_sources(
    files: &[(String, String)],
    roots: &[String],
    config: ValidatedConfig,
) -> Result<AnalysisResult> {
    Orchestrator::from_config(config).analyze_sources(files, roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_rayon_is_idempotent() {
        let first = init_rayon();
        assert!(first >= 1);
        assert_eq!(init_rayon(), first);
    }
}
