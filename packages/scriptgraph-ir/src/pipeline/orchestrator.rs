//! Pipeline orchestrator
//!
//! Coordinates the features into one whole-program run. A unit that fails
//! any per-unit stage is reported as a `UnitFailed` diagnostic and its
//! fragment is never merged; the run itself only fails on contract
//! violations (duplicate units, a broken worker pool).

use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use super::processor::{UnitOutput, UnitProcessor};
use super::result::{AnalysisResult, UnitResult};
use crate::config::ValidatedConfig;
use crate::features::call_graph::{BuildCallGraphUseCase, CallGraphBuilder, UnitFragment};
use crate::features::flow_graph::{CfgBuilder, FlowAnalyzer};
use crate::features::ir_generation::{AstLowerer, IrGenerator};
use crate::features::keep_path::{AnalyzeKeepPathUseCase, KeepPathAnalyzer};
use crate::features::parsing::domain::SourceUnit;
use crate::features::parsing::{SourceParser, TypeScriptParser};
use crate::shared::models::{Diagnostic, Diagnostics, Result, ScriptGraphError};

pub struct Orchestrator<P: SourceParser, G: IrGenerator, F: FlowAnalyzer> {
    processor: UnitProcessor<P, G, F>,
    config: ValidatedConfig,
}

impl Orchestrator<TypeScriptParser, AstLowerer, CfgBuilder> {
    /// tree-sitter front-end, default lowering and CFG construction
    pub fn from_config(config: ValidatedConfig) -> Self {
        let processor = UnitProcessor::new(
            TypeScriptParser::new(),
            AstLowerer::new(config.lowering()),
            config.cfg().map(CfgBuilder::new),
        );
        Self { processor, config }
    }
}

impl<P: SourceParser, G: IrGenerator, F: FlowAnalyzer> Orchestrator<P, G, F> {
    pub fn new(processor: UnitProcessor<P, G, F>, config: ValidatedConfig) -> Self {
        Self { processor, config }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Analyse `(file path, source)` pairs
    pub fn analyze_sources(&self, files: &[(String, String)], roots: &[String]) -> Result<AnalysisResult> {
        self.run(files, roots, |(path, source)| {
            (path.clone(), self.processor.process_source(source, path))
        })
    }

    /// Analyse already-built ASTs
    pub fn analyze_units(&self, units: &[SourceUnit], roots: &[String]) -> Result<AnalysisResult> {
        self.run(units, roots, |unit| {
            (unit.file_path.clone(), self.processor.process_unit(unit))
        })
    }

    fn run<T, W>(&self, inputs: &[T], roots: &[String], work: W) -> Result<AnalysisResult>
    where
        T: Sync,
        W: Fn(&T) -> (String, Result<UnitOutput>) + Sync,
    {
        let start = Instant::now();
        info!(units = inputs.len(), "Starting analysis");

        let failures = Mutex::new(Diagnostics::new());
        let handle = |tx: Option<&Sender<UnitFragment>>, input: &T| -> Option<UnitResult> {
            let (file_path, outcome) = work(input);
            match outcome {
                Ok(UnitOutput {
                    module,
                    flow,
                    fragment,
                }) => {
                    if let Some(tx) = tx {
                        // Receiver only goes away after a failed merge, which is reported there
                        let _ = tx.send(fragment);
                    }
                    Some(UnitResult {
                        file_path,
                        module,
                        flow,
                    })
                }
                Err(err) => {
                    warn!(file = %file_path, error = %err, "Unit failed, skipping");
                    failures.lock().push(Diagnostic::unit_failed(&file_path, &err));
                    None
                }
            }
        };

        let (units, call_graph) = match self.config.call_graph() {
            Some(call_graph_config) => thread::scope(|scope| {
                let (tx, rx) = mpsc::channel();
                let aggregator = scope.spawn(move || {
                    BuildCallGraphUseCase::new(CallGraphBuilder::new(call_graph_config)).execute(rx)
                });
                let units = self.fan_out(inputs, Some(tx), &handle);
                let graph = aggregator
                    .join()
                    .map_err(|_| ScriptGraphError::internal("call-graph aggregator panicked"))?;
                Ok::<_, ScriptGraphError>((units?, Some(graph?)))
            })?,
            None => (self.fan_out(inputs, None, &handle)?, None),
        };

        let keep = match (&call_graph, self.config.keep_path()) {
            (Some(graph), Some(keep_config)) => Some(
                AnalyzeKeepPathUseCase::new(KeepPathAnalyzer::new(keep_config)).execute(graph, roots)?,
            ),
            _ => None,
        };

        let result = AnalysisResult {
            units,
            call_graph,
            keep,
            failures: failures.into_inner(),
            elapsed: start.elapsed(),
        };
        info!(
            units = result.units.len(),
            failed = result.failures.len(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Analysis complete"
        );
        Ok(result)
    }

    #[cfg(feature = "parallel")]
    fn fan_out<T, H>(
        &self,
        inputs: &[T],
        tx: Option<Sender<UnitFragment>>,
        handle: &H,
    ) -> Result<Vec<UnitResult>>
    where
        T: Sync,
        H: Fn(Option<&Sender<UnitFragment>>, &T) -> Option<UnitResult> + Sync,
    {
        let parallel = self.config.parallel();
        if !parallel.enable_rayon || inputs.len() < 2 {
            return Ok(Self::sequential(inputs, tx, handle));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallel.effective_workers())
            .stack_size(parallel.stack_size_mb * 1024 * 1024)
            .build()
            .map_err(|e| ScriptGraphError::internal(format!("worker pool: {}", e)))?;
        Ok(pool.install(|| {
            inputs
                .par_iter()
                .map_with(tx, |tx, input| handle(tx.as_ref(), input))
                .flatten()
                .collect()
        }))
    }

    #[cfg(not(feature = "parallel"))]
    fn fan_out<T, H>(
        &self,
        inputs: &[T],
        tx: Option<Sender<UnitFragment>>,
        handle: &H,
    ) -> Result<Vec<UnitResult>>
    where
        T: Sync,
        H: Fn(Option<&Sender<UnitFragment>>, &T) -> Option<UnitResult> + Sync,
    {
        Ok(Self::sequential(inputs, tx, handle))
    }

    fn sequential<T, H>(inputs: &[T], tx: Option<Sender<UnitFragment>>, handle: &H) -> Vec<UnitResult>
    where
        H: Fn(Option<&Sender<UnitFragment>>, &T) -> Option<UnitResult>,
    {
        inputs
            .iter()
            .filter_map(|input| handle(tx.as_ref(), input))
            .collect()
    }
}
