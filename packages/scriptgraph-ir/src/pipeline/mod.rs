//! Whole-program pipeline
//!
//! Per-unit work (parse, lower, build CFGs, extract a call-graph fragment)
//! fans out on a rayon pool. Fragments flow over a channel to one
//! aggregator thread, the only writer of the symbol table and call graph.
//! Keep-path analysis runs on the frozen graph.

pub mod orchestrator;
pub mod processor;
pub mod result;

pub use orchestrator::Orchestrator;
pub use processor::{UnitOutput, UnitProcessor};
pub use result::{AnalysisResult, UnitResult};
