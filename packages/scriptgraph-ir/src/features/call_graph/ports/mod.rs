//! Call graph ports

use crate::features::call_graph::domain::{CallGraph, UnitFragment};
use crate::shared::models::Result;

/// Single-writer sink for per-unit fragments
///
/// Fragments are merged one at a time; `freeze` resolves every call site
/// against the complete symbol table and hands back the read-only graph.
pub trait FragmentMerger: Send {
    fn merge(&mut self, fragment: UnitFragment) -> Result<()>;

    fn fragment_count(&self) -> usize;

    fn freeze(self) -> Result<CallGraph>
    where
        Self: Sized;
}
