//! Call Graph Feature
//!
//! Whole-program call and dependency graph. Per-unit fragments are merged
//! by a single writer; freezing resolves every call site (declarations,
//! imports, method dispatch through `extends` chains) and sends the rest to
//! one shared unknown sink.
//!
//! ## Structure
//! - `domain/` - `UnitFragment`, `CallNode`, `EdgeInfo`, frozen `CallGraph`
//! - `ports/` - `FragmentMerger`
//! - `application/` - `BuildCallGraphUseCase`
//! - `infrastructure/` - `CallGraphBuilder`, `SymbolTable`

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::BuildCallGraphUseCase;
pub use domain::{CallGraph, CallNode, CallTriple, EdgeInfo, UnitFragment, UNKNOWN_NODE};
pub use infrastructure::{CallGraphBuilder, SymbolTable};
pub use ports::FragmentMerger;
