//! Call graph use cases

mod build_call_graph;

pub use build_call_graph::BuildCallGraphUseCase;
