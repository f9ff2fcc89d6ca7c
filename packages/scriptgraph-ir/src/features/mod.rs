//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure business logic (no external dependencies)
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases
//! - infrastructure/ - External dependency implementations
//!
//! Data flows parsing → closure_resolution → ir_generation → flow_graph
//! per unit, then call_graph → keep_path over the whole program.

pub mod call_graph;
pub mod closure_resolution;
pub mod flow_graph;
pub mod ir_generation;
pub mod keep_path;
pub mod parsing;
