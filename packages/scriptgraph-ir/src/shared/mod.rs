//! Shared module - Common types and utilities
//!
//! This module contains types that are shared across all features: the
//! graph substrate, error and diagnostic models, and naming utilities.

pub mod graph;
pub mod models;
pub mod utils;

// Re-exports for convenience
pub use graph::{GraphError, IdGraph, NodeId};
pub use models::*;
pub use utils::id_generator::IdGenerator;
pub use utils::scope_stack::ScopeStack;
