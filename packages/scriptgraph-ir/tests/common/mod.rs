//! Common test utilities for scriptgraph-ir
//!
//! Shared fixtures and assertions for the integration and unit targets.

#![allow(dead_code, unused_imports)]

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;
