//! Keep-Path Feature
//!
//! Marks every declaration reachable from a set of roots over the frozen
//! call graph. The unknown sink is reached like any node but never
//! expanded, so unresolved calls cannot keep arbitrary code alive.
//!
//! ## Structure
//! - `domain/` - `KeepMarkers`, `KeepReport`
//! - `ports/` - `ReachabilityAnalyzer`
//! - `application/` - `AnalyzeKeepPathUseCase`
//! - `infrastructure/` - `KeepPathAnalyzer` (BFS)

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::AnalyzeKeepPathUseCase;
pub use domain::{KeepMarkers, KeepReport};
pub use infrastructure::KeepPathAnalyzer;
pub use ports::ReachabilityAnalyzer;
