//! Flow Graph Feature
//!
//! Splits each lowered function body into basic blocks and wires the
//! control-flow edges between them, exception edges included.
//!
//! ## Structure
//! - `domain/` - `BasicBlock`, `Cfg`, serializable `CfgSnapshot`
//! - `ports/` - `FlowAnalyzer`
//! - `application/` - `BuildFlowGraphsUseCase`
//! - `infrastructure/` - `CfgBuilder`

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{BuildFlowGraphsUseCase, FlowGraphResult};
pub use domain::{BasicBlock, BlockKind, Cfg, CfgSnapshot};
pub use infrastructure::CfgBuilder;
pub use ports::FlowAnalyzer;
