//! IR Generation Feature
//!
//! Lowers a resolved [`SourceUnit`](crate::features::parsing::SourceUnit)
//! into flat, statement-level IR: one [`IrFunction`](domain::IrFunction) per
//! function-like body (module top level included), with temporaries making
//! evaluation order explicit and unresolvable targets lowered to `%unk`.
//!
//! ## Structure
//! - `domain/` - operands, statements, bodies, functions, classes
//! - `ports/` - `IrGenerator`
//! - `application/` - `GenerateIrUseCase` (scope analysis + lowering)
//! - `infrastructure/` - `AstLowerer`

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::GenerateIrUseCase;
pub use domain::{IrBody, IrFunction, IrModule, IrStmt};
pub use infrastructure::AstLowerer;
pub use ports::IrGenerator;
