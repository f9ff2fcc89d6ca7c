//! IR generation infrastructure

pub mod lowering;

pub use lowering::AstLowerer;
