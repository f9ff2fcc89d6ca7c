//! IR generation use cases

mod generate_ir;

pub use generate_ir::GenerateIrUseCase;
