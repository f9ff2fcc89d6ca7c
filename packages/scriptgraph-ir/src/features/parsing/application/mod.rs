//! Parsing application layer

mod parse_unit;

pub use parse_unit::ParseUnitUseCase;
