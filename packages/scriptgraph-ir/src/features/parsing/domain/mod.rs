//! Parsing domain models

pub mod ast;

pub use ast::*;
