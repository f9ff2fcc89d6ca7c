//! IR generation ports

use crate::features::closure_resolution::ScopeTree;
use crate::features::ir_generation::domain::IrModule;
use crate::features::parsing::domain::SourceUnit;
use crate::shared::models::Result;

/// Lowers a resolved source unit into IR
pub trait IrGenerator: Send + Sync {
    fn generate(&self, unit: &SourceUnit, scopes: &ScopeTree) -> Result<IrModule>;
}
