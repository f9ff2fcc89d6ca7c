use tracing::debug;

use crate::features::closure_resolution::ScopeResolver;
use crate::features::ir_generation::domain::IrModule;
use crate::features::ir_generation::ports::IrGenerator;
use crate::features::parsing::domain::SourceUnit;
use crate::shared::models::Result;

/// Scope analysis followed by lowering
pub struct GenerateIrUseCase<G: IrGenerator> {
    generator: G,
}

impl<G: IrGenerator> GenerateIrUseCase<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn execute(&self, unit: &SourceUnit) -> Result<IrModule> {
        let scopes = ScopeResolver::resolve(unit);
        let module = self.generator.generate(unit, &scopes)?;
        debug!(
            file = %unit.file_path,
            functions = module.functions.len(),
            classes = module.classes.len(),
            diagnostics = module.diagnostics.len(),
            "Lowered unit"
        );
        Ok(module)
    }
}
