//! Per-unit call-graph fragment
//!
//! Everything the aggregator needs from one lowered unit, owned and `Send`,
//! so workers can hand it across a channel and drop the IR.

use serde::{Deserialize, Serialize};

use crate::features::ir_generation::domain::{
    Callee, DeclRef, DependencyRef, ExportEntry, ExportTarget, FunctionKind, IrMethod, IrModule,
};
use crate::shared::models::DeclId;
use crate::shared::utils::IdGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub id: DeclId,
    pub kind: FunctionKind,
    pub class: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub id: DeclId,
    /// Relative to the unit the class is declared in
    pub super_class: Option<DeclRef>,
    pub constructor: DeclId,
    pub methods: Vec<IrMethod>,
}

/// One call statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub caller: DeclId,
    /// `<caller>#<statement index>`
    pub id: String,
    pub callee: Callee,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFragment {
    pub file_path: String,
    pub functions: Vec<FunctionEntry>,
    pub classes: Vec<ClassEntry>,
    pub exports: Vec<ExportEntry>,
    pub call_sites: Vec<CallSite>,
    pub dependencies: Vec<DependencyRef>,
}

impl UnitFragment {
    pub fn from_module(module: &IrModule) -> Self {
        let functions = module
            .functions
            .iter()
            .map(|f| FunctionEntry {
                id: f.id.clone(),
                kind: f.kind,
                class: f.class.clone(),
            })
            .collect();
        let classes = module
            .classes
            .iter()
            .map(|c| ClassEntry {
                id: c.id.clone(),
                super_class: c.super_class.clone(),
                constructor: c.constructor.clone(),
                methods: c.methods.clone(),
            })
            .collect();
        let call_sites = module
            .functions
            .iter()
            .flat_map(|f| {
                f.body.call_sites().map(move |(index, call)| CallSite {
                    caller: f.id.clone(),
                    id: IdGenerator::call_site_id(&f.id, index),
                    callee: call.callee.clone(),
                })
            })
            .collect();

        Self {
            file_path: module.file_path.clone(),
            functions,
            classes,
            exports: module.exports.clone(),
            call_sites,
            dependencies: module.dependencies.clone(),
        }
    }

    /// Declarations exported under their own id
    pub fn exported_decls(&self) -> impl Iterator<Item = &DeclId> + '_ {
        self.exports.iter().filter_map(|e| match &e.target {
            ExportTarget::Decl(id) => Some(id),
            _ => None,
        })
    }
}
