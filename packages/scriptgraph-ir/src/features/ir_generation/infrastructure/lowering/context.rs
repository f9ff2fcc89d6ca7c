//! Per-unit lowering state shared by every function job

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::LoweringConfig;
use crate::features::closure_resolution::{BindingId, BindingKind, ClassScope, FunctionKey, ScopeId, ScopeTree};
use crate::features::ir_generation::domain::{
    Callee, DeclRef, DependencyRef, ExportEntry, ImportEntry, IrClass, RefKind,
};
use crate::features::parsing::domain::{ClassDef, FunctionDef, SourceUnit};
use crate::shared::models::{DeclId, Diagnostic, Diagnostics};

/// Upper bound on `extends` links followed during method lookup
const MAX_SUPER_CHAIN: usize = 64;

/// Function body waiting to be lowered
#[derive(Debug, Clone, Copy)]
pub(super) enum Job<'u> {
    Module,
    Function(&'u FunctionDef),
    Method {
        class: &'u ClassDef,
        function: &'u FunctionDef,
        is_static: bool,
    },
    Constructor(&'u ClassDef),
    StaticInit(&'u ClassDef),
}

impl Job<'_> {
    pub fn key(&self) -> FunctionKey {
        match self {
            Job::Module => FunctionKey::Module,
            Job::Function(f) | Job::Method { function: f, .. } => FunctionKey::of_function(f),
            Job::Constructor(c) => FunctionKey::constructor_of(c),
            Job::StaticInit(c) => FunctionKey::static_init_of(c),
        }
    }
}

pub(super) struct ModuleContext<'u> {
    pub unit: &'u SourceUnit,
    pub tree: &'u ScopeTree,
    pub config: &'u LoweringConfig,
    pub classes: Vec<IrClass>,
    pub imports: Vec<ImportEntry>,
    pub exports: Vec<ExportEntry>,
    pub diagnostics: Diagnostics,
    /// Known class type of a binding (annotation or `new` result)
    pub binding_types: FxHashMap<BindingId, DeclRef>,
    dependencies: Vec<DependencyRef>,
    seen_dependencies: FxHashSet<DependencyRef>,
    jobs: VecDeque<Job<'u>>,
    queued: FxHashSet<FunctionKey>,
}

impl<'u> ModuleContext<'u> {
    pub fn new(unit: &'u SourceUnit, tree: &'u ScopeTree, config: &'u LoweringConfig) -> Self {
        let mut cx = Self {
            unit,
            tree,
            config,
            classes: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            diagnostics: Diagnostics::new(),
            binding_types: FxHashMap::default(),
            dependencies: Vec::new(),
            seen_dependencies: FxHashSet::default(),
            jobs: VecDeque::new(),
            queued: FxHashSet::default(),
        };
        cx.enqueue(Job::Module);
        cx
    }

    /// Queue a body once; `finally` blocks lowered twice re-enqueue the same keys
    pub fn enqueue(&mut self, job: Job<'u>) {
        if self.queued.insert(job.key()) {
            self.jobs.push_back(job);
        }
    }

    pub fn next_job(&mut self) -> Option<Job<'u>> {
        self.jobs.pop_front()
    }

    pub fn diag(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn depend(&mut self, from: &str, to: DeclRef, kind: RefKind) {
        if to.is_unknown() {
            return;
        }
        let dep = DependencyRef {
            from: from.to_string(),
            to,
            kind,
        };
        if self.seen_dependencies.insert(dep.clone()) {
            self.dependencies.push(dep);
        }
    }

    pub fn take_dependencies(&mut self) -> Vec<DependencyRef> {
        std::mem::take(&mut self.dependencies)
    }

    pub fn add_class(&mut self, class: IrClass) {
        if self.classes.iter().all(|c| c.id != class.id) {
            self.classes.push(class);
        }
    }

    pub fn function_id(&self, key: FunctionKey) -> Option<DeclId> {
        self.tree.function(key).map(|f| f.decl_id.clone())
    }

    // ── static name resolution ─────────────────────────────────────────────

    /// Declaration named by `path` as seen from `scope`
    pub fn resolve_path(&self, scope: ScopeId, path: &[String]) -> DeclRef {
        let joined = path.join(".");
        let Some(first) = path.first() else {
            return DeclRef::Unknown(joined);
        };
        let Some(binding) = self.tree.lookup(scope, first) else {
            return DeclRef::Unknown(joined);
        };
        let binding = self.tree.binding(binding);
        match (&binding.kind, path.len()) {
            (BindingKind::Import { source, imported }, 1) if imported != "*" => DeclRef::Imported {
                module: source.clone(),
                name: imported.clone(),
            },
            (BindingKind::Import { source, imported }, 2) if imported == "*" => DeclRef::Imported {
                module: source.clone(),
                name: path[1].clone(),
            },
            (_, 1) => match &binding.decl {
                Some(id) => DeclRef::Decl(id.clone()),
                None => DeclRef::Unknown(joined),
            },
            _ => DeclRef::Unknown(joined),
        }
    }

    /// Class named by a type annotation (`Foo`, `ns.Foo`, `Foo<T>`)
    pub fn resolve_annotation(&self, scope: ScopeId, annotation: &str) -> Option<DeclRef> {
        let head = annotation.split('<').next().unwrap_or_default().trim();
        if head.is_empty()
            || !head
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            return None;
        }
        let path: Vec<String> = head.split('.').map(str::to_string).collect();
        let resolved = self.resolve_path(scope, &path);
        (!resolved.is_unknown()).then_some(resolved)
    }

    pub fn class_scope(&self, class: &DeclRef) -> Option<&'u ClassScope> {
        match class {
            DeclRef::Decl(id) => self.tree.class_by_id(id),
            _ => None,
        }
    }

    pub fn super_of(&self, class: &ClassScope) -> Option<DeclRef> {
        if class.dynamic_extends {
            return Some(DeclRef::Unknown("%unk".to_string()));
        }
        class
            .extends
            .as_ref()
            .map(|path| self.resolve_path(class.scope, path))
    }

    /// Method `name` on `class`, walking `extends` inside the unit
    ///
    /// Leaving the unit yields [`Callee::Member`] so the call graph can keep
    /// looking in the imported module.
    pub fn lookup_method(&self, class: &DeclRef, name: &str) -> Callee {
        let mut current = class.clone();
        for _ in 0..MAX_SUPER_CHAIN {
            match &current {
                DeclRef::Decl(_) => {
                    let Some(scope) = self.class_scope(&current) else {
                        return Callee::Unknown(name.to_string());
                    };
                    let key = if name == "constructor" {
                        Some(scope.constructor)
                    } else {
                        scope.methods.iter().find(|m| m.name == name).map(|m| m.key)
                    };
                    if let Some(id) = key.and_then(|k| self.function_id(k)) {
                        return Callee::Decl(id);
                    }
                    match self.super_of(scope) {
                        Some(parent) => current = parent,
                        None => return Callee::Unknown(name.to_string()),
                    }
                }
                DeclRef::Imported { .. } => {
                    return Callee::Member {
                        class: current,
                        name: name.to_string(),
                    }
                }
                DeclRef::Unknown(_) => return Callee::Unknown(name.to_string()),
            }
        }
        Callee::Unknown(name.to_string())
    }
}
