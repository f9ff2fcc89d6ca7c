//! Resolved scope tree of one source unit

use ahash::AHashMap;
use rustc_hash::FxHashMap;

use super::capture::{Capture, CaptureSet, EnvParent, EnvRef, Storage};
use super::scope::{Binding, BindingId, BindingKind, FunctionKey, Scope, ScopeId, ScopeKey, ScopeKind};
use crate::features::parsing::domain::ClassDef;
use crate::shared::models::DeclId;

/// Function-like body known to the resolver
#[derive(Debug, Clone)]
pub struct FunctionScope {
    pub key: FunctionKey,
    pub scope: ScopeId,
    pub decl_id: DeclId,
    /// Last qualified-name component (`inner`, `%AM0$outer`, `constructor`)
    pub name: String,
    pub captures: Vec<Capture>,
    /// Nearest environment-owning scope strictly enclosing the function
    pub anchor: Option<ScopeId>,
}

impl FunctionScope {
    /// Whether the function receives an environment (`%closures`)
    pub fn has_closures(&self) -> bool {
        !self.captures.is_empty()
    }
}

/// Method of a class known to the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodScope {
    pub name: String,
    pub key: FunctionKey,
    pub is_static: bool,
}

/// Class declaration or expression known to the resolver
#[derive(Debug, Clone)]
pub struct ClassScope {
    pub decl_id: DeclId,
    pub name: String,
    /// Scope the class is declared in
    pub scope: ScopeId,
    /// `extends` target when it is a name or dotted path (`Base`, `ns.Base`)
    pub extends: Option<Vec<String>>,
    /// `extends` present but not a plain path
    pub dynamic_extends: bool,
    pub constructor: FunctionKey,
    pub static_init: Option<FunctionKey>,
    pub methods: Vec<MethodScope>,
}

/// Scope tree plus the capture analysis built on top of it
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    pub file_path: String,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) names: Vec<AHashMap<String, BindingId>>,
    pub(crate) index: FxHashMap<ScopeKey, ScopeId>,
    pub(crate) functions: Vec<FunctionScope>,
    pub(crate) function_index: FxHashMap<FunctionKey, usize>,
    pub(crate) function_of_scope: FxHashMap<ScopeId, usize>,
    pub(crate) classes: Vec<ClassScope>,
    pub(crate) class_index: FxHashMap<usize, usize>,
}

impl ScopeTree {
    pub(crate) fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    // ── construction (resolver only) ───────────────────────────────────────

    pub(crate) fn add_scope(&mut self, key: ScopeKey, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let function = if kind.is_function_like() {
            id
        } else {
            parent.map(|p| self.scopes[p.0].function).unwrap_or(id)
        };
        self.scopes.push(Scope {
            id,
            kind,
            parent,
            function,
            bindings: Vec::new(),
            env: None,
            env_local: None,
        });
        self.names.push(AHashMap::new());
        self.index.insert(key, id);
        id
    }

    pub(crate) fn add_function(&mut self, function: FunctionScope) {
        let idx = self.functions.len();
        self.function_index.insert(function.key, idx);
        self.function_of_scope.insert(function.scope, idx);
        self.functions.push(function);
    }

    /// Declare `name` in `scope`; an existing binding of the same name is reused
    pub(crate) fn declare(&mut self, scope: ScopeId, name: &str, kind: BindingKind) -> BindingId {
        if let Some(&existing) = self.names[scope.0].get(name) {
            return existing;
        }
        let id = BindingId(self.bindings.len());
        self.bindings.push(Binding {
            name: name.to_string(),
            kind,
            scope,
            captured: false,
            per_iteration: false,
            env_scope: None,
            decl: None,
            local_name: name.to_string(),
            referenced: false,
        });
        self.names[scope.0].insert(name.to_string(), id);
        self.scopes[scope.0].bindings.push(id);
        id
    }

    pub(crate) fn add_class(&mut self, class: &ClassDef, info: ClassScope) {
        self.class_index.insert(super::scope::addr(class), self.classes.len());
        self.classes.push(info);
    }

    pub(crate) fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.0]
    }

    pub(crate) fn function_by_scope_mut(&mut self, scope: ScopeId) -> Option<&mut FunctionScope> {
        let idx = *self.function_of_scope.get(&scope)?;
        self.functions.get_mut(idx)
    }

    // ── queries ────────────────────────────────────────────────────────────

    pub fn module_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn scope_for(&self, key: ScopeKey) -> Option<ScopeId> {
        self.index.get(&key).copied()
    }

    pub fn function(&self, key: FunctionKey) -> Option<&FunctionScope> {
        self.function_index.get(&key).map(|&i| &self.functions[i])
    }

    pub fn function_by_scope(&self, scope: ScopeId) -> Option<&FunctionScope> {
        self.function_of_scope.get(&scope).map(|&i| &self.functions[i])
    }

    /// Functions in declaration order (module first)
    pub fn functions(&self) -> &[FunctionScope] {
        &self.functions
    }

    pub fn class_id(&self, class: &ClassDef) -> Option<&DeclId> {
        self.class_of(class).map(|c| &c.decl_id)
    }

    pub fn class_of(&self, class: &ClassDef) -> Option<&ClassScope> {
        self.class_index
            .get(&super::scope::addr(class))
            .map(|&i| &self.classes[i])
    }

    pub fn class_by_id(&self, id: &str) -> Option<&ClassScope> {
        self.classes.iter().find(|c| c.decl_id == id)
    }

    /// Classes in declaration order
    pub fn classes(&self) -> &[ClassScope] {
        &self.classes
    }

    /// Binding visible as `name` from `scope`, innermost first
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&binding) = self.names[id.0].get(name) {
                return Some(binding);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// Nearest environment-owning strict ancestor of `scope`
    pub fn env_parent_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = self.scopes[scope.0].parent;
        while let Some(id) = current {
            if self.scopes[id.0].owns_env() {
                return Some(id);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// `%parent` links from environment `from` to environment `to`
    pub(crate) fn hops_between(&self, from: ScopeId, to: ScopeId) -> Option<u32> {
        let mut current = Some(from);
        let mut hops = 0;
        while let Some(id) = current {
            if id == to {
                return Some(hops);
            }
            current = self.env_parent_scope(id);
            hops += 1;
        }
        None
    }

    /// Storage of `binding` as seen from code in `from`
    pub fn storage(&self, binding: BindingId, from: ScopeId) -> Storage {
        let bind = self.binding(binding);
        let decl_scope = self.scope(bind.scope);
        if decl_scope.kind == ScopeKind::Module {
            return Storage::Global(bind.name.clone());
        }

        let env_local = bind
            .env_scope
            .and_then(|s| self.scope(s).env_local.clone());
        let (true, Some(env_scope), Some(env_local)) = (bind.captured, bind.env_scope, env_local) else {
            return Storage::Local(bind.local_name.clone());
        };

        let use_function = self.scope(from).function;
        if use_function == decl_scope.function {
            return Storage::Env {
                env_local,
                field: bind.local_name.clone(),
            };
        }

        let hops = self
            .function_by_scope(use_function)
            .and_then(|f| {
                f.captures
                    .iter()
                    .find(|c| c.binding == binding)
                    .map(|c| c.hops)
                    .or_else(|| self.hops_between(f.anchor?, env_scope))
            })
            .unwrap_or(0);
        Storage::Captured {
            hops,
            field: bind.local_name.clone(),
        }
    }

    /// Storage of the identifier `name` referenced from `from`
    pub fn resolve(&self, from: ScopeId, name: &str) -> Storage {
        match self.lookup(from, name) {
            Some(binding) => self.storage(binding, from),
            None => Storage::Global(name.to_string()),
        }
    }

    /// Environment handed to a closure of `function` created in `creating_scope`
    ///
    /// `None` when the function captures nothing.
    pub fn closure_env(&self, function: FunctionKey, creating_scope: ScopeId) -> Option<EnvRef> {
        let target = self.function(function)?;
        if !target.has_closures() {
            return None;
        }
        let anchor = self.scope(target.anchor?);
        if anchor.function == self.scope(creating_scope).function {
            anchor.env_local.clone().map(EnvRef::Local)
        } else {
            Some(EnvRef::Closures)
        }
    }

    /// Captured bindings declared directly in a loop scope
    ///
    /// These are copied forward when a C-style `for` renews its environment.
    pub fn per_iteration_bindings(&self, scope: ScopeId) -> Vec<BindingId> {
        self.scope(scope)
            .bindings
            .iter()
            .copied()
            .filter(|&b| {
                let binding = self.binding(b);
                binding.captured && binding.per_iteration && binding.env_scope == Some(scope)
            })
            .collect()
    }

    /// Capture sets of every function in declaration order
    pub fn capture_sets(&self) -> Vec<CaptureSet> {
        self.functions
            .iter()
            .map(|f| CaptureSet {
                function: f.decl_id.clone(),
                captures: f.captures.clone(),
            })
            .collect()
    }

    /// Environment parent link for an environment-owning scope
    pub fn env_of(&self, scope: ScopeId) -> Option<(&str, &EnvParent)> {
        let s = self.scope(scope);
        Some((s.env_local.as_deref()?, s.env.as_ref()?))
    }
}
