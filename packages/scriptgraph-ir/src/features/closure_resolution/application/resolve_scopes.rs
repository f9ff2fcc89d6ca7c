//! Scope resolver
//!
//! Two walks over the same `SourceUnit`:
//!
//! 1. **Declare** builds the scope tree, hoists `var` and function
//!    declarations, declares block-scoped names at block entry and hands out
//!    declaration ids.
//! 2. **Resolve** visits every identifier reference, marks captured bindings
//!    and records capture entries in each function between the use and the
//!    declaration (so intermediate functions capture transitively).
//!
//! `finalize` then lays out environments: a captured binding lives in the
//! nearest loop scope of its function (renewed per iteration) or else in
//! the function scope.

use ahash::{AHashMap, AHashSet};
use tracing::trace;

use crate::features::closure_resolution::domain::{
    BindingKind, Capture, ClassScope, EnvParent, FunctionKey, FunctionScope, MethodScope, ScopeId,
    ScopeKey, ScopeKind, ScopeTree,
};
use crate::features::parsing::domain::*;
use crate::shared::utils::{IdGenerator, ScopeStack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Declare,
    Resolve,
}

/// Builds a [`ScopeTree`] for one source unit
pub struct ScopeResolver;

impl ScopeResolver {
    pub fn resolve(unit: &SourceUnit) -> ScopeTree {
        let mut walker = Walker {
            tree: ScopeTree::new(unit.file_path.clone()),
            pass: Pass::Declare,
            current: ScopeId(0),
            names: ScopeStack::new(),
            used: AHashSet::new(),
        };
        walker.walk_module(unit);

        walker.pass = Pass::Resolve;
        walker.current = ScopeId(0);
        walker.walk_module(unit);

        let mut tree = walker.tree;
        finalize(&mut tree);
        trace!(
            file = %unit.file_path,
            scopes = tree.scopes().len(),
            functions = tree.functions().len(),
            "Resolved scopes"
        );
        tree
    }
}

struct Walker {
    tree: ScopeTree,
    pass: Pass,
    current: ScopeId,
    names: ScopeStack,
    used: AHashSet<String>,
}

impl Walker {
    fn declaring(&self) -> bool {
        self.pass == Pass::Declare
    }

    /// Qualified name made unique within the unit (`f`, `f%1`, …)
    fn unique_qualified(&mut self, component: &str) -> String {
        let base = self.names.fqn_with(component);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}%{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }

    /// Enter (declare) or re-enter (resolve) a scope and run `f` inside it
    fn in_scope<F>(&mut self, key: ScopeKey, kind: ScopeKind, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let scope = match self.pass {
            Pass::Declare => self.tree.add_scope(key, kind, Some(self.current)),
            Pass::Resolve => match self.tree.scope_for(key) {
                Some(id) => id,
                None => return,
            },
        };
        let saved = std::mem::replace(&mut self.current, scope);
        f(self);
        self.current = saved;
    }

    /// Enter a function-like scope; in the declare pass also register it
    fn in_function<F>(&mut self, key: FunctionKey, component: String, f: F)
    where
        F: FnOnce(&mut Self),
    {
        if self.declaring() {
            let qualified = self.unique_qualified(&component);
            let scope = self
                .tree
                .add_scope(ScopeKey::Function(key), ScopeKind::Function, Some(self.current));
            self.tree.add_function(FunctionScope {
                key,
                scope,
                decl_id: IdGenerator::decl_id(&self.tree.file_path, &qualified),
                name: component.clone(),
                captures: Vec::new(),
                anchor: None,
            });
            self.names.push(component);
            let saved = std::mem::replace(&mut self.current, scope);
            f(self);
            self.current = saved;
            self.names.pop();
        } else {
            let Some(scope) = self.tree.scope_for(ScopeKey::Function(key)) else {
                return;
            };
            let saved = std::mem::replace(&mut self.current, scope);
            f(self);
            self.current = saved;
        }
    }

    fn declare(&mut self, name: &str, kind: BindingKind) {
        if self.declaring() && !name.is_empty() {
            self.tree.declare(self.current, name, kind);
        }
    }

    fn declare_pattern(&mut self, pattern: &Pattern, kind: BindingKind) {
        for name in pattern.bound_names() {
            self.declare(name, kind.clone());
        }
    }

    fn set_decl(&mut self, name: &str, decl: Option<String>) {
        if let (Some(decl), Some(binding)) = (decl, self.tree.lookup(self.current, name)) {
            self.tree.binding_mut(binding).decl = Some(decl);
        }
    }

    fn function_decl_id(&self, key: FunctionKey) -> Option<String> {
        self.tree.function(key).map(|f| f.decl_id.clone())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // References
    // ═══════════════════════════════════════════════════════════════════════

    fn reference(&mut self, name: &str) {
        if self.declaring() {
            return;
        }
        let Some(binding) = self.tree.lookup(self.current, name) else {
            return;
        };
        self.tree.binding_mut(binding).referenced = true;

        let decl_scope = self.tree.binding(binding).scope;
        if self.tree.scope(decl_scope).kind == ScopeKind::Module {
            return;
        }
        let decl_function = self.tree.scope(decl_scope).function;
        let mut function = self.tree.scope(self.current).function;
        if function == decl_function {
            return;
        }

        self.tree.binding_mut(binding).captured = true;
        while function != decl_function {
            let parent = self.tree.scope(function).parent;
            if let Some(entry) = self.tree.function_by_scope_mut(function) {
                if !entry.captures.iter().any(|c| c.binding == binding) {
                    entry.captures.push(Capture {
                        name: name.to_string(),
                        declaring_scope: decl_scope,
                        binding,
                        per_iteration: false,
                        hops: 0,
                    });
                }
            }
            let Some(parent) = parent else { break };
            function = self.tree.scope(parent).function;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Hoisting
    // ═══════════════════════════════════════════════════════════════════════

    /// Declare every `var` in `stmts` (not crossing function boundaries)
    fn hoist_vars(&mut self, stmts: &[Stmt]) {
        if !self.declaring() {
            return;
        }
        let mut names = Vec::new();
        for stmt in stmts {
            collect_vars(stmt, &mut names);
        }
        for name in names {
            self.declare(&name, BindingKind::Var);
        }
    }

    /// Block-level declarations: `let`, `const`, `class`, functions, imports
    fn declare_lexical(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) if decl.kind.is_block_scoped() => {
                let kind = binding_kind(decl.kind);
                for d in &decl.declarators {
                    self.declare_pattern(&d.pattern, kind.clone());
                }
            }
            StmtKind::Function(f) => {
                if let Some(name) = &f.name {
                    self.declare(name, BindingKind::Function);
                }
            }
            StmtKind::Class(c) => {
                if let Some(name) = &c.name {
                    self.declare(name, BindingKind::Class);
                }
            }
            StmtKind::Import(import) => {
                for spec in &import.specifiers {
                    let imported = match spec {
                        ImportSpecifier::Named { imported, .. } => imported.clone(),
                        ImportSpecifier::Default(_) => "default".to_string(),
                        ImportSpecifier::Namespace(_) => "*".to_string(),
                    };
                    self.declare(
                        spec.local(),
                        BindingKind::Import {
                            source: import.source.clone(),
                            imported,
                        },
                    );
                }
            }
            StmtKind::Export(ExportDecl::Decl(inner)) | StmtKind::Export(ExportDecl::Default(inner)) => {
                self.declare_lexical(inner)
            }
            _ => {}
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Walk
    // ═══════════════════════════════════════════════════════════════════════

    fn walk_module(&mut self, unit: &SourceUnit) {
        if self.declaring() {
            self.used.insert("%dflt".to_string());
            let scope = self
                .tree
                .add_scope(ScopeKey::Function(FunctionKey::Module), ScopeKind::Module, None);
            self.tree.add_function(FunctionScope {
                key: FunctionKey::Module,
                scope,
                decl_id: IdGenerator::decl_id(&unit.file_path, "%dflt"),
                name: "%dflt".to_string(),
                captures: Vec::new(),
                anchor: None,
            });
            self.current = scope;
            self.hoist_vars(&unit.body);
        }
        self.walk_stmt_list(&unit.body);
    }

    fn walk_stmt_list(&mut self, stmts: &[Stmt]) {
        if self.declaring() {
            for stmt in stmts {
                self.declare_lexical(stmt);
            }
        }
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => self.walk_var_decl(decl),
            StmtKind::Function(f) => {
                let key = self.walk_function(f, f.name.clone());
                if self.declaring() {
                    if let Some(name) = &f.name {
                        let decl = self.function_decl_id(key);
                        self.set_decl(name, decl);
                    }
                }
            }
            StmtKind::Class(c) => {
                self.walk_class(c);
                if self.declaring() {
                    if let Some(name) = &c.name {
                        let decl = self.tree.class_id(c).cloned();
                        self.set_decl(name, decl);
                    }
                }
            }
            StmtKind::Expr(e) | StmtKind::Throw(e) => self.walk_expr(e),
            StmtKind::Return(e) => {
                if let Some(e) = e {
                    self.walk_expr(e);
                }
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.walk_expr(test);
                self.walk_stmt(consequent);
                if let Some(alt) = alternate {
                    self.walk_stmt(alt);
                }
            }
            StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
                self.in_scope(ScopeKey::looping(stmt), ScopeKind::Loop, |w| {
                    w.walk_expr(test);
                    w.walk_stmt(body);
                });
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.in_scope(ScopeKey::looping(stmt), ScopeKind::Loop, |w| {
                    match init {
                        Some(ForInit::VarDecl(decl)) => {
                            if decl.kind.is_block_scoped() {
                                let kind = binding_kind(decl.kind);
                                for d in &decl.declarators {
                                    w.declare_pattern(&d.pattern, kind.clone());
                                }
                            }
                            w.walk_var_decl(decl);
                        }
                        Some(ForInit::Expr(e)) => w.walk_expr(e),
                        None => {}
                    }
                    if let Some(test) = test {
                        w.walk_expr(test);
                    }
                    if let Some(update) = update {
                        w.walk_expr(update);
                    }
                    w.walk_stmt(body);
                });
            }
            StmtKind::ForOf { head, right, body } | StmtKind::ForIn { head, right, body } => {
                self.walk_expr(right);
                self.in_scope(ScopeKey::looping(stmt), ScopeKind::Loop, |w| {
                    if let Some(kind) = head.kind.filter(|k| k.is_block_scoped()) {
                        w.declare_pattern(&head.pattern, binding_kind(kind));
                    }
                    w.walk_pattern(&head.pattern);
                    w.walk_stmt(body);
                });
            }
            StmtKind::Block(stmts) => {
                self.in_scope(ScopeKey::block(stmt), ScopeKind::Block, |w| {
                    w.walk_stmt_list(stmts)
                });
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.in_scope(ScopeKey::block(block), ScopeKind::Block, |w| {
                    w.walk_stmt_list(block)
                });
                if let Some(clause) = handler {
                    self.in_scope(ScopeKey::catch(clause), ScopeKind::Catch, |w| {
                        if let Some(param) = &clause.param {
                            w.declare_pattern(param, BindingKind::CatchParam);
                            w.walk_pattern(param);
                        }
                        w.walk_stmt_list(&clause.body);
                    });
                }
                if let Some(finalizer) = finalizer {
                    self.in_scope(ScopeKey::block(finalizer), ScopeKind::Block, |w| {
                        w.walk_stmt_list(finalizer)
                    });
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.walk_expr(discriminant);
                self.in_scope(ScopeKey::block(stmt), ScopeKind::Block, |w| {
                    if w.declaring() {
                        for case in cases {
                            for s in &case.body {
                                w.declare_lexical(s);
                            }
                        }
                    }
                    for case in cases {
                        if let Some(test) = &case.test {
                            w.walk_expr(test);
                        }
                        for s in &case.body {
                            w.walk_stmt(s);
                        }
                    }
                });
            }
            StmtKind::Labeled { body, .. } => self.walk_stmt(body),
            StmtKind::Export(ExportDecl::Decl(inner)) | StmtKind::Export(ExportDecl::Default(inner)) => {
                self.walk_stmt(inner)
            }
            StmtKind::Export(ExportDecl::Named {
                specifiers,
                source: None,
            }) => {
                for spec in specifiers {
                    self.reference(&spec.local);
                }
            }
            StmtKind::Export(ExportDecl::Named { .. })
            | StmtKind::Import(_)
            | StmtKind::Break(_)
            | StmtKind::Continue(_)
            | StmtKind::Empty
            | StmtKind::Unsupported(_) => {}
        }
    }

    fn walk_var_decl(&mut self, decl: &VarDecl) {
        for d in &decl.declarators {
            if let Some(init) = &d.init {
                self.walk_expr(init);
            }
            self.walk_pattern(&d.pattern);

            // `const f = () => {}` names its function statically
            if self.declaring() && decl.kind == VarKind::Const {
                if let (Pattern::Ident(name), Some(init)) = (&d.pattern, &d.init) {
                    let decl_id = match &init.kind {
                        ExprKind::Function(f) => self.function_decl_id(FunctionKey::of_function(f.as_ref())),
                        ExprKind::Class(c) => self.tree.class_id(c.as_ref()).cloned(),
                        _ => None,
                    };
                    self.set_decl(name, decl_id);
                }
            }
        }
    }

    fn walk_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(name) => self.reference(name),
            Pattern::Array { elements, rest } => {
                for elem in elements.iter().flatten() {
                    if let Some(default) = &elem.default {
                        self.walk_expr(default);
                    }
                    self.walk_pattern(&elem.pattern);
                }
                if let Some(rest) = rest {
                    self.walk_pattern(rest);
                }
            }
            Pattern::Object { props, rest } => {
                for prop in props {
                    if let Some(default) = &prop.default {
                        self.walk_expr(default);
                    }
                    self.walk_pattern(&prop.value);
                }
                if let Some(rest) = rest {
                    self.walk_pattern(rest);
                }
            }
            Pattern::Expr(e) => self.walk_expr(e),
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.reference(name),
            ExprKind::This | ExprKind::Super | ExprKind::Literal(_) | ExprKind::Unsupported(_) => {}
            ExprKind::Array(elems) => {
                for e in elems.iter().flatten() {
                    self.walk_expr(e);
                }
            }
            ExprKind::Object(props) => {
                for prop in props {
                    match prop {
                        Property::KeyValue { key, value } => {
                            if let PropKey::Computed(k) = key {
                                self.walk_expr(k);
                            }
                            self.walk_expr(value);
                        }
                        Property::Spread(e) => self.walk_expr(e),
                    }
                }
            }
            ExprKind::Member { object, .. } => self.walk_expr(object),
            ExprKind::Index { object, index } => {
                self.walk_expr(object);
                self.walk_expr(index);
            }
            ExprKind::Call { callee, args, .. } | ExprKind::New { callee, args } => {
                self.walk_expr(callee);
                for a in args {
                    self.walk_expr(a);
                }
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }
            ExprKind::Unary { arg, .. }
            | ExprKind::Update { arg, .. }
            | ExprKind::Await(arg)
            | ExprKind::Spread(arg) => self.walk_expr(arg),
            ExprKind::Assign { target, value, .. } => {
                self.walk_pattern(target);
                self.walk_expr(value);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.walk_expr(test);
                self.walk_expr(consequent);
                self.walk_expr(alternate);
            }
            ExprKind::Function(f) => {
                let name = if f.is_arrow { None } else { f.name.clone() };
                self.walk_function_expr(f, name);
            }
            ExprKind::Class(c) => self.walk_class(c),
            ExprKind::Yield { arg, .. } => {
                if let Some(arg) = arg {
                    self.walk_expr(arg);
                }
            }
            ExprKind::Template { exprs, .. } | ExprKind::Sequence(exprs) => {
                for e in exprs {
                    self.walk_expr(e);
                }
            }
        }
    }

    /// Named function expressions bind their own name inside themselves
    fn walk_function_expr(&mut self, f: &FunctionDef, name: Option<String>) {
        let key = FunctionKey::of_function(f);
        let component = match &name {
            Some(n) => n.clone(),
            None if self.declaring() => self.names.next_anonymous(),
            None => String::new(),
        };
        self.in_function(key, component, |w| {
            if let Some(name) = &name {
                w.declare(name, BindingKind::SelfRef);
                if w.declaring() {
                    let decl = w.function_decl_id(key);
                    w.set_decl(name, decl);
                }
            }
            w.walk_function_body(f);
        });
    }

    fn walk_function(&mut self, f: &FunctionDef, name: Option<String>) -> FunctionKey {
        let key = FunctionKey::of_function(f);
        let component = match name {
            Some(n) => n,
            None if self.declaring() => self.names.next_anonymous(),
            None => String::new(),
        };
        self.in_function(key, component, |w| w.walk_function_body(f));
        key
    }

    fn walk_params(&mut self, params: &[Param]) {
        for p in params {
            self.declare_pattern(&p.pattern, BindingKind::Param);
        }
        for p in params {
            if let Some(default) = &p.default {
                self.walk_expr(default);
            }
            self.walk_pattern(&p.pattern);
        }
    }

    fn walk_function_body(&mut self, f: &FunctionDef) {
        self.walk_params(&f.params);
        self.hoist_vars(&f.body);
        self.walk_stmt_list(&f.body);
    }

    fn walk_class(&mut self, class: &ClassDef) {
        if let Some(extends) = &class.extends {
            self.walk_expr(extends);
        }

        let component = if self.declaring() {
            let component = match &class.name {
                Some(name) => name.clone(),
                None => self.names.next_anonymous_class(),
            };
            let qualified = self.unique_qualified(&component);
            let decl_id = IdGenerator::decl_id(&self.tree.file_path, &qualified);
            let extends = class.extends.as_ref().and_then(|e| e.dotted_path());
            let has_static_fields = class
                .members
                .iter()
                .any(|m| matches!(m, ClassMember::Field(f) if f.is_static));
            let methods = class
                .members
                .iter()
                .filter_map(|m| match m {
                    ClassMember::Method(method) => Some(MethodScope {
                        name: method.name.clone(),
                        key: FunctionKey::of_function(&method.function),
                        is_static: method.is_static,
                    }),
                    _ => None,
                })
                .collect();
            self.tree.add_class(
                class,
                ClassScope {
                    decl_id,
                    name: component.clone(),
                    scope: self.current,
                    dynamic_extends: class.extends.is_some() && extends.is_none(),
                    extends,
                    constructor: FunctionKey::constructor_of(class),
                    static_init: has_static_fields.then(|| FunctionKey::static_init_of(class)),
                    methods,
                },
            );
            self.names.push(component.clone());
            Some(component)
        } else {
            None
        };

        let ctor = class.constructor();
        self.in_function(FunctionKey::constructor_of(class), "constructor".to_string(), |w| {
            if let Some(ctor) = ctor {
                w.walk_params(&ctor.params);
                w.hoist_vars(&ctor.body);
            }
            for member in &class.members {
                if let ClassMember::Field(field) = member {
                    if !field.is_static {
                        if let Some(init) = &field.init {
                            w.walk_expr(init);
                        }
                    }
                }
            }
            if let Some(ctor) = ctor {
                w.walk_stmt_list(&ctor.body);
            }
        });

        for member in &class.members {
            if let ClassMember::Method(method) = member {
                self.walk_function(&method.function, Some(method.name.clone()));
            }
        }

        let has_static_fields = class
            .members
            .iter()
            .any(|m| matches!(m, ClassMember::Field(f) if f.is_static));
        if has_static_fields {
            self.in_function(FunctionKey::static_init_of(class), "%statInit".to_string(), |w| {
                for member in &class.members {
                    if let ClassMember::Field(field) = member {
                        if field.is_static {
                            if let Some(init) = &field.init {
                                w.walk_expr(init);
                            }
                        }
                    }
                }
            });
        }

        if component.is_some() {
            self.names.pop();
        }
    }
}

fn binding_kind(kind: VarKind) -> BindingKind {
    match kind {
        VarKind::Var => BindingKind::Var,
        VarKind::Let => BindingKind::Let,
        VarKind::Const => BindingKind::Const,
    }
}

/// `var` names declared anywhere in `stmt`, nested functions excluded
fn collect_vars(stmt: &Stmt, out: &mut Vec<String>) {
    fn push_decl(decl: &VarDecl, out: &mut Vec<String>) {
        if decl.kind == VarKind::Var {
            for d in &decl.declarators {
                out.extend(d.pattern.bound_names().into_iter().map(str::to_string));
            }
        }
    }
    match &stmt.kind {
        StmtKind::VarDecl(decl) => push_decl(decl, out),
        StmtKind::If {
            consequent,
            alternate,
            ..
        } => {
            collect_vars(consequent, out);
            if let Some(alt) = alternate {
                collect_vars(alt, out);
            }
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } | StmtKind::Labeled { body, .. } => {
            collect_vars(body, out)
        }
        StmtKind::For { init, body, .. } => {
            if let Some(ForInit::VarDecl(decl)) = init {
                push_decl(decl, out);
            }
            collect_vars(body, out);
        }
        StmtKind::ForOf { head, body, .. } | StmtKind::ForIn { head, body, .. } => {
            if head.kind == Some(VarKind::Var) {
                out.extend(head.pattern.bound_names().into_iter().map(str::to_string));
            }
            collect_vars(body, out);
        }
        StmtKind::Block(stmts) => stmts.iter().for_each(|s| collect_vars(s, out)),
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            block.iter().for_each(|s| collect_vars(s, out));
            if let Some(clause) = handler {
                clause.body.iter().for_each(|s| collect_vars(s, out));
            }
            if let Some(finalizer) = finalizer {
                finalizer.iter().for_each(|s| collect_vars(s, out));
            }
        }
        StmtKind::Switch { cases, .. } => {
            for case in cases {
                case.body.iter().for_each(|s| collect_vars(s, out));
            }
        }
        StmtKind::Export(ExportDecl::Decl(inner)) => collect_vars(inner, out),
        _ => {}
    }
}

/// Lay out environments once every capture is known
fn finalize(tree: &mut ScopeTree) {
    // Storage scope of each captured binding
    for idx in 0..tree.bindings.len() {
        if !tree.bindings[idx].captured {
            continue;
        }
        let mut scope = tree.bindings[idx].scope;
        loop {
            let s = &tree.scopes[scope.0];
            if s.kind == ScopeKind::Loop || s.kind.is_function_like() {
                break;
            }
            match s.parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        let per_iteration = tree.scopes[scope.0].kind == ScopeKind::Loop;
        let binding = &mut tree.bindings[idx];
        binding.env_scope = Some(scope);
        binding.per_iteration = per_iteration;
    }

    // Environment locals, numbered per function in scope order
    let owners: AHashSet<ScopeId> = tree.bindings.iter().filter_map(|b| b.env_scope).collect();
    let mut counters: AHashMap<ScopeId, u32> = AHashMap::new();
    for idx in 0..tree.scopes.len() {
        let id = ScopeId(idx);
        if !owners.contains(&id) {
            continue;
        }
        let counter = counters.entry(tree.scopes[idx].function).or_insert(0);
        tree.scopes[idx].env_local = Some(format!("%env{}", counter));
        *counter += 1;
    }

    // Parent links
    for idx in 0..tree.scopes.len() {
        if tree.scopes[idx].env_local.is_none() {
            continue;
        }
        let id = ScopeId(idx);
        let function = tree.scopes[idx].function;
        let parent = match tree.env_parent_scope(id) {
            None => EnvParent::None,
            Some(p) if tree.scopes[p.0].function == function => {
                EnvParent::Env(tree.scopes[p.0].env_local.clone().unwrap_or_default())
            }
            Some(_) => {
                let has_closures = tree
                    .function_by_scope(function)
                    .map(|f| f.has_closures())
                    .unwrap_or(false);
                if has_closures {
                    EnvParent::Closures
                } else {
                    EnvParent::None
                }
            }
        };
        tree.scopes[idx].env = Some(parent);
    }

    // Closure anchors and capture hops
    for idx in 0..tree.functions.len() {
        let scope = tree.functions[idx].scope;
        let anchor = tree.env_parent_scope(scope);
        let captures: Vec<Capture> = tree.functions[idx]
            .captures
            .iter()
            .map(|c| {
                let binding = &tree.bindings[c.binding.0];
                let hops = match (anchor, binding.env_scope) {
                    (Some(from), Some(to)) => tree.hops_between(from, to).unwrap_or(0),
                    _ => 0,
                };
                Capture {
                    per_iteration: binding.per_iteration,
                    hops,
                    ..c.clone()
                }
            })
            .collect();
        let function = &mut tree.functions[idx];
        function.anchor = anchor;
        function.captures = captures;
    }

    // Shadowed locals get a `%n` suffix within their function
    let mut seen: AHashMap<(ScopeId, String), u32> = AHashMap::new();
    for idx in 0..tree.bindings.len() {
        let scope = tree.bindings[idx].scope;
        if tree.scopes[scope.0].kind == ScopeKind::Module {
            continue;
        }
        let function = tree.scopes[scope.0].function;
        let name = tree.bindings[idx].name.clone();
        let count = seen.entry((function, name.clone())).or_insert(0);
        if *count > 0 {
            tree.bindings[idx].local_name = format!("{}%{}", name, count);
        }
        *count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::closure_resolution::domain::Storage;
    use crate::features::parsing::{SourceParser, TypeScriptParser};

    fn resolve(source: &str) -> (SourceUnit, ScopeTree) {
        let unit = TypeScriptParser::new().parse(source, "t.ets").unwrap();
        let tree = ScopeResolver::resolve(&unit);
        (unit, tree)
    }

    fn captures_of<'a>(tree: &'a ScopeTree, qualified: &str) -> Vec<&'a str> {
        let id = IdGenerator::decl_id("t.ets", qualified);
        tree.functions()
            .iter()
            .find(|f| f.decl_id == id)
            .map(|f| f.captures.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_else(|| panic!("no function {}", qualified))
    }

    #[test]
    fn test_single_outer_variable() {
        let (_, tree) = resolve("function outer() { let x = 1; let y = 2; function inner() { return x; } }");
        assert_eq!(captures_of(&tree, "outer.inner"), vec!["x"]);
        assert!(captures_of(&tree, "outer").is_empty());
    }

    #[test]
    fn test_module_bindings_are_not_captured() {
        let (_, tree) = resolve("let g = 1; function f() { return g; }");
        assert!(captures_of(&tree, "f").is_empty());
        let g = tree.lookup(tree.module_scope(), "g").unwrap();
        assert_eq!(tree.storage(g, tree.module_scope()), Storage::Global("g".to_string()));
    }

    #[test]
    fn test_transitive_capture_through_middle_function() {
        let (_, tree) = resolve(
            "function a() { let v = 0; function b() { function c() { v = v + 1; } } }",
        );
        assert_eq!(captures_of(&tree, "a.b.c"), vec!["v"]);
        assert_eq!(captures_of(&tree, "a.b"), vec!["v"]);
        let c = tree
            .functions()
            .iter()
            .find(|f| f.name == "c")
            .unwrap();
        assert_eq!(c.captures[0].hops, 0);
    }

    #[test]
    fn test_loop_binding_is_per_iteration() {
        let (_, tree) = resolve(
            "function f() { const fns = []; for (let i = 0; i < 3; i++) { fns.push(() => i); } var j = 0; return () => j; }",
        );
        let sets = tree.capture_sets();
        let arrow_i = sets.iter().find(|s| s.contains("i")).unwrap();
        assert!(arrow_i.captures[0].per_iteration);
        let arrow_j = sets.iter().find(|s| s.contains("j")).unwrap();
        assert!(!arrow_j.captures[0].per_iteration);
    }

    #[test]
    fn test_identical_source_gets_distinct_identities() {
        let (_, tree) = resolve(
            "function p() { let x = 1; return () => x; }\nfunction q() { let x = 2; return () => x; }",
        );
        let anon: Vec<_> = tree
            .functions()
            .iter()
            .filter(|f| f.name.starts_with("%AM"))
            .map(|f| f.decl_id.clone())
            .collect();
        assert_eq!(anon.len(), 2);
        assert_ne!(anon[0], anon[1]);
        assert_ne!(
            tree.functions().iter().find(|f| f.decl_id == anon[0]).unwrap().captures[0].binding,
            tree.functions().iter().find(|f| f.decl_id == anon[1]).unwrap().captures[0].binding,
        );
    }

    #[test]
    fn test_shadowed_locals_are_renamed() {
        let (_, tree) = resolve("function f() { let x = 1; { let x = 2; } }");
        let locals: Vec<_> = tree
            .bindings()
            .iter()
            .filter(|b| b.name == "x")
            .map(|b| b.local_name.as_str())
            .collect();
        assert_eq!(locals, vec!["x", "x%1"]);
    }

    #[test]
    fn test_var_hoisting_and_const_arrow_decl() {
        let (_, tree) = resolve("function f() { { var v = 1; } const g = () => v; }");
        assert!(tree.lookup(tree.module_scope(), "v").is_none());
        let v = tree.bindings().iter().find(|b| b.name == "v").unwrap();
        assert_eq!(tree.scope(v.scope).kind, ScopeKind::Function);
        let g = tree.bindings().iter().find(|b| b.name == "g").unwrap();
        assert_eq!(g.decl.as_deref(), Some("@t.ets: f.%AM0$f"));
    }

    #[test]
    fn test_class_member_ids() {
        let (_, tree) = resolve("class A { static s = 1; m() {} constructor() {} }");
        let ids: Vec<_> = tree.functions().iter().map(|f| f.decl_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["@t.ets: %dflt", "@t.ets: A.constructor", "@t.ets: A.m", "@t.ets: A.%statInit"]
        );
    }

    #[test]
    fn test_class_extends_paths() {
        let (_, tree) = resolve(
            "class A {}\nclass B extends A {}\nclass C extends ns.Base {}\nclass D extends mixin(A) {}",
        );
        let extends: Vec<_> = tree
            .classes()
            .iter()
            .map(|c| (c.name.as_str(), c.extends.clone(), c.dynamic_extends))
            .collect();
        assert_eq!(
            extends,
            vec![
                ("A", None, false),
                ("B", Some(vec!["A".to_string()]), false),
                ("C", Some(vec!["ns".to_string(), "Base".to_string()]), false),
                ("D", None, true),
            ]
        );
    }
}
