//! Statement lowering for one function body
//!
//! A [`FunctionLowerer`] owns the [`BodyBuilder`] of a single function and
//! walks its statements in the same scopes the resolver created, so every
//! identifier maps to the storage the resolver laid out.
//!
//! Structured control flow becomes labels and jumps. `break`/`continue`
//! targets and pending `finally` bodies live on one frame stack: a jump that
//! leaves protected regions inlines each `finally` on the way out, with the
//! traps of those regions suspended around the copy.

use crate::features::closure_resolution::{FunctionKey, ScopeId, ScopeKey, Storage};
use crate::features::ir_generation::domain::{
    Condition, DeclRef, EnvOperand, ExportEntry, ExportTarget, ImportEntry, IrBody, IrStmt, Label,
    Operand, Place, RefKind, Rvalue, CLOSURES_LOCAL, PARENT_FIELD,
};
use crate::features::parsing::domain::{
    BinaryOp, CatchClause, ExportDecl, Expr, ExprKind, ForHead, ForInit, FunctionDef, ImportSpecifier,
    Param, Pattern, Stmt, StmtKind, SwitchCase, VarDecl, VarKind,
};
use crate::shared::models::{DeclId, Diagnostic, DiagnosticKind, Severity, Span};

use super::builder::BodyBuilder;
use super::context::{Job, ModuleContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JumpKind {
    Loop,
    Switch,
    Block,
}

enum Frame<'u> {
    Jump {
        kind: JumpKind,
        labels: Vec<String>,
        break_to: Label,
        continue_to: Option<Label>,
    },
    Finally {
        body: &'u Vec<Stmt>,
        /// Open traps outside the protected region
        trap_depth: usize,
    },
}

pub(super) struct FunctionLowerer<'a, 'u> {
    pub(super) cx: &'a mut ModuleContext<'u>,
    pub(super) b: BodyBuilder,
    pub(super) id: DeclId,
    pub(super) scope: ScopeId,
    /// Class of `this` in methods and constructors
    pub(super) this_class: Option<DeclRef>,
    frames: Vec<Frame<'u>>,
    pending_labels: Vec<String>,
}

impl<'a, 'u> FunctionLowerer<'a, 'u> {
    pub fn new(cx: &'a mut ModuleContext<'u>, id: DeclId, scope: ScopeId) -> Self {
        Self {
            cx,
            b: BodyBuilder::new(),
            id,
            scope,
            this_class: None,
            frames: Vec::new(),
            pending_labels: Vec::new(),
        }
    }

    pub fn finish(self) -> IrBody {
        self.b.finish()
    }

    pub fn diag(&mut self, diagnostic: Diagnostic) {
        let diagnostic = diagnostic.in_function(self.id.clone());
        self.cx.diag(diagnostic);
    }

    pub fn unsupported(&mut self, what: &str, span: Span) {
        self.diag(Diagnostic::unsupported(format!("{} is not lowered", what), span));
    }

    pub fn depend(&mut self, to: DeclRef, kind: RefKind) {
        let from = self.id.clone();
        self.cx.depend(&from, to, kind);
    }

    /// Run `f` inside `scope` (unchanged when the resolver has no scope for it)
    pub fn with_scope<R>(&mut self, scope: Option<ScopeId>, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.scope;
        if let Some(scope) = scope {
            self.scope = scope;
        }
        let result = f(self);
        self.scope = saved;
        result
    }

    pub fn scope_of(&self, key: ScopeKey) -> Option<ScopeId> {
        self.cx.tree.scope_for(key)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════════════════

    /// `%closures` followed by `hops` parent links
    pub fn env_chain(&mut self, hops: u32) -> Operand {
        let mut env = Operand::local(CLOSURES_LOCAL);
        for _ in 0..hops {
            env = self.b.to_temp(Rvalue::Field {
                base: env,
                field: PARENT_FIELD.to_string(),
            });
        }
        env
    }

    /// Read the binding `name` visible from the current scope
    pub fn load(&mut self, name: &str) -> Operand {
        match self.cx.tree.resolve(self.scope, name) {
            Storage::Global(n) => Operand::Global(n),
            Storage::Local(n) => Operand::Local(n),
            Storage::Env { env_local, field } => self.b.to_temp(Rvalue::Field {
                base: Operand::Local(env_local),
                field,
            }),
            Storage::Captured { hops, field } => {
                let base = self.env_chain(hops);
                self.b.to_temp(Rvalue::Field { base, field })
            }
        }
    }

    /// Write `value` to the binding `name` visible from the current scope
    pub fn store(&mut self, name: &str, value: Rvalue) {
        match self.cx.tree.resolve(self.scope, name) {
            Storage::Global(n) => self.b.assign(Place::Global(n), value),
            Storage::Local(n) => self.b.assign(Place::Local(n), value),
            Storage::Env { env_local, field } => {
                let value = self.b.to_temp(value);
                self.b.assign(
                    Place::Field {
                        base: Operand::Local(env_local),
                        field,
                    },
                    Rvalue::Use(value),
                );
            }
            Storage::Captured { hops, field } => {
                let value = self.b.to_temp(value);
                let base = self.env_chain(hops);
                self.b.assign(Place::Field { base, field }, Rvalue::Use(value));
            }
        }
    }

    /// Name of `name`'s binding inside this function (`x`, `x%1`)
    pub fn local_name(&self, name: &str) -> String {
        self.cx
            .tree
            .lookup(self.scope, name)
            .map(|b| self.cx.tree.binding(b).local_name.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn binding_type(&self, name: &str) -> Option<DeclRef> {
        let binding = self.cx.tree.lookup(self.scope, name)?;
        self.cx.binding_types.get(&binding).cloned()
    }

    pub fn set_binding_type(&mut self, name: &str, ty: Option<DeclRef>) {
        if !self.cx.config.track_types {
            return;
        }
        if let (Some(ty), Some(binding)) = (ty, self.cx.tree.lookup(self.scope, name)) {
            self.cx.binding_types.insert(binding, ty);
        }
    }

    /// Class named by an annotation; also records the type reference
    pub fn annotation_type(&mut self, annotation: Option<&String>) -> Option<DeclRef> {
        let resolved = self.cx.resolve_annotation(self.scope, annotation?)?;
        self.depend(resolved.clone(), RefKind::TypeRef);
        Some(resolved)
    }

    /// Allocate the environment owned by `scope`, if any
    pub fn enter_env(&mut self, scope: ScopeId) {
        let Some((local, parent)) = self.cx.tree.env_of(scope) else {
            return;
        };
        let place = Place::Local(local.to_string());
        let parent = parent.as_env_ref().map(EnvOperand::from);
        self.b.assign(place, Rvalue::NewEnv(parent));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Prologue
    // ═══════════════════════════════════════════════════════════════════════

    /// `%closures = parameter0` and the function-scope environment
    pub fn prologue(&mut self, has_closures: bool) {
        if has_closures {
            self.b
                .assign(Place::Local(CLOSURES_LOCAL.to_string()), Rvalue::Parameter(0));
        }
        self.enter_env(self.scope);
    }

    /// Bind parameters; user parameters start at `offset`
    pub fn lower_params(&mut self, params: &'u [Param], offset: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let index = i + offset;
            let ty = self.annotation_type(param.type_ann.as_ref());
            match (&param.pattern, &param.default) {
                (Pattern::Ident(name), None) => {
                    names.push(self.local_name(name));
                    self.store(name, Rvalue::Parameter(index));
                    if !param.rest {
                        self.set_binding_type(name, ty);
                    }
                }
                (pattern, default) => {
                    names.push(match pattern {
                        Pattern::Ident(name) => self.local_name(name),
                        _ => format!("%arg{}", i),
                    });
                    let value = self.b.to_temp(Rvalue::Parameter(index));
                    let value = self.with_default(value, default.as_ref());
                    self.bind_pattern(pattern, value);
                    if let Pattern::Ident(name) = pattern {
                        self.set_binding_type(name, ty);
                    }
                }
            }
        }
        names
    }

    /// A named function expression sees itself under its own name
    pub fn bind_self_ref(&mut self, def: &'u FunctionDef) {
        let Some(name) = def.name.as_deref().filter(|_| !def.is_arrow) else {
            return;
        };
        let Some(binding) = self.cx.tree.lookup(self.scope, name) else {
            return;
        };
        let binding = self.cx.tree.binding(binding);
        if binding.scope != self.scope || !binding.referenced {
            return;
        }
        let key = FunctionKey::of_function(def);
        let env = self.cx.tree.closure_env(key, self.scope).map(EnvOperand::from);
        self.store(
            name,
            Rvalue::Closure {
                function: self.id.clone(),
                env,
            },
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statement lists
    // ═══════════════════════════════════════════════════════════════════════

    /// Statement list opening a scope: hoisted functions first
    pub fn lower_block_list(&mut self, stmts: &'u [Stmt]) {
        self.hoist_functions(stmts);
        self.lower_stmt_list(stmts);
    }

    pub fn lower_stmt_list(&mut self, stmts: &'u [Stmt]) {
        for stmt in stmts {
            if stmt.is_hoisted_declaration() || matches!(stmt.kind, StmtKind::Empty) {
                continue;
            }
            if !self.b.is_reachable() {
                if self.cx.config.report_unreachable {
                    self.diag(Diagnostic::unreachable(stmt.span));
                }
                break;
            }
            self.lower_stmt(stmt);
        }
    }

    /// Function declarations are bound to closures at the top of their list
    fn hoist_functions(&mut self, stmts: &'u [Stmt]) {
        for stmt in stmts {
            let def = match &stmt.kind {
                StmtKind::Function(def) => def,
                StmtKind::Export(ExportDecl::Decl(inner) | ExportDecl::Default(inner)) => {
                    match &inner.kind {
                        StmtKind::Function(def) => def,
                        _ => continue,
                    }
                }
                _ => continue,
            };
            let Some(name) = &def.name else {
                self.cx.enqueue(Job::Function(def));
                continue;
            };
            self.b.set_span(stmt.span);
            let value = self.closure_value(def, false);
            self.store(name, value);
        }
    }

    /// Closure over `def` created in the current scope
    pub fn closure_value(&mut self, def: &'u FunctionDef, as_value: bool) -> Rvalue {
        let key = FunctionKey::of_function(def);
        self.cx.enqueue(Job::Function(def));
        let Some(id) = self.cx.function_id(key) else {
            self.unsupported("function outside the scope tree", def.span);
            return Rvalue::Use(Operand::Unknown);
        };
        if as_value {
            self.depend(DeclRef::Decl(id.clone()), RefKind::Value);
        }
        let env = self.cx.tree.closure_env(key, self.scope).map(EnvOperand::from);
        Rvalue::Closure { function: id, env }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    pub fn lower_stmt(&mut self, stmt: &'u Stmt) {
        self.b.set_span(stmt.span);
        #[cfg(feature = "trace")]
        tracing::trace!(span = %stmt.span, next = self.b.len(), "Lowering statement");
        match &stmt.kind {
            StmtKind::VarDecl(decl) => self.lower_var_decl(decl),
            StmtKind::Function(_) | StmtKind::Empty => {}
            StmtKind::Class(class) => {
                self.lower_class(class, true);
            }
            StmtKind::Expr(e) => self.lower_expr_stmt(e),
            StmtKind::Return(arg) => self.lower_return(arg.as_ref()),
            StmtKind::Throw(e) => {
                let value = self.lower_expr(e);
                self.b.emit(IrStmt::Throw(value));
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => self.lower_if(test, consequent, alternate.as_deref()),
            StmtKind::While { test, body } => self.lower_while(stmt, test, body),
            StmtKind::DoWhile { body, test } => self.lower_do_while(stmt, body, test),
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => self.lower_for(stmt, init.as_ref(), test.as_ref(), update.as_ref(), body),
            StmtKind::ForOf { head, right, body } => self.lower_for_of(stmt, head, right, body, false),
            StmtKind::ForIn { head, right, body } => self.lower_for_of(stmt, head, right, body, true),
            StmtKind::Block(stmts) => {
                let scope = self.scope_of(ScopeKey::block(stmt));
                self.with_scope(scope, |lw| lw.lower_block_list(stmts));
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => self.lower_try(block, handler.as_ref(), finalizer.as_ref()),
            StmtKind::Switch {
                discriminant,
                cases,
            } => self.lower_switch(stmt, discriminant, cases),
            StmtKind::Break(label) => self.lower_jump(label.as_deref(), false, stmt.span),
            StmtKind::Continue(label) => self.lower_jump(label.as_deref(), true, stmt.span),
            StmtKind::Labeled { label, body } => self.lower_labeled(label, body),
            StmtKind::Import(import) => {
                for spec in &import.specifiers {
                    let imported = match spec {
                        ImportSpecifier::Named { imported, .. } => imported.clone(),
                        ImportSpecifier::Default(_) => "default".to_string(),
                        ImportSpecifier::Namespace(_) => "*".to_string(),
                    };
                    self.cx.imports.push(ImportEntry {
                        local: spec.local().to_string(),
                        module: import.source.clone(),
                        imported,
                    });
                }
            }
            StmtKind::Export(export) => self.lower_export(export),
            StmtKind::Unsupported(text) => self.unsupported(&format!("statement `{}`", text), stmt.span),
        }
    }

    fn lower_var_decl(&mut self, decl: &'u VarDecl) {
        for d in &decl.declarators {
            self.b.set_span(d.span);
            let annotated = self.annotation_type(d.type_ann.as_ref());
            match (&d.pattern, &d.init) {
                (Pattern::Ident(name), Some(init)) => {
                    let ty = annotated.or_else(|| self.static_type(init));
                    let value = self.lower_rvalue(init);
                    self.store(name, value);
                    self.set_binding_type(name, ty);
                }
                (Pattern::Ident(name), None) => {
                    if decl.kind != VarKind::Var {
                        self.store(name, Rvalue::Use(Operand::undefined()));
                    }
                    self.set_binding_type(name, annotated);
                }
                (pattern, Some(init)) => {
                    let value = self.lower_expr(init);
                    self.bind_pattern(pattern, value);
                }
                (_, None) => self.unsupported("destructuring declaration without initializer", d.span),
            }
        }
    }

    fn lower_return(&mut self, arg: Option<&'u Expr>) {
        let mut value = arg.map(|e| self.lower_expr(e));
        if self.has_finally() {
            value = value.map(|v| self.pin(v));
        }
        let suspended = self.unwind(0);
        self.b.emit(IrStmt::Return(value));
        self.resume(suspended);
    }

    /// Copy a named value into a temporary so later code cannot change it
    pub fn pin(&mut self, value: Operand) -> Operand {
        match value {
            Operand::Temp(_) | Operand::Const(_) | Operand::This | Operand::Unknown => value,
            other => {
                let t = self.b.temp();
                self.b.assign(Place::Temp(t), Rvalue::Use(other));
                Operand::Temp(t)
            }
        }
    }

    fn lower_if(&mut self, test: &'u Expr, consequent: &'u Stmt, alternate: Option<&'u Stmt>) {
        let then_l = self.b.label();
        let end = self.b.label();
        match alternate {
            Some(alternate) => {
                let else_l = self.b.label();
                self.lower_cond(test, then_l, else_l);
                self.b.bind(then_l);
                self.lower_stmt(consequent);
                self.b.goto(end);
                self.b.bind(else_l);
                self.lower_stmt(alternate);
            }
            None => {
                self.lower_cond(test, then_l, end);
                self.b.bind(then_l);
                self.lower_stmt(consequent);
            }
        }
        self.b.bind(end);
    }

    // ── loops ──────────────────────────────────────────────────────────────

    fn push_loop(&mut self, break_to: Label, continue_to: Label) {
        let labels = std::mem::take(&mut self.pending_labels);
        self.frames.push(Frame::Jump {
            kind: JumpKind::Loop,
            labels,
            break_to,
            continue_to: Some(continue_to),
        });
    }

    fn lower_loop_body(&mut self, body: &'u Stmt, break_to: Label, continue_to: Label) {
        self.push_loop(break_to, continue_to);
        self.lower_stmt(body);
        self.frames.pop();
    }

    fn lower_while(&mut self, stmt: &'u Stmt, test: &'u Expr, body: &'u Stmt) {
        let scope = self.scope_of(ScopeKey::looping(stmt));
        self.with_scope(scope, |lw| {
            let head = lw.b.label();
            let body_l = lw.b.label();
            let exit = lw.b.label();
            lw.b.bind(head);
            lw.lower_cond(test, body_l, exit);
            lw.b.bind(body_l);
            lw.enter_env(lw.scope);
            lw.lower_loop_body(body, exit, head);
            lw.b.goto(head);
            lw.b.bind(exit);
        });
    }

    fn lower_do_while(&mut self, stmt: &'u Stmt, body: &'u Stmt, test: &'u Expr) {
        let scope = self.scope_of(ScopeKey::looping(stmt));
        self.with_scope(scope, |lw| {
            let body_l = lw.b.label();
            let test_l = lw.b.label();
            let exit = lw.b.label();
            lw.b.bind(body_l);
            lw.enter_env(lw.scope);
            lw.lower_loop_body(body, exit, test_l);
            lw.b.bind(test_l);
            lw.lower_cond(test, body_l, exit);
            lw.b.bind(exit);
        });
    }

    fn lower_for(
        &mut self,
        stmt: &'u Stmt,
        init: Option<&'u ForInit>,
        test: Option<&'u Expr>,
        update: Option<&'u Expr>,
        body: &'u Stmt,
    ) {
        let scope = self.scope_of(ScopeKey::looping(stmt));
        self.with_scope(scope, |lw| {
            lw.enter_env(lw.scope);
            match init {
                Some(ForInit::VarDecl(decl)) => lw.lower_var_decl(decl),
                Some(ForInit::Expr(e)) => lw.lower_expr_stmt(e),
                None => {}
            }
            let head = lw.b.label();
            let body_l = lw.b.label();
            let latch = lw.b.label();
            let exit = lw.b.label();
            lw.b.bind(head);
            if let Some(test) = test {
                lw.lower_cond(test, body_l, exit);
                lw.b.bind(body_l);
            }
            lw.lower_loop_body(body, exit, latch);
            lw.b.bind(latch);
            lw.renew_loop_env();
            if let Some(update) = update {
                lw.lower_expr_stmt(update);
            }
            lw.b.goto(head);
            lw.b.bind(exit);
        });
    }

    /// Fresh environment for the next iteration, header bindings copied forward
    fn renew_loop_env(&mut self) {
        let Some((local, parent)) = self.cx.tree.env_of(self.scope) else {
            return;
        };
        let env = Operand::local(local);
        let parent = parent.as_env_ref().map(EnvOperand::from);
        let fields: Vec<String> = self
            .cx
            .tree
            .per_iteration_bindings(self.scope)
            .into_iter()
            .map(|b| self.cx.tree.binding(b).local_name.clone())
            .collect();
        let saved: Vec<(String, Operand)> = fields
            .into_iter()
            .map(|field| {
                let value = self.b.to_temp(Rvalue::Field {
                    base: env.clone(),
                    field: field.clone(),
                });
                (field, value)
            })
            .collect();
        self.b.assign(Place::Local(local.to_string()), Rvalue::NewEnv(parent));
        for (field, value) in saved {
            self.b.assign(
                Place::Field {
                    base: env.clone(),
                    field,
                },
                Rvalue::Use(value),
            );
        }
    }

    /// `for…of` / `for…in` through the iterator protocol
    ///
    /// The iterator is created before the loop; the header block calls
    /// `next()` and tests `done`; the body block reads `value` and binds the
    /// loop variables.
    fn lower_for_of(&mut self, stmt: &'u Stmt, head: &'u ForHead, right: &'u Expr, body: &'u Stmt, keys: bool) {
        let target = self.lower_expr(right);
        let iterable = if keys {
            let call = self.unknown_member_call(Operand::Global("Object".to_string()), "keys", vec![target]);
            self.b.to_temp(Rvalue::Call(call))
        } else {
            target
        };

        let scope = self.scope_of(ScopeKey::looping(stmt));
        self.with_scope(scope, |lw| {
            let call = lw.unknown_member_call(iterable, "iterator", Vec::new());
            let iterator = lw.b.to_temp(Rvalue::Call(call));

            let head_l = lw.b.label();
            let body_l = lw.b.label();
            let exit = lw.b.label();
            lw.b.bind(head_l);
            let call = lw.unknown_member_call(iterator, "next", Vec::new());
            let step = lw.b.to_temp(Rvalue::Call(call));
            let done = lw.b.to_temp(Rvalue::Field {
                base: step.clone(),
                field: "done".to_string(),
            });
            lw.b.branch(Condition::falsy(done), body_l, exit);

            lw.b.bind(body_l);
            lw.enter_env(lw.scope);
            let value = lw.b.to_temp(Rvalue::Field {
                base: step,
                field: "value".to_string(),
            });
            lw.bind_pattern(&head.pattern, value);
            lw.lower_loop_body(body, exit, head_l);
            lw.b.goto(head_l);
            lw.b.bind(exit);
        });
    }

    // ── switch ─────────────────────────────────────────────────────────────

    fn lower_switch(&mut self, stmt: &'u Stmt, discriminant: &'u Expr, cases: &'u [SwitchCase]) {
        let value = self.lower_expr(discriminant);
        let value = self.pin(value);
        let scope = self.scope_of(ScopeKey::block(stmt));
        self.with_scope(scope, |lw| {
            for case in cases {
                lw.hoist_functions(&case.body);
            }
            let end = lw.b.label();
            let targets: Vec<Label> = cases.iter().map(|_| lw.b.label()).collect();
            for (case, &target) in cases.iter().zip(&targets) {
                let Some(test) = &case.test else { continue };
                lw.b.set_span(case.span);
                let expected = lw.lower_expr(test);
                let next = lw.b.label();
                lw.b.branch(
                    Condition {
                        op: BinaryOp::StrictEq,
                        left: value.clone(),
                        right: expected,
                    },
                    target,
                    next,
                );
                lw.b.bind(next);
            }
            let fallback = cases
                .iter()
                .zip(&targets)
                .find(|(case, _)| case.test.is_none())
                .map(|(_, &target)| target)
                .unwrap_or(end);
            lw.b.goto(fallback);

            let labels = std::mem::take(&mut lw.pending_labels);
            lw.frames.push(Frame::Jump {
                kind: JumpKind::Switch,
                labels,
                break_to: end,
                continue_to: None,
            });
            for (case, &target) in cases.iter().zip(&targets) {
                lw.b.bind(target);
                lw.lower_stmt_list(&case.body);
            }
            lw.frames.pop();
            lw.b.bind(end);
        });
    }

    // ── try / catch / finally ──────────────────────────────────────────────

    fn lower_try(&mut self, block: &'u Vec<Stmt>, handler: Option<&'u CatchClause>, finalizer: Option<&'u Vec<Stmt>>) {
        let end = self.b.label();
        let trap_depth = self.b.open_trap_depth();

        let finally_handler = finalizer.map(|body| {
            let label = self.b.label();
            self.frames.push(Frame::Finally { body, trap_depth });
            self.b.open_trap(label);
            label
        });
        let catch_handler = handler.map(|_| {
            let label = self.b.label();
            self.b.open_trap(label);
            label
        });

        let scope = self.scope_of(ScopeKey::block(block));
        self.with_scope(scope, |lw| lw.lower_block_list(block));

        let normal = self.b.label();
        if let (Some(clause), Some(catch_l)) = (handler, catch_handler) {
            self.b.close_trap();
            self.b.goto(if finalizer.is_some() { normal } else { end });
            self.b.bind(catch_l);
            self.b.set_span(clause.span);
            self.lower_catch(clause);
        }

        if let (Some(body), Some(finally_l)) = (finalizer, finally_handler) {
            self.b.close_trap();
            self.frames.pop();
            let scope = self.scope_of(ScopeKey::block(body));

            self.b.bind(normal);
            self.with_scope(scope, |lw| lw.lower_block_list(body));
            self.b.goto(end);

            if self.b.is_referenced(finally_l) {
                self.b.bind(finally_l);
                let exception = self.b.to_temp(Rvalue::CaughtException);
                self.with_scope(scope, |lw| lw.lower_block_list(body));
                self.b.emit(IrStmt::Throw(exception));
            }
        }
        self.b.bind(end);
    }

    fn lower_catch(&mut self, clause: &'u CatchClause) {
        let scope = self.scope_of(ScopeKey::catch(clause));
        self.with_scope(scope, |lw| {
            match &clause.param {
                Some(Pattern::Ident(name)) => lw.store(name, Rvalue::CaughtException),
                Some(pattern) => {
                    let exception = lw.b.to_temp(Rvalue::CaughtException);
                    lw.bind_pattern(pattern, exception);
                }
                None => {
                    lw.b.to_temp(Rvalue::CaughtException);
                }
            }
            lw.lower_block_list(&clause.body);
        });
    }

    fn has_finally(&self) -> bool {
        self.frames.iter().any(|f| matches!(f, Frame::Finally { .. }))
    }

    /// Inline every `finally` above frame `from`, innermost first
    fn unwind(&mut self, from: usize) -> Vec<Vec<Label>> {
        let mut suspended = Vec::new();
        let mut i = self.frames.len();
        while i > from {
            i -= 1;
            let Frame::Finally { body, trap_depth } = &self.frames[i] else {
                continue;
            };
            let (body, trap_depth) = (*body, *trap_depth);
            suspended.push(self.b.suspend_traps(trap_depth));
            let outer = self.frames.split_off(i);
            let scope = self.scope_of(ScopeKey::block(body));
            self.with_scope(scope, |lw| lw.lower_block_list(body));
            self.frames.extend(outer);
        }
        suspended
    }

    fn resume(&mut self, suspended: Vec<Vec<Label>>) {
        for handlers in suspended.into_iter().rev() {
            self.b.resume_traps(handlers);
        }
    }

    // ── break / continue / labels ──────────────────────────────────────────

    fn lower_jump(&mut self, label: Option<&str>, is_continue: bool, span: Span) {
        let found = self.frames.iter().enumerate().rev().find_map(|(i, frame)| {
            let Frame::Jump {
                kind,
                labels,
                break_to,
                continue_to,
            } = frame
            else {
                return None;
            };
            let matches = match label {
                Some(label) => labels.iter().any(|l| l == label),
                None if is_continue => *kind == JumpKind::Loop,
                None => *kind != JumpKind::Block,
            };
            if !matches {
                return None;
            }
            let target = if is_continue { *continue_to } else { Some(*break_to) };
            target.map(|t| (i, t))
        });

        match found {
            Some((i, target)) => {
                let suspended = self.unwind(i + 1);
                self.b.goto(target);
                self.resume(suspended);
            }
            None => {
                let what = if is_continue { "continue" } else { "break" };
                let message = match label {
                    Some(label) => format!("`{} {}` has no enclosing target", what, label),
                    None => format!("`{}` has no enclosing target", what),
                };
                self.diag(Diagnostic::new(DiagnosticKind::OrphanJump, Severity::Warning, message, span));
            }
        }
    }

    fn lower_labeled(&mut self, label: &str, body: &'u Stmt) {
        match &body.kind {
            StmtKind::While { .. }
            | StmtKind::DoWhile { .. }
            | StmtKind::For { .. }
            | StmtKind::ForOf { .. }
            | StmtKind::ForIn { .. }
            | StmtKind::Switch { .. }
            | StmtKind::Labeled { .. } => {
                self.pending_labels.push(label.to_string());
                self.lower_stmt(body);
            }
            _ => {
                let end = self.b.label();
                let mut labels = std::mem::take(&mut self.pending_labels);
                labels.push(label.to_string());
                self.frames.push(Frame::Jump {
                    kind: JumpKind::Block,
                    labels,
                    break_to: end,
                    continue_to: None,
                });
                self.lower_stmt(body);
                self.frames.pop();
                self.b.bind(end);
            }
        }
    }

    // ── modules ────────────────────────────────────────────────────────────

    fn lower_export(&mut self, export: &'u ExportDecl) {
        match export {
            ExportDecl::Decl(inner) => {
                self.lower_stmt(inner);
                for (name, target) in self.declared_exports(inner) {
                    self.cx.exports.push(ExportEntry { name, target });
                }
            }
            ExportDecl::Default(inner) => {
                let target = match &inner.kind {
                    StmtKind::Function(def) => self
                        .cx
                        .function_id(FunctionKey::of_function(def))
                        .map(ExportTarget::Decl),
                    StmtKind::Class(class) => {
                        self.lower_stmt(inner);
                        self.cx.tree.class_id(class).cloned().map(ExportTarget::Decl)
                    }
                    StmtKind::Expr(e) => {
                        let target = self.default_export_target(e);
                        self.b.set_span(inner.span);
                        let value = self.lower_rvalue(e);
                        self.b.assign(Place::Global("%default".to_string()), value);
                        Some(target)
                    }
                    _ => {
                        self.lower_stmt(inner);
                        None
                    }
                };
                if let Some(target) = target {
                    self.cx.exports.push(ExportEntry {
                        name: "default".to_string(),
                        target,
                    });
                }
            }
            ExportDecl::Named {
                specifiers,
                source: Some(source),
            } => {
                for spec in specifiers {
                    self.cx.exports.push(ExportEntry {
                        name: spec.exported.clone(),
                        target: ExportTarget::Reexport {
                            module: source.clone(),
                            name: spec.local.clone(),
                        },
                    });
                }
            }
            ExportDecl::Named {
                specifiers,
                source: None,
            } => {
                for spec in specifiers {
                    let target = self.binding_export(&spec.local);
                    self.cx.exports.push(ExportEntry {
                        name: spec.exported.clone(),
                        target,
                    });
                }
            }
        }
    }

    /// What the module-level binding `name` exports
    fn binding_export(&self, name: &str) -> ExportTarget {
        match self.cx.resolve_path(self.scope, &[name.to_string()]) {
            DeclRef::Decl(id) => ExportTarget::Decl(id),
            DeclRef::Imported { module, name } => ExportTarget::Reexport { module, name },
            DeclRef::Unknown(_) => ExportTarget::Value(name.to_string()),
        }
    }

    fn declared_exports(&self, stmt: &'u Stmt) -> Vec<(String, ExportTarget)> {
        match &stmt.kind {
            StmtKind::Function(def) => def
                .name
                .iter()
                .map(|name| (name.clone(), self.binding_export(name)))
                .collect(),
            StmtKind::Class(class) => class
                .name
                .iter()
                .map(|name| (name.clone(), self.binding_export(name)))
                .collect(),
            StmtKind::VarDecl(decl) => decl
                .declarators
                .iter()
                .flat_map(|d| d.pattern.bound_names())
                .map(|name| (name.to_string(), self.binding_export(name)))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn default_export_target(&self, e: &'u Expr) -> ExportTarget {
        match &e.kind {
            ExprKind::Ident(name) => self.binding_export(name),
            ExprKind::Function(def) => self
                .cx
                .function_id(FunctionKey::of_function(def))
                .map(ExportTarget::Decl)
                .unwrap_or_else(|| ExportTarget::Value("default".to_string())),
            ExprKind::Class(class) => self
                .cx
                .tree
                .class_id(class)
                .cloned()
                .map(ExportTarget::Decl)
                .unwrap_or_else(|| ExportTarget::Value("default".to_string())),
            _ => ExportTarget::Value("default".to_string()),
        }
    }
}
