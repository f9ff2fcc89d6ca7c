//! Expression lowering
//!
//! Sub-expressions are evaluated left to right into temporaries. A value
//! needed by a single consumer is returned as an [`Rvalue`] so simple
//! assignments stay one statement (`x = a + b`).

use crate::features::closure_resolution::{BindingKind, Storage};
use crate::features::ir_generation::domain::{
    Condition, DeclRef, IrStmt, Label, Operand, Place, RefKind, Rvalue,
};
use crate::features::parsing::domain::{
    AssignOp, BinaryOp, Expr, ExprKind, Literal, LogicalOp, Pattern, PropKey, Property, UnaryOp,
    UpdateOp,
};
use crate::shared::models::{Diagnostic, DiagnosticKind, Severity};

use super::function::FunctionLowerer;

impl<'a, 'u> FunctionLowerer<'a, 'u> {
    /// Lower `e` to an operand, materializing computed values in a temporary
    pub fn lower_expr(&mut self, e: &'u Expr) -> Operand {
        let value = self.lower_rvalue(e);
        self.b.to_temp(value)
    }

    /// Lower `e`, copying a named operand into a temporary when a later
    /// sibling may write it before the consumer reads it
    pub fn lower_expr_before(&mut self, e: &'u Expr, later_effects: bool) -> Operand {
        let value = self.lower_expr(e);
        if later_effects {
            self.pin(value)
        } else {
            value
        }
    }

    /// Operands of `exprs` in source order, each pinned against the ones after it
    pub fn lower_ordered(&mut self, exprs: &'u [Expr]) -> Vec<Operand> {
        exprs
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let later = exprs[i + 1..].iter().any(Expr::has_side_effects);
                self.lower_expr_before(e, later)
            })
            .collect()
    }

    /// Expression evaluated for its effects only
    pub fn lower_expr_stmt(&mut self, e: &'u Expr) {
        match &e.kind {
            ExprKind::Call { callee, args, .. } => {
                let call = self.lower_call(callee, args);
                self.b.emit(IrStmt::Invoke(call));
            }
            ExprKind::Assign { op, target, value } => {
                self.lower_assign(*op, target, value);
            }
            ExprKind::Update { op, prefix, arg } => {
                self.lower_update(*op, *prefix, arg, false);
            }
            ExprKind::Sequence(exprs) => {
                for e in exprs {
                    self.lower_expr_stmt(e);
                }
            }
            _ => {
                self.lower_expr(e);
            }
        }
    }

    pub fn lower_rvalue(&mut self, e: &'u Expr) -> Rvalue {
        match &e.kind {
            ExprKind::Ident(name) => {
                self.note_value_ref(name);
                Rvalue::Use(self.load(name))
            }
            ExprKind::This | ExprKind::Super => Rvalue::Use(Operand::This),
            ExprKind::Literal(lit) => Rvalue::Use(Operand::Const(lit.clone())),
            ExprKind::Array(elements) => Rvalue::Use(self.lower_array(elements)),
            ExprKind::Object(props) => Rvalue::Use(self.lower_object(props)),
            ExprKind::Member { object, property, .. } => {
                let base = self.lower_expr(object);
                Rvalue::Field {
                    base,
                    field: property.clone(),
                }
            }
            ExprKind::Index { object, index } => {
                let base = self.lower_expr_before(object, index.has_side_effects());
                let index = self.lower_expr(index);
                Rvalue::Index { base, index }
            }
            ExprKind::Call { callee, args, .. } => Rvalue::Call(self.lower_call(callee, args)),
            ExprKind::New { callee, args } => Rvalue::Use(self.lower_new(callee, args)),
            ExprKind::Binary { op, left, right } => {
                let left = self.lower_expr_before(left, right.has_side_effects());
                if *op == BinaryOp::InstanceOf {
                    if let Some(path) = right.dotted_path() {
                        let class = self.cx.resolve_path(self.scope, &path);
                        self.depend(class, RefKind::InstanceOf);
                    }
                }
                let right = self.lower_expr(right);
                Rvalue::Binary { op: *op, left, right }
            }
            ExprKind::Logical { op, left, right } => Rvalue::Use(self.lower_logical(*op, left, right)),
            ExprKind::Unary { op, arg } => self.lower_unary(*op, arg),
            ExprKind::Update { op, prefix, arg } => Rvalue::Use(self.lower_update(*op, *prefix, arg, true)),
            ExprKind::Assign { op, target, value } => Rvalue::Use(self.lower_assign(*op, target, value)),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => Rvalue::Use(self.lower_conditional(test, consequent, alternate)),
            ExprKind::Function(def) => self.closure_value(def, true),
            ExprKind::Class(class) => Rvalue::Use(self.lower_class(class, false)),
            ExprKind::Await(arg) => Rvalue::Await(self.lower_expr(arg)),
            ExprKind::Yield { arg, delegate } => {
                let arg = match arg {
                    Some(arg) => self.lower_expr(arg),
                    None => Operand::undefined(),
                };
                Rvalue::Yield {
                    arg,
                    delegate: *delegate,
                }
            }
            ExprKind::Template { quasis, exprs } => self.lower_template(quasis, exprs),
            ExprKind::Spread(arg) => Rvalue::Spread(self.lower_expr(arg)),
            ExprKind::Sequence(exprs) => {
                let Some((last, init)) = exprs.split_last() else {
                    return Rvalue::Use(Operand::undefined());
                };
                for e in init {
                    self.lower_expr_stmt(e);
                }
                self.lower_rvalue(last)
            }
            ExprKind::Unsupported(text) => {
                self.unsupported(&format!("expression `{}`", text), e.span);
                Rvalue::Use(Operand::Unknown)
            }
        }
    }

    /// Record a value use of a function or class binding
    fn note_value_ref(&mut self, name: &str) {
        let Some(binding) = self.cx.tree.lookup(self.scope, name) else {
            return;
        };
        let binding = self.cx.tree.binding(binding);
        let target = match &binding.kind {
            BindingKind::Import { source, imported } if imported != "*" => DeclRef::Imported {
                module: source.clone(),
                name: imported.clone(),
            },
            _ => match &binding.decl {
                Some(id) if id != &self.id => DeclRef::Decl(id.clone()),
                _ => return,
            },
        };
        self.depend(target, RefKind::Value);
    }

    fn lower_array(&mut self, elements: &'u [Option<Expr>]) -> Operand {
        let values: Vec<Option<Operand>> = elements
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let later = elements[i + 1..].iter().flatten().any(Expr::has_side_effects);
                e.as_ref().map(|e| self.lower_expr_before(e, later))
            })
            .collect();
        let array = self.b.to_temp(Rvalue::NewArray(values.len()));
        for (i, value) in values.into_iter().enumerate() {
            let Some(value) = value else { continue };
            self.b.assign(
                Place::Index {
                    base: array.clone(),
                    index: Operand::number(i),
                },
                Rvalue::Use(value),
            );
        }
        array
    }

    fn lower_object(&mut self, props: &'u [Property]) -> Operand {
        let object = self.b.to_temp(Rvalue::NewObject);
        for prop in props {
            match prop {
                Property::KeyValue {
                    key: PropKey::Ident(key),
                    value,
                } => {
                    let value = self.lower_expr(value);
                    self.b.assign(
                        Place::Field {
                            base: object.clone(),
                            field: key.clone(),
                        },
                        Rvalue::Use(value),
                    );
                }
                Property::KeyValue {
                    key: PropKey::Computed(key),
                    value,
                } => {
                    let index = self.lower_expr_before(key, value.has_side_effects());
                    let value = self.lower_expr(value);
                    self.b.assign(
                        Place::Index {
                            base: object.clone(),
                            index,
                        },
                        Rvalue::Use(value),
                    );
                }
                Property::Spread(source) => {
                    let source = self.lower_expr(source);
                    let call = self.unknown_member_call(
                        Operand::Global("Object".to_string()),
                        "assign",
                        vec![object.clone(), source],
                    );
                    self.b.emit(IrStmt::Invoke(call));
                }
            }
        }
        object
    }

    fn lower_unary(&mut self, op: UnaryOp, arg: &'u Expr) -> Rvalue {
        if op == UnaryOp::Delete {
            match &arg.kind {
                ExprKind::Member { object, property, .. } => {
                    let base = self.lower_expr(object);
                    return Rvalue::DeleteField {
                        base,
                        field: property.clone(),
                    };
                }
                ExprKind::Index { .. } => {}
                _ => {
                    self.lower_expr_stmt(arg);
                    return Rvalue::Use(Operand::bool(true));
                }
            }
        }
        let arg = self.lower_expr(arg);
        Rvalue::Unary { op, arg }
    }

    /// `'a' + x + 'b'` for `` `a${x}b` ``
    fn lower_template(&mut self, quasis: &'u [String], exprs: &'u [Expr]) -> Rvalue {
        let head = quasis.first().cloned().unwrap_or_default();
        let mut acc = Rvalue::Use(Operand::string(head));
        for (i, e) in exprs.iter().enumerate() {
            let left = self.b.to_temp(acc);
            let right = self.lower_expr(e);
            acc = Rvalue::Binary {
                op: BinaryOp::Add,
                left,
                right,
            };
            if let Some(quasi) = quasis.get(i + 1).filter(|q| !q.is_empty()) {
                let left = self.b.to_temp(acc);
                acc = Rvalue::Binary {
                    op: BinaryOp::Add,
                    left,
                    right: Operand::string(quasi.clone()),
                };
            }
        }
        acc
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Branching values
    // ═══════════════════════════════════════════════════════════════════════

    /// `c ? a : b` joined on one temporary
    fn lower_conditional(&mut self, test: &'u Expr, consequent: &'u Expr, alternate: &'u Expr) -> Operand {
        let result = self.b.temp();
        let then_l = self.b.label();
        let else_l = self.b.label();
        let join = self.b.label();
        self.lower_cond(test, then_l, else_l);
        self.b.bind(then_l);
        let value = self.lower_rvalue(consequent);
        self.b.assign(Place::Temp(result), value);
        self.b.goto(join);
        self.b.bind(else_l);
        let value = self.lower_rvalue(alternate);
        self.b.assign(Place::Temp(result), value);
        self.b.bind(join);
        Operand::Temp(result)
    }

    /// `&&`, `||`, `??` as values: the right side runs only when needed
    fn lower_logical(&mut self, op: LogicalOp, left: &'u Expr, right: &'u Expr) -> Operand {
        let result = self.b.temp();
        let value = self.lower_rvalue(left);
        self.b.assign(Place::Temp(result), value);
        let rhs = self.b.label();
        let join = self.b.label();
        self.b.branch(Self::logical_test(op, Operand::Temp(result)), rhs, join);
        self.b.bind(rhs);
        let value = self.lower_rvalue(right);
        self.b.assign(Place::Temp(result), value);
        self.b.bind(join);
        Operand::Temp(result)
    }

    /// Condition under which the right operand is evaluated
    fn logical_test(op: LogicalOp, value: Operand) -> Condition {
        match op {
            LogicalOp::And => Condition::truthy(value),
            LogicalOp::Or => Condition::falsy(value),
            LogicalOp::Nullish => Condition {
                op: BinaryOp::Eq,
                left: value,
                right: Operand::Const(Literal::Null),
            },
        }
    }

    /// Branch to `then_to` when `e` is truthy, else to `else_to`
    ///
    /// `&&`, `||` and `!` short-circuit through intermediate labels;
    /// comparisons branch directly.
    pub fn lower_cond(&mut self, e: &'u Expr, then_to: Label, else_to: Label) {
        match &e.kind {
            ExprKind::Logical {
                op: LogicalOp::And,
                left,
                right,
            } => {
                let next = self.b.label();
                self.lower_cond(left, next, else_to);
                self.b.bind(next);
                self.lower_cond(right, then_to, else_to);
            }
            ExprKind::Logical {
                op: LogicalOp::Or,
                left,
                right,
            } => {
                let next = self.b.label();
                self.lower_cond(left, then_to, next);
                self.b.bind(next);
                self.lower_cond(right, then_to, else_to);
            }
            ExprKind::Unary { op: UnaryOp::Not, arg } => self.lower_cond(arg, else_to, then_to),
            ExprKind::Binary { op, left, right } if op.is_comparison() => {
                let left = self.lower_expr_before(left, right.has_side_effects());
                let right = self.lower_expr(right);
                self.b.branch(
                    Condition {
                        op: *op,
                        left,
                        right,
                    },
                    then_to,
                    else_to,
                );
            }
            _ => {
                let value = self.lower_expr(e);
                self.b.branch(Condition::truthy(value), then_to, else_to);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Assignment
    // ═══════════════════════════════════════════════════════════════════════

    /// Assignment expression; returns the assigned value
    pub fn lower_assign(&mut self, op: AssignOp, target: &'u Pattern, value: &'u Expr) -> Operand {
        match op {
            AssignOp::Assign => self.lower_plain_assign(target, value),
            AssignOp::Op(op) => {
                let Some(place) = self.lower_place(target) else {
                    return self.invalid_target(target, value);
                };
                let current = self.read_place(&place);
                let current = if value.has_side_effects() {
                    self.pin(current)
                } else {
                    current
                };
                let rhs = self.lower_expr(value);
                let result = Rvalue::Binary {
                    op,
                    left: current,
                    right: rhs,
                };
                self.write_place(place, result)
            }
            AssignOp::Logical(op) => {
                let Some(place) = self.lower_place(target) else {
                    return self.invalid_target(target, value);
                };
                let current = self.read_place(&place);
                let result = self.b.temp();
                self.b.assign(Place::Temp(result), Rvalue::Use(current));
                let assign_l = self.b.label();
                let join = self.b.label();
                self.b.branch(Self::logical_test(op, Operand::Temp(result)), assign_l, join);
                self.b.bind(assign_l);
                let rhs = self.lower_rvalue(value);
                self.b.assign(Place::Temp(result), rhs);
                self.write_place(place, Rvalue::Use(Operand::Temp(result)));
                self.b.bind(join);
                Operand::Temp(result)
            }
        }
    }

    fn lower_plain_assign(&mut self, target: &'u Pattern, value: &'u Expr) -> Operand {
        match target {
            Pattern::Ident(name) => {
                let ty = self.static_type(value);
                let rvalue = self.lower_rvalue(value);
                let result = self.assign_binding(name, rvalue);
                self.set_binding_type(name, ty);
                result
            }
            Pattern::Expr(e) => match &e.kind {
                ExprKind::Ident(name) => {
                    let rvalue = self.lower_rvalue(value);
                    self.assign_binding(name, rvalue)
                }
                ExprKind::Member { object, property, .. } => {
                    let base = self.lower_expr_before(object, value.has_side_effects());
                    let value = self.lower_expr(value);
                    self.b.assign(
                        Place::Field {
                            base,
                            field: property.clone(),
                        },
                        Rvalue::Use(value.clone()),
                    );
                    value
                }
                ExprKind::Index { object, index } => {
                    let effects = value.has_side_effects();
                    let base = self.lower_expr_before(object, effects || index.has_side_effects());
                    let index = self.lower_expr_before(index, effects);
                    let value = self.lower_expr(value);
                    self.b
                        .assign(Place::Index { base, index }, Rvalue::Use(value.clone()));
                    value
                }
                _ => self.invalid_target(target, value),
            },
            Pattern::Array { .. } | Pattern::Object { .. } => {
                let value = self.lower_expr(value);
                self.bind_pattern(target, value.clone());
                value
            }
        }
    }

    /// Store into a binding and return the stored value
    fn assign_binding(&mut self, name: &str, value: Rvalue) -> Operand {
        let place = self.binding_place(name);
        match place {
            Some(place) => {
                self.b.assign(place.clone(), value);
                place.as_operand().unwrap_or(Operand::Unknown)
            }
            None => {
                let value = self.b.to_temp(value);
                self.store(name, Rvalue::Use(value.clone()));
                value
            }
        }
    }

    /// Direct place of a plain local or global binding
    fn binding_place(&self, name: &str) -> Option<Place> {
        match self.cx.tree.resolve(self.scope, name) {
            Storage::Global(n) => Some(Place::Global(n)),
            Storage::Local(n) => Some(Place::Local(n)),
            Storage::Env { .. } | Storage::Captured { .. } => None,
        }
    }

    fn invalid_target(&mut self, target: &'u Pattern, value: &'u Expr) -> Operand {
        self.diag(Diagnostic::new(
            DiagnosticKind::InvalidAssignmentTarget,
            Severity::Warning,
            format!("cannot assign to {}", pattern_kind(target)),
            value.span,
        ));
        self.lower_expr(value)
    }

    /// Location read and written by compound assignment and update
    fn lower_place(&mut self, target: &'u Pattern) -> Option<Place> {
        let e = match target {
            Pattern::Ident(name) => return Some(self.binding_ref(name)),
            Pattern::Expr(e) => e,
            _ => return None,
        };
        self.lower_place_expr(e)
    }

    fn lower_place_expr(&mut self, e: &'u Expr) -> Option<Place> {
        match &e.kind {
            ExprKind::Ident(name) => Some(self.binding_ref(name)),
            ExprKind::Member { object, property, .. } => {
                let base = self.lower_expr(object);
                Some(Place::Field {
                    base,
                    field: property.clone(),
                })
            }
            ExprKind::Index { object, index } => {
                let base = self.lower_expr_before(object, index.has_side_effects());
                let index = self.lower_expr(index);
                Some(Place::Index { base, index })
            }
            _ => None,
        }
    }

    /// Place of a binding, resolving environment storage to a field place
    fn binding_ref(&mut self, name: &str) -> Place {
        match self.cx.tree.resolve(self.scope, name) {
            Storage::Global(n) => Place::Global(n),
            Storage::Local(n) => Place::Local(n),
            Storage::Env { env_local, field } => Place::Field {
                base: Operand::Local(env_local),
                field,
            },
            Storage::Captured { hops, field } => {
                let base = self.env_chain(hops);
                Place::Field { base, field }
            }
        }
    }

    fn read_place(&mut self, place: &Place) -> Operand {
        match place {
            Place::Field { base, field } => self.b.to_temp(Rvalue::Field {
                base: base.clone(),
                field: field.clone(),
            }),
            Place::Index { base, index } => self.b.to_temp(Rvalue::Index {
                base: base.clone(),
                index: index.clone(),
            }),
            other => other.as_operand().unwrap_or(Operand::Unknown),
        }
    }

    fn write_place(&mut self, place: Place, value: Rvalue) -> Operand {
        match &place {
            Place::Field { .. } | Place::Index { .. } => {
                let value = self.b.to_temp(value);
                self.b.assign(place, Rvalue::Use(value.clone()));
                value
            }
            _ => {
                self.b.assign(place.clone(), value);
                place.as_operand().unwrap_or(Operand::Unknown)
            }
        }
    }

    /// `x++`, `--o.f`; the value is the old one for postfix forms
    pub fn lower_update(&mut self, op: UpdateOp, prefix: bool, arg: &'u Expr, want_value: bool) -> Operand {
        let Some(place) = self.lower_place_expr(arg) else {
            self.unsupported("update of a non-reference", arg.span);
            return Operand::Unknown;
        };
        let mut current = self.read_place(&place);
        if want_value && !prefix && current.as_temp().is_none() {
            let t = self.b.temp();
            self.b.assign(Place::Temp(t), Rvalue::Use(current));
            current = Operand::Temp(t);
        }
        let op = match op {
            UpdateOp::Inc => BinaryOp::Add,
            UpdateOp::Dec => BinaryOp::Sub,
        };
        let updated = self.write_place(
            place,
            Rvalue::Binary {
                op,
                left: current.clone(),
                right: Operand::number(1),
            },
        );
        if prefix {
            updated
        } else {
            current
        }
    }
}

fn pattern_kind(pattern: &Pattern) -> &'static str {
    match pattern {
        Pattern::Ident(_) => "identifier",
        Pattern::Array { .. } => "array pattern",
        Pattern::Object { .. } => "object pattern",
        Pattern::Expr(_) => "expression",
    }
}
