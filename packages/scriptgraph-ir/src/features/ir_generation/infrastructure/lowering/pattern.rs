//! Destructuring
//!
//! Patterns lower to sequential element / field reads. Nested patterns,
//! defaults, holes and rest elements are all handled recursively; only
//! patterns nested deeper than `max_pattern_depth` fall back to `%unk`.

use crate::features::ir_generation::domain::{Condition, IrStmt, Operand, Place, Rvalue};
use crate::features::parsing::domain::{BinaryOp, Expr, ExprKind, Pattern};
use crate::shared::models::{Diagnostic, DiagnosticKind, Severity};

use super::function::FunctionLowerer;

impl<'a, 'u> FunctionLowerer<'a, 'u> {
    /// Bind every name in `pattern` from `value`
    pub fn bind_pattern(&mut self, pattern: &'u Pattern, value: Operand) {
        let max = self.cx.config.max_pattern_depth;
        if pattern.depth() > max {
            let span = self.b.span();
            self.diag(Diagnostic::unsupported(
                format!("destructuring nested deeper than {} levels", max),
                span,
            ));
            for name in pattern.bound_names() {
                self.store(name, Rvalue::Use(Operand::Unknown));
            }
            return;
        }
        self.bind(pattern, value);
    }

    fn bind(&mut self, pattern: &'u Pattern, value: Operand) {
        match pattern {
            Pattern::Ident(name) => self.store(name, Rvalue::Use(value)),
            Pattern::Expr(target) => self.bind_target(target, value),
            Pattern::Array { elements, rest } => {
                for (i, elem) in elements.iter().enumerate() {
                    let Some(elem) = elem else { continue };
                    let read = Rvalue::Index {
                        base: value.clone(),
                        index: Operand::number(i),
                    };
                    self.bind_element(&elem.pattern, elem.default.as_ref(), read);
                }
                if let Some(rest) = rest {
                    let call = self.unknown_member_call(
                        value.clone(),
                        "slice",
                        vec![Operand::number(elements.len())],
                    );
                    let tail = self.b.to_temp(Rvalue::Call(call));
                    self.bind(rest, tail);
                }
            }
            Pattern::Object { props, rest } => {
                for prop in props {
                    let read = Rvalue::Field {
                        base: value.clone(),
                        field: prop.key.clone(),
                    };
                    self.bind_element(&prop.value, prop.default.as_ref(), read);
                }
                // Rest receives a shallow copy; named keys are not removed
                if let Some(rest) = rest {
                    let copy = self.b.to_temp(Rvalue::NewObject);
                    let call = self.unknown_member_call(
                        Operand::Global("Object".to_string()),
                        "assign",
                        vec![copy.clone(), value],
                    );
                    self.b.emit(IrStmt::Invoke(call));
                    self.bind(rest, copy);
                }
            }
        }
    }

    fn bind_element(&mut self, pattern: &'u Pattern, default: Option<&'u Expr>, read: Rvalue) {
        match (pattern, default) {
            (Pattern::Ident(name), None) => self.store(name, read),
            _ => {
                let value = self.b.to_temp(read);
                let value = self.with_default(value, default);
                self.bind(pattern, value);
            }
        }
    }

    /// `value`, or `default` when it is `undefined`
    pub fn with_default(&mut self, value: Operand, default: Option<&'u Expr>) -> Operand {
        let Some(default) = default else {
            return value;
        };
        let result = self.b.temp();
        self.b.assign(Place::Temp(result), Rvalue::Use(value));
        let fill = self.b.label();
        let join = self.b.label();
        self.b.branch(
            Condition {
                op: BinaryOp::StrictEq,
                left: Operand::Temp(result),
                right: Operand::undefined(),
            },
            fill,
            join,
        );
        self.b.bind(fill);
        let value = self.lower_rvalue(default);
        self.b.assign(Place::Temp(result), value);
        self.b.bind(join);
        Operand::Temp(result)
    }

    /// Assignment-pattern target: binding, field or element
    fn bind_target(&mut self, target: &'u Expr, value: Operand) {
        match &target.kind {
            ExprKind::Ident(name) => self.store(name, Rvalue::Use(value)),
            ExprKind::Member { object, property, .. } => {
                let base = self.lower_expr(object);
                self.b.assign(
                    Place::Field {
                        base,
                        field: property.clone(),
                    },
                    Rvalue::Use(value),
                );
            }
            ExprKind::Index { object, index } => {
                let base = self.lower_expr(object);
                let index = self.lower_expr(index);
                self.b.assign(Place::Index { base, index }, Rvalue::Use(value));
            }
            _ => self.diag(Diagnostic::new(
                DiagnosticKind::InvalidAssignmentTarget,
                Severity::Warning,
                "destructuring target is not a binding, field or element",
                target.span,
            )),
        }
    }
}
