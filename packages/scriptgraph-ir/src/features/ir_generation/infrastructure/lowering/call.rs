//! Call, construct and receiver-type lowering
//!
//! Call forms:
//! - `staticinvoke` for declared functions and imported names,
//! - `instanceinvoke` for member calls (dispatch through the receiver's
//!   known class, else `%unk`),
//! - `ptrinvoke` for calls through function values.

use crate::features::closure_resolution::{BindingKind, FunctionKey};
use crate::features::ir_generation::domain::{Call, Callee, DeclRef, IrStmt, Operand, RefKind, Rvalue};
use crate::features::parsing::domain::{Expr, ExprKind};

use super::function::FunctionLowerer;

impl<'a, 'u> FunctionLowerer<'a, 'u> {
    fn lower_args(&mut self, args: &'u [Expr]) -> Vec<Operand> {
        self.lower_ordered(args)
    }

    /// Receiver or function value, read before any argument runs
    fn pin_before_args(&mut self, value: Operand, args: &[Expr]) -> Operand {
        if args.iter().any(Expr::has_side_effects) {
            self.pin(value)
        } else {
            value
        }
    }

    /// Instance call whose target cannot be known statically
    pub fn unknown_member_call(&mut self, base: Operand, name: &str, args: Vec<Operand>) -> Call {
        Call::instance(base, Callee::Unknown(name.to_string()), args)
    }

    pub fn lower_call(&mut self, callee: &'u Expr, args: &'u [Expr]) -> Call {
        match &callee.kind {
            ExprKind::Super => {
                let target = self.super_member("constructor");
                let args = self.lower_args(args);
                Call::instance(Operand::This, target, args)
            }
            ExprKind::Member { object, property, .. } => {
                if matches!(object.kind, ExprKind::Super) {
                    let target = self.super_member(property);
                    let args = self.lower_args(args);
                    return Call::instance(Operand::This, target, args);
                }
                if let Some(module) = self.namespace_of(object) {
                    let args = self.lower_args(args);
                    return Call::static_call(
                        Callee::Imported {
                            module,
                            name: property.clone(),
                        },
                        args,
                    );
                }
                let receiver = self.static_type(object);
                let base = self.lower_expr(object);
                let base = self.pin_before_args(base, args);
                let target = match receiver {
                    Some(class) => self.cx.lookup_method(&class, property),
                    None => Callee::Unknown(property.clone()),
                };
                let args = self.lower_args(args);
                Call::instance(base, target, args)
            }
            ExprKind::Ident(name) => self.lower_named_call(name, args),
            ExprKind::Function(def) => {
                let target = self
                    .cx
                    .function_id(FunctionKey::of_function(def))
                    .map(Callee::Decl)
                    .unwrap_or_else(|| Callee::Unknown("%unk".to_string()));
                let ptr = self.lower_expr(callee);
                let ptr = self.pin_before_args(ptr, args);
                let args = self.lower_args(args);
                Call::pointer(ptr, target, args)
            }
            _ => {
                let ptr = self.lower_expr(callee);
                let ptr = self.pin_before_args(ptr, args);
                let args = self.lower_args(args);
                Call::pointer(ptr, Callee::Unknown("%unk".to_string()), args)
            }
        }
    }

    /// `f(…)` by name
    fn lower_named_call(&mut self, name: &str, args: &'u [Expr]) -> Call {
        let tree = self.cx.tree;
        let Some(binding) = tree.lookup(self.scope, name) else {
            let args = self.lower_args(args);
            return Call::static_call(Callee::Unknown(name.to_string()), args);
        };
        let binding = tree.binding(binding);
        match (&binding.kind, &binding.decl) {
            (BindingKind::Import { source, imported }, _) if imported != "*" => {
                let args = self.lower_args(args);
                Call::static_call(
                    Callee::Imported {
                        module: source.clone(),
                        name: imported.clone(),
                    },
                    args,
                )
            }
            (BindingKind::Function, Some(id)) => {
                let args = self.lower_args(args);
                Call::static_call(Callee::Decl(id.clone()), args)
            }
            (BindingKind::Const | BindingKind::SelfRef, Some(id)) if tree.class_by_id(id).is_none() => {
                let ptr = self.load(name);
                let ptr = self.pin_before_args(ptr, args);
                let args = self.lower_args(args);
                Call::pointer(ptr, Callee::Decl(id.clone()), args)
            }
            _ => {
                let ptr = self.load(name);
                let ptr = self.pin_before_args(ptr, args);
                let args = self.lower_args(args);
                Call::pointer(ptr, Callee::Unknown(name.to_string()), args)
            }
        }
    }

    /// Module specifier when `e` names a namespace import
    fn namespace_of(&self, e: &Expr) -> Option<String> {
        let name = e.as_ident()?;
        let binding = self.cx.tree.binding(self.cx.tree.lookup(self.scope, name)?);
        match &binding.kind {
            BindingKind::Import { source, imported } if imported == "*" => Some(source.clone()),
            _ => None,
        }
    }

    /// Member of the superclass of the class being lowered
    pub fn super_member(&mut self, name: &str) -> Callee {
        let parent = self
            .this_class
            .as_ref()
            .and_then(|c| self.cx.class_scope(c))
            .and_then(|c| self.cx.super_of(c));
        match parent {
            Some(parent) => self.cx.lookup_method(&parent, name),
            None => Callee::Unknown(name.to_string()),
        }
    }

    /// `new C(args)`: allocation, then the constructor as an instance call
    pub fn lower_new(&mut self, callee: &'u Expr, args: &'u [Expr]) -> Operand {
        let class = match callee.dotted_path() {
            Some(path) => self.cx.resolve_path(self.scope, &path),
            None => {
                self.lower_expr(callee);
                DeclRef::Unknown("%unk".to_string())
            }
        };
        self.depend(class.clone(), RefKind::Instantiate);
        let args = self.lower_args(args);
        let object = self.b.to_temp(Rvalue::New(class.clone()));
        let constructor = match &class {
            DeclRef::Unknown(_) => Callee::Unknown("constructor".to_string()),
            known => self.cx.lookup_method(known, "constructor"),
        };
        self.b
            .emit(IrStmt::Invoke(Call::instance(object.clone(), constructor, args)));
        object
    }

    /// Class of the value `e` evaluates to, when statically evident
    ///
    /// Sources: `new C()`, `this` in class bodies, annotated or
    /// `new`-initialized bindings, and class names (static members).
    pub fn static_type(&self, e: &Expr) -> Option<DeclRef> {
        if !self.cx.config.track_types {
            return None;
        }
        match &e.kind {
            ExprKind::This => self.this_class.clone(),
            ExprKind::New { callee, .. } => {
                let path = callee.dotted_path()?;
                let class = self.cx.resolve_path(self.scope, &path);
                (!class.is_unknown()).then_some(class)
            }
            ExprKind::Ident(name) => {
                if let Some(ty) = self.binding_type(name) {
                    return Some(ty);
                }
                let binding = self.cx.tree.binding(self.cx.tree.lookup(self.scope, name)?);
                match (&binding.kind, &binding.decl) {
                    (BindingKind::Class, Some(id)) => Some(DeclRef::Decl(id.clone())),
                    (BindingKind::Const, Some(id)) if self.cx.tree.class_by_id(id).is_some() => {
                        Some(DeclRef::Decl(id.clone()))
                    }
                    (BindingKind::Import { source, imported }, _) if imported != "*" => {
                        Some(DeclRef::Imported {
                            module: source.clone(),
                            name: imported.clone(),
                        })
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
