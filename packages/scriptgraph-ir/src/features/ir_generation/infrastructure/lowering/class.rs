//! Class lowering
//!
//! A class expression or declaration evaluates to `class <id>(env)`. Its
//! constructor (synthesized when absent), methods and static initializer
//! become separate functions queued on the module context.

use crate::features::closure_resolution::FunctionKey;
use crate::features::ir_generation::domain::{
    Call, Callee, DeclRef, EnvOperand, IrClass, IrMethod, IrStmt, Operand, Place, RefKind, Rvalue,
};
use crate::features::parsing::domain::{ClassDef, ClassMember};

use super::context::Job;
use super::function::FunctionLowerer;

impl<'a, 'u> FunctionLowerer<'a, 'u> {
    /// Evaluate a class; declarations also bind their name
    pub fn lower_class(&mut self, class: &'u ClassDef, declared: bool) -> Operand {
        let tree = self.cx.tree;
        let Some(info) = tree.class_of(class) else {
            self.unsupported("class outside the scope tree", class.span);
            return Operand::Unknown;
        };
        if let Some(extends) = &class.extends {
            if extends.dotted_path().is_none() {
                self.lower_expr(extends);
            }
        }

        let members: Vec<FunctionKey> = std::iter::once(info.constructor)
            .chain(info.methods.iter().map(|m| m.key))
            .chain(info.static_init)
            .collect();
        let env = members
            .iter()
            .find_map(|&key| tree.closure_env(key, self.scope))
            .map(EnvOperand::from);
        let value = Rvalue::Class {
            class: info.decl_id.clone(),
            env,
        };
        let operand = match class.name.as_deref().filter(|_| declared) {
            Some(name) => {
                self.store(name, value);
                self.load(name)
            }
            None => self.b.to_temp(value),
        };

        self.cx.enqueue(Job::Constructor(class));
        for member in &class.members {
            if let ClassMember::Method(method) = member {
                self.cx.enqueue(Job::Method {
                    class,
                    function: &method.function,
                    is_static: method.is_static,
                });
            }
        }
        let static_init = info.static_init.and_then(|key| self.cx.function_id(key));
        if let Some(id) = &static_init {
            self.cx.enqueue(Job::StaticInit(class));
            self.b.emit(IrStmt::Invoke(Call::instance(
                operand.clone(),
                Callee::Decl(id.clone()),
                Vec::new(),
            )));
        }

        self.record_class(class, static_init);
        operand
    }

    fn record_class(&mut self, class: &'u ClassDef, static_init: Option<String>) {
        let tree = self.cx.tree;
        let Some(info) = tree.class_of(class) else {
            return;
        };
        let class_id = info.decl_id.clone();
        let constructor = self.cx.function_id(info.constructor).unwrap_or_default();
        let methods: Vec<IrMethod> = info
            .methods
            .iter()
            .filter_map(|m| {
                Some(IrMethod {
                    name: m.name.clone(),
                    id: self.cx.function_id(m.key)?,
                    is_static: m.is_static,
                })
            })
            .collect();
        let super_class = self.cx.super_of(info);

        self.cx
            .depend(&class_id, DeclRef::Decl(constructor.clone()), RefKind::Contains);
        for method in &methods {
            self.cx
                .depend(&class_id, DeclRef::Decl(method.id.clone()), RefKind::Contains);
        }
        if let Some(id) = &static_init {
            self.cx.depend(&class_id, DeclRef::Decl(id.clone()), RefKind::Contains);
        }
        if let Some(parent) = &super_class {
            self.cx.depend(&class_id, parent.clone(), RefKind::Extends);
        }

        let fields = class
            .members
            .iter()
            .filter_map(|m| match m {
                ClassMember::Field(f) => Some(f.name.clone()),
                _ => None,
            })
            .collect();
        self.cx.add_class(IrClass {
            id: class_id,
            name: info.name.clone(),
            super_class,
            constructor,
            methods,
            fields,
            static_init,
            span: class.span,
        });
    }

    /// Constructor body: parameters, implicit `super()`, field initializers, body
    pub fn lower_constructor(&mut self, class: &'u ClassDef, offset: usize) -> Vec<String> {
        let ctor = class.constructor();
        let params = match ctor {
            Some(ctor) => self.lower_params(&ctor.params, offset),
            None => Vec::new(),
        };
        if ctor.is_none() && class.extends.is_some() {
            let target = self.super_member("constructor");
            self.b
                .emit(IrStmt::Invoke(Call::instance(Operand::This, target, Vec::new())));
        }
        self.lower_field_inits(class, false);
        if let Some(ctor) = ctor {
            self.lower_block_list(&ctor.body);
        }
        params
    }

    /// `%statInit` body
    pub fn lower_static_init(&mut self, class: &'u ClassDef) {
        self.lower_field_inits(class, true);
    }

    fn lower_field_inits(&mut self, class: &'u ClassDef, is_static: bool) {
        for member in &class.members {
            let ClassMember::Field(field) = member else {
                continue;
            };
            if field.is_static != is_static {
                continue;
            }
            self.b.set_span(field.span);
            self.annotation_type(field.type_ann.as_ref());
            let value = match &field.init {
                Some(init) => self.lower_expr(init),
                None => Operand::undefined(),
            };
            self.b.assign(
                Place::Field {
                    base: Operand::This,
                    field: field.name.clone(),
                },
                Rvalue::Use(value),
            );
        }
    }
}
