//! AST → IR lowering
//!
//! [`AstLowerer`] drains a job queue seeded with the module body: lowering a
//! function, class or method enqueues the bodies it creates, so every
//! function in the unit is lowered exactly once, in the scopes the resolver
//! built for it.
//!
//! ## Modules
//! - `builder` - linear statement buffer, labels, traps
//! - `context` - per-unit state, static name and method resolution
//! - `function` - prologue, storage access, statements
//! - `expr` / `call` / `pattern` / `class` - the rest of the language

mod builder;
mod call;
mod class;
mod context;
mod expr;
mod function;
mod pattern;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::LoweringConfig;
use crate::features::closure_resolution::{FunctionScope, ScopeTree};
use crate::features::ir_generation::domain::{DeclRef, FunctionKind, IrFunction, IrModule};
use crate::features::ir_generation::ports::IrGenerator;
use crate::features::parsing::domain::SourceUnit;
use crate::shared::models::{Result, ScriptGraphError, Span};

use context::{Job, ModuleContext};
use function::FunctionLowerer;

/// Lowers resolved source units into [`IrModule`]s
#[derive(Debug, Clone, Default)]
pub struct AstLowerer {
    config: LoweringConfig,
}

impl AstLowerer {
    pub fn new(config: LoweringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoweringConfig {
        &self.config
    }
}

impl IrGenerator for AstLowerer {
    fn generate(&self, unit: &SourceUnit, scopes: &ScopeTree) -> Result<IrModule> {
        if scopes.file_path != unit.file_path {
            return Err(ScriptGraphError::ir_generation(format!(
                "scope tree of {} used for {}",
                scopes.file_path, unit.file_path
            ))
            .with_file(&unit.file_path));
        }

        let mut cx = ModuleContext::new(unit, scopes, &self.config);
        let mut functions = Vec::new();
        while let Some(job) = cx.next_job() {
            match lower_job(&mut cx, job) {
                Some(function) => functions.push(function),
                None => trace!(file = %unit.file_path, "Skipped body without scope"),
            }
        }

        let order: FxHashMap<&str, usize> = scopes
            .functions()
            .iter()
            .enumerate()
            .map(|(i, f)| (f.decl_id.as_str(), i))
            .collect();
        functions.sort_by_key(|f: &IrFunction| order.get(f.id.as_str()).copied().unwrap_or(usize::MAX));

        let class_order: FxHashMap<&str, usize> = scopes
            .classes()
            .iter()
            .enumerate()
            .map(|(i, c)| (c.decl_id.as_str(), i))
            .collect();
        let mut classes = std::mem::take(&mut cx.classes);
        classes.sort_by_key(|c| class_order.get(c.id.as_str()).copied().unwrap_or(usize::MAX));

        let module = IrModule {
            file_path: unit.file_path.clone(),
            functions,
            classes,
            imports: std::mem::take(&mut cx.imports),
            exports: std::mem::take(&mut cx.exports),
            dependencies: cx.take_dependencies(),
            diagnostics: std::mem::take(&mut cx.diagnostics),
        };
        debug!(
            file = %unit.file_path,
            functions = module.functions.len(),
            "Generated IR"
        );
        Ok(module)
    }
}

/// Lower one queued body into a function
fn lower_job<'u>(cx: &mut ModuleContext<'u>, job: Job<'u>) -> Option<IrFunction> {
    let tree = cx.tree;
    let unit = cx.unit;
    let info: &FunctionScope = tree.function(job.key())?;
    let has_closures = info.has_closures();
    let offset = usize::from(has_closures);

    let mut lw = FunctionLowerer::new(cx, info.decl_id.clone(), info.scope);
    let mut header = Header {
        kind: FunctionKind::Function,
        class: None,
        is_static: false,
        is_async: false,
        is_generator: false,
        span: Span::zero(),
    };

    let params = match job {
        Job::Module => {
            header.kind = FunctionKind::Module;
            lw.prologue(has_closures);
            lw.lower_block_list(&unit.body);
            Vec::new()
        }
        Job::Function(def) => {
            header.kind = if def.is_arrow {
                FunctionKind::Arrow
            } else {
                FunctionKind::Function
            };
            header.is_async = def.is_async;
            header.is_generator = def.is_generator;
            header.span = def.span;
            lw.b.set_span(def.span);
            lw.prologue(has_closures);
            let params = lw.lower_params(&def.params, offset);
            lw.bind_self_ref(def);
            lw.lower_block_list(&def.body);
            params
        }
        Job::Method {
            class,
            function,
            is_static,
        } => {
            let class_id = tree.class_id(class).cloned();
            lw.this_class = class_id.clone().map(DeclRef::Decl);
            header.kind = FunctionKind::Method;
            header.class = class_id;
            header.is_static = is_static;
            header.is_async = function.is_async;
            header.is_generator = function.is_generator;
            header.span = function.span;
            lw.b.set_span(function.span);
            lw.prologue(has_closures);
            let params = lw.lower_params(&function.params, offset);
            lw.lower_block_list(&function.body);
            params
        }
        Job::Constructor(class) => {
            let class_id = tree.class_id(class).cloned();
            lw.this_class = class_id.clone().map(DeclRef::Decl);
            header.kind = FunctionKind::Constructor;
            header.class = class_id;
            header.span = class.constructor().map(|c| c.span).unwrap_or(class.span);
            lw.b.set_span(header.span);
            lw.prologue(has_closures);
            lw.lower_constructor(class, offset)
        }
        Job::StaticInit(class) => {
            let class_id = tree.class_id(class).cloned();
            lw.this_class = class_id.clone().map(DeclRef::Decl);
            header.kind = FunctionKind::StaticInit;
            header.class = class_id;
            header.is_static = true;
            header.span = class.span;
            lw.b.set_span(class.span);
            lw.prologue(has_closures);
            lw.lower_static_init(class);
            Vec::new()
        }
    };

    let body = lw.finish();
    Some(IrFunction {
        id: info.decl_id.clone(),
        name: info.name.clone(),
        kind: header.kind,
        params,
        class: header.class,
        is_static: header.is_static,
        is_async: header.is_async,
        is_generator: header.is_generator,
        captures: info.captures.clone(),
        body,
        span: header.span,
    })
}

struct Header {
    kind: FunctionKind,
    class: Option<String>,
    is_static: bool,
    is_async: bool,
    is_generator: bool,
    span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::closure_resolution::ScopeResolver;
    use crate::features::ir_generation::domain::{Callee, IrStmt};
    use crate::features::ir_generation::GenerateIrUseCase;
    use crate::features::parsing::{SourceParser, TypeScriptParser};
    use crate::shared::models::DiagnosticKind;
    use crate::shared::utils::IdGenerator;
    use pretty_assertions::assert_eq;

    fn lower(source: &str) -> IrModule {
        let unit = TypeScriptParser::new().parse(source, "t.ets").unwrap();
        GenerateIrUseCase::new(AstLowerer::default())
            .execute(&unit)
            .unwrap()
    }

    fn listing(module: &IrModule, qualified: &str) -> Vec<String> {
        module
            .function_named(qualified)
            .unwrap_or_else(|| panic!("no function {}", qualified))
            .body
            .stmts
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_module_function_comes_first() {
        let module = lower("function f() {} let x = 1;");
        let names: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["%dflt", "f"]);
        assert_eq!(module.functions[0].kind, FunctionKind::Module);
    }

    #[test]
    fn test_for_of_uses_iterator_protocol() {
        let module = lower("function f(arr) { for (const x of arr) { g(x); } }");
        let stmts = listing(&module, "f");
        let position = |needle: &str| {
            stmts
                .iter()
                .position(|s| s.contains(needle))
                .unwrap_or_else(|| panic!("missing {} in {:?}", needle, stmts))
        };
        assert!(position(".iterator()") < position(".next()"));
        assert!(position(".next()") < position(".done"));
        assert!(position(".done") < position(".value"));
        assert_eq!(stmts.iter().filter(|s| s.contains(".iterator()")).count(), 1);
    }

    #[test]
    fn test_parameters_bound_in_order() {
        let module = lower("function f(a, b) { return b; }");
        let f = module.function_named("f").unwrap();
        assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
        let stmts = listing(&module, "f");
        assert_eq!(stmts[0], "a = parameter0");
        assert_eq!(stmts[1], "b = parameter1");
    }

    #[test]
    fn test_closure_receives_environment() {
        let module = lower(
            "function outer() { let x = 1; function inner() { return x; } return inner; }",
        );
        let outer = listing(&module, "outer");
        assert!(outer.iter().any(|s| s.contains("newenv")), "{:?}", outer);
        assert!(
            outer.iter().any(|s| s.contains("closure <@t.ets: outer.inner>(")),
            "{:?}",
            outer
        );

        let inner = module.function_named("outer.inner").unwrap();
        assert!(inner.has_closures());
        assert!(inner.params.is_empty());
        assert_eq!(inner.body.stmts[0].to_string(), "%closures = parameter0");
    }

    #[test]
    fn test_top_level_function_has_no_captures() {
        let module = lower("let g = 1; function f() { return g; }");
        let f = module.function_named("f").unwrap();
        assert!(f.captures.is_empty());
        assert_eq!(listing(&module, "f"), vec!["return g".to_string()]);
    }

    #[test]
    fn test_finally_runs_on_both_paths() {
        let module = lower("function f() { try { a(); } finally { b(); } }");
        let f = module.function_named("f").unwrap();
        let calls_to_b = f
            .body
            .call_sites()
            .filter(|(_, c)| c.callee == Callee::Unknown("b".to_string()))
            .count();
        assert_eq!(calls_to_b, 2);
        assert!(!f.body.traps.is_empty());
        assert!(f
            .body
            .stmts
            .iter()
            .any(|s| matches!(s, IrStmt::Throw(_))));
    }

    #[test]
    fn test_method_dispatch_through_new_binding() {
        let module = lower("class A { m() {} } function f() { const a = new A(); a.m(); }");
        let f = module.function_named("f").unwrap();
        let method = IdGenerator::decl_id("t.ets", "A.m");
        let ctor = IdGenerator::decl_id("t.ets", "A.constructor");
        let callees: Vec<&Callee> = f.body.call_sites().map(|(_, c)| &c.callee).collect();
        assert_eq!(callees, vec![&Callee::Decl(ctor), &Callee::Decl(method)]);
    }

    #[test]
    fn test_left_operand_read_before_right_assigns() {
        let module = lower("function f() { let x = 1; return x + (x = 5); }");
        assert_eq!(
            listing(&module, "f"),
            vec![
                "x = 1".to_string(),
                "%0 = x".to_string(),
                "x = 5".to_string(),
                "%1 = %0 + x".to_string(),
                "return %1".to_string(),
            ]
        );
    }

    #[test]
    fn test_global_read_before_call() {
        let module = lower(
            "let g = 1; function inc() { g = g + 1; return g; } function f() { return g + inc(); }",
        );
        assert_eq!(
            listing(&module, "f"),
            vec![
                "%0 = g".to_string(),
                "%1 = staticinvoke <@t.ets: inc>()".to_string(),
                "%2 = %0 + %1".to_string(),
                "return %2".to_string(),
            ]
        );
    }

    #[test]
    fn test_arguments_evaluated_left_to_right() {
        let module = lower("function f(h, i) { h(i, i++); }");
        let stmts = listing(&module, "f");
        let position = |needle: &str| {
            stmts
                .iter()
                .position(|s| s == needle)
                .unwrap_or_else(|| panic!("missing {} in {:?}", needle, stmts))
        };
        assert!(position("%0 = h") < position("%1 = i"));
        assert!(position("%1 = i") < position("%2 = i"));
        assert!(position("%2 = i") < position("i = %2 + 1"));
        let call = stmts
            .iter()
            .find(|s| s.starts_with("ptrinvoke"))
            .unwrap_or_else(|| panic!("no call in {:?}", stmts));
        assert!(call.ends_with("(%1, %2)"), "{}", call);
    }

    #[test]
    fn test_pure_operands_are_not_copied() {
        let module = lower("function f(a, b) { return a + b; }");
        assert_eq!(listing(&module, "f")[2], "%0 = a + b");
    }

    #[test]
    fn test_comparison_pins_left_operand() {
        let module = lower("function f(x) { if (x < (x = 5)) { g(); } }");
        let stmts = listing(&module, "f");
        assert_eq!(stmts[1], "%0 = x");
        assert_eq!(stmts[2], "x = 5");
        assert!(stmts[3].starts_with("if %0 < x"), "{:?}", stmts);
    }

    #[test]
    fn test_untyped_receiver_is_unknown() {
        let module = lower("function f(o) { o.run(); }");
        let stmts = listing(&module, "f");
        assert_eq!(stmts[1], "instanceinvoke o.<@%unk/%unk: .run()>()");
    }

    #[test]
    fn test_unreachable_statement_reported() {
        let module = lower("function f() { return 1; g(); }");
        assert_eq!(
            module
                .diagnostics
                .of_kind(DiagnosticKind::UnreachableCode)
                .count(),
            1
        );
        assert_eq!(listing(&module, "f"), vec!["return 1".to_string()]);
    }

    #[test]
    fn test_class_records_members_and_static_init() {
        let module = lower("class A { static n = 1; x = 2; m() {} static s() {} }");
        let class = &module.classes[0];
        assert_eq!(class.name, "A");
        assert_eq!(class.fields, vec!["n".to_string(), "x".to_string()]);
        assert!(class.static_init.is_some());
        assert!(class.method("m").is_some_and(|m| !m.is_static));
        assert!(class.method("s").is_some_and(|m| m.is_static));

        let ctor = listing(&module, "A.constructor");
        assert_eq!(ctor, vec!["this.x = 2".to_string(), "return".to_string()]);
    }

    #[test]
    fn test_mismatched_scope_tree_is_an_error() {
        let a = TypeScriptParser::new().parse("let x = 1;", "a.ets").unwrap();
        let b = TypeScriptParser::new().parse("let y = 1;", "b.ets").unwrap();
        let scopes = ScopeResolver::resolve(&a);
        assert!(AstLowerer::default().generate(&b, &scopes).is_err());
    }
}
