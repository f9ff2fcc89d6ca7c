//! Free-variable capture: scope analysis and the IR it drives agree

#[path = "../common/mod.rs"]
mod common;

use common::{listing, lower, parse};
use pretty_assertions::assert_eq;
use scriptgraph_ir::features::closure_resolution::{ScopeResolver, ScopeTree};
use scriptgraph_ir::shared::IdGenerator;
use scriptgraph_ir::DiagnosticKind;

fn captures(tree: &ScopeTree, qualified: &str) -> Vec<String> {
    let id = IdGenerator::decl_id("c.ets", qualified);
    tree.functions()
        .iter()
        .find(|f| f.decl_id == id)
        .unwrap_or_else(|| panic!("no function {}", qualified))
        .captures
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

#[test]
fn test_only_referenced_outer_locals_are_captured() {
    let tree = ScopeResolver::resolve(&parse(
        "c.ets",
        "function counter() { let n = 0; let unused = 1; function inc() { n = n + 1; return n; } return inc; }",
    ));
    assert_eq!(captures(&tree, "counter.inc"), vec!["n".to_string()]);
    assert!(captures(&tree, "counter").is_empty());
}

#[test]
fn test_intermediate_function_forwards_capture() {
    let tree = ScopeResolver::resolve(&parse(
        "c.ets",
        "function a() { const v = 1; function b() { function c() { return v; } return c; } return b; }",
    ));
    assert_eq!(captures(&tree, "a.b"), vec!["v".to_string()]);
    assert_eq!(captures(&tree, "a.b.c"), vec!["v".to_string()]);
}

#[test]
fn test_globals_and_parameters_of_self_are_not_captures() {
    let tree = ScopeResolver::resolve(&parse(
        "c.ets",
        "let config = 1;\nfunction f(x) { return x + config; }",
    ));
    assert!(captures(&tree, "f").is_empty());
}

#[test]
fn test_closure_body_reads_through_environment() {
    let module = lower(
        "c.ets",
        "function outer(seed) { let acc = seed; function add(d) { acc = acc + d; return acc; } return add; }",
    );
    let outer = listing(&module, "outer");
    assert!(outer.iter().any(|s| s.contains("newenv")), "{:?}", outer);
    assert!(outer.iter().any(|s| s.contains("closure <@c.ets: outer.add>(")), "{:?}", outer);

    let add = module.function_named("outer.add").unwrap();
    assert!(add.has_closures());
    assert_eq!(add.params, vec!["d".to_string()]);
    let stmts = listing(&module, "outer.add");
    assert_eq!(stmts[0], "%closures = parameter0");
    assert!(stmts.contains(&"d = parameter1".to_string()), "{:?}", stmts);
}

#[test]
fn test_ir_captures_match_scope_analysis() {
    let source = "function make() {\n\
                    const fns = [];\n\
                    for (let i = 0; i < 3; i++) { fns.push(() => i); }\n\
                    let total = 0;\n\
                    const sum = (xs) => { for (const x of xs) { total = total + x; } return total; };\n\
                    return [fns, sum];\n\
                  }";
    let module = lower("c.ets", source);
    let tree = ScopeResolver::resolve(&parse("c.ets", source));
    for set in tree.capture_sets() {
        let function = module
            .function(&set.function)
            .unwrap_or_else(|| panic!("no IR for {}", set.function));
        let names: Vec<&str> = function.captures.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, set.names(), "{}", set.function);
    }
    let per_iteration: Vec<bool> = tree
        .capture_sets()
        .iter()
        .flat_map(|s| s.captures.iter().map(|c| c.per_iteration))
        .collect();
    assert!(per_iteration.contains(&true));
    assert!(per_iteration.contains(&false));
}

#[test]
fn test_loop_closure_gets_fresh_environment_each_iteration() {
    let module = lower(
        "c.ets",
        "function make() {\n\
           const fns = [];\n\
           for (let i = 0; i < 3; i++) { fns.push(() => i); }\n\
           return fns;\n\
         }",
    );
    let stmts = listing(&module, "make");
    let closure = stmts
        .iter()
        .position(|s| s.contains("closure <"))
        .unwrap_or_else(|| panic!("no closure in {:?}", stmts));
    let env = stmts[closure]
        .rsplit_once('(')
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .unwrap()
        .to_string();
    assert!(env.starts_with("%env"), "{}", stmts[closure]);

    let created = format!("{} = newenv", env);
    let renewals: Vec<usize> = stmts
        .iter()
        .enumerate()
        .filter(|(_, s)| s.starts_with(&created))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(renewals.len(), 2, "{:?}", stmts);
    // The closure in the body sees the environment of its own iteration
    assert!(renewals[0] < closure && closure < renewals[1], "{:?}", stmts);

    // Latch: save `i`, renew, copy it forward, then run the update
    let latch = renewals[1];
    let (saved, read) = stmts[latch - 1].split_once(" = ").unwrap();
    assert_eq!(read, format!("{}.i", env));
    assert_eq!(stmts[latch + 1], format!("{}.i = {}", env, saved));
    let update = stmts[latch + 2..]
        .iter()
        .position(|s| s.ends_with(" + 1"))
        .unwrap_or_else(|| panic!("no update after latch in {:?}", stmts));
    assert!(stmts[latch + 2 + update + 1].starts_with(&format!("{}.i = ", env)));
}

#[test]
fn test_top_level_functions_take_no_environment() {
    let module = lower("c.ets", "function f(a) { return a; }\nconst g = (b) => b;");
    for f in &module.functions {
        assert!(!f.has_closures(), "{}", f.id);
        assert!(f.captures.is_empty());
    }
}

#[test]
fn test_nested_destructuring_inside_closure_is_lowered() {
    let module = lower(
        "c.ets",
        "function outer(pairs) {\n\
           function run() { for (const [[a, b], { c = 1 }] of pairs) { sink(a, b, c); } }\n\
           return run;\n\
         }",
    );
    assert_eq!(
        module
            .diagnostics
            .of_kind(DiagnosticKind::UnsupportedPattern)
            .count(),
        0,
        "{:?}",
        module.diagnostics
    );
    let run = listing(&module, "outer.run");
    for name in ["a", "b", "c"] {
        let prefix = format!("{} = ", name);
        assert!(run.iter().any(|s| s.starts_with(&prefix)), "{} unbound in {:?}", name, run);
    }
    assert!(run.iter().any(|s| s.ends_with("[0]")), "{:?}", run);
    assert!(run.iter().any(|s| s.ends_with(".c")), "{:?}", run);
    let captured: Vec<&str> = module
        .function_named("outer.run")
        .unwrap()
        .captures
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(captured, vec!["pairs"]);
}
