//! tree-sitter front-end feeding the analysis core

#[path = "../common/mod.rs"]
mod common;

use common::{lower, parse};
use pretty_assertions::assert_eq;
use scriptgraph_ir::features::parsing::domain::{ExportDecl, StmtKind};
use scriptgraph_ir::features::parsing::{ParseUnitUseCase, SourceParser, TypeScriptParser};
use scriptgraph_ir::shared::models::DiagnosticKind;

#[test]
fn test_module_items_in_source_order() {
    let unit = parse(
        "page.ets",
        "import { router } from '@ohos/router';\n\
         interface Props { title: string }\n\
         export function open(p: Props) { router.push(p.title); }\n\
         class Page { build() {} }",
    );
    let kinds: Vec<&str> = unit
        .body
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Import(_) => "import",
            StmtKind::Empty => "empty",
            StmtKind::Export(ExportDecl::Decl(_)) => "export",
            StmtKind::Class(_) => "class",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["import", "empty", "export", "class"]);
}

#[test]
fn test_type_annotations_are_kept_on_parameters() {
    let unit = parse("t.ets", "function f(a: number, b: Widget) { return a; }");
    let StmtKind::Function(def) = &unit.body[0].kind else {
        panic!("expected function");
    };
    let types: Vec<Option<&str>> = def.params.iter().map(|p| p.type_ann.as_deref()).collect();
    assert_eq!(types, vec![Some("number"), Some("Widget")]);
}

#[test]
fn test_unsupported_construct_is_reported_not_fatal() {
    let module = lower(
        "t.ets",
        "namespace Legacy { export const x = 1; }\nfunction after() { return 2; }",
    );
    assert!(module.function_named("after").is_some());
    assert!(
        module
            .diagnostics
            .of_kind(DiagnosticKind::UnsupportedPattern)
            .count()
            >= 1,
        "{:?}",
        module.diagnostics
    );
}

#[test]
fn test_syntax_errors_do_not_abort_the_unit() {
    let unit = TypeScriptParser::new()
        .parse("function ok() { return 1; }\nlet = ;\n", "broken.ets")
        .unwrap();
    assert!(unit
        .body
        .iter()
        .any(|s| matches!(&s.kind, StmtKind::Function(f) if f.name.as_deref() == Some("ok"))));
}

#[test]
fn test_batch_parse_keeps_input_order() {
    let files: Vec<(String, String)> = (0..16)
        .map(|i| (format!("m{}.ets", i), format!("export function f{}() {{}}", i)))
        .collect();
    let units = ParseUnitUseCase::new(TypeScriptParser::new()).execute_batch(&files);
    let paths: Vec<String> = units.into_iter().map(|u| u.unwrap().file_path).collect();
    let expected: Vec<String> = files.into_iter().map(|(p, _)| p).collect();
    assert_eq!(paths, expected);
}

#[test]
fn test_parser_metadata() {
    let parser = TypeScriptParser::new();
    assert_eq!(parser.language_name(), "typescript");
    assert!(parser.supports_extension("ets"));
    assert!(parser.supports_extension("ts"));
    assert!(!parser.supports_extension("py"));
}
