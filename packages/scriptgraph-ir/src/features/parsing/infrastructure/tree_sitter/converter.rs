//! tree-sitter → AST conversion
//!
//! A one-node-at-a-time translation. Anything the converter does not know
//! becomes an `Unsupported(kind)` node so lowering can attach a diagnostic
//! at the right span instead of the conversion failing.

use tree_sitter::Node;

use super::node_kinds as nk;
use crate::features::parsing::domain::*;
use crate::shared::models::Span;

/// Convert a tree-sitter node to a Span (1-based lines, 0-based columns)
pub(crate) fn node_span(node: &Node) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(
        start.row as u32 + 1,
        start.column as u32,
        end.row as u32 + 1,
        end.column as u32,
    )
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != nk::COMMENT)
        .collect()
}

fn all_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() != nk::COMMENT)
        .collect()
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node).into_iter().next()
}

/// Anonymous token children (`static`, `async`, `*`, `get` …)
fn has_token(node: Node<'_>, token: &str) -> bool {
    all_children(node)
        .iter()
        .any(|c| !c.is_named() && c.kind() == token)
}

pub(crate) struct AstConverter<'s> {
    source: &'s str,
}

impl<'s> AstConverter<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn string_value(&self, node: Node<'_>) -> String {
        let raw = self.text(node);
        if raw.len() >= 2 {
            raw[1..raw.len() - 1].to_string()
        } else {
            raw.to_string()
        }
    }

    pub(crate) fn convert_program(&self, root: Node<'_>) -> Vec<Stmt> {
        self.convert_stmts(root)
    }

    fn convert_stmts(&self, parent: Node<'_>) -> Vec<Stmt> {
        named_children(parent)
            .into_iter()
            .map(|c| self.convert_stmt(c))
            .collect()
    }

    /// Body of a compound statement: a block flattens to its statements
    fn convert_body(&self, node: Node<'_>) -> Vec<Stmt> {
        if node.kind() == nk::STATEMENT_BLOCK {
            self.convert_stmts(node)
        } else {
            vec![self.convert_stmt(node)]
        }
    }

    fn boxed_stmt(&self, node: Option<Node<'_>>, span: Span) -> Box<Stmt> {
        Box::new(match node {
            Some(n) => self.convert_stmt(n),
            None => Stmt::new(StmtKind::Empty, span),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    fn convert_stmt(&self, node: Node<'_>) -> Stmt {
        let span = node_span(&node);
        let kind = match node.kind() {
            nk::EXPRESSION_STATEMENT => match first_named(node) {
                Some(expr) => StmtKind::Expr(self.convert_expr(expr)),
                None => StmtKind::Empty,
            },
            nk::LEXICAL_DECLARATION | nk::VARIABLE_DECLARATION => {
                StmtKind::VarDecl(self.convert_var_decl(node))
            }
            nk::FUNCTION_DECLARATION | nk::GENERATOR_FUNCTION_DECLARATION => {
                StmtKind::Function(self.convert_function(node))
            }
            nk::CLASS_DECLARATION | nk::ABSTRACT_CLASS_DECLARATION => {
                StmtKind::Class(self.convert_class(node))
            }
            nk::ENUM_DECLARATION => self.convert_enum(node),
            nk::RETURN_STATEMENT => StmtKind::Return(first_named(node).map(|e| self.convert_expr(e))),
            nk::THROW_STATEMENT => match first_named(node) {
                Some(e) => StmtKind::Throw(self.convert_expr(e)),
                None => StmtKind::Unsupported(node.kind().to_string()),
            },
            nk::IF_STATEMENT => {
                let alternate = node.child_by_field_name("alternative").map(|alt| {
                    let inner = if alt.kind() == nk::ELSE_CLAUSE {
                        first_named(alt)
                    } else {
                        Some(alt)
                    };
                    self.boxed_stmt(inner, node_span(&alt))
                });
                StmtKind::If {
                    test: self.field_expr(node, "condition"),
                    consequent: self.boxed_stmt(node.child_by_field_name("consequence"), span),
                    alternate,
                }
            }
            nk::WHILE_STATEMENT => StmtKind::While {
                test: self.field_expr(node, "condition"),
                body: self.boxed_stmt(node.child_by_field_name("body"), span),
            },
            nk::DO_STATEMENT => StmtKind::DoWhile {
                body: self.boxed_stmt(node.child_by_field_name("body"), span),
                test: self.field_expr(node, "condition"),
            },
            nk::FOR_STATEMENT => self.convert_for(node, span),
            nk::FOR_IN_STATEMENT => self.convert_for_in(node, span),
            nk::STATEMENT_BLOCK => StmtKind::Block(self.convert_stmts(node)),
            nk::TRY_STATEMENT => self.convert_try(node),
            nk::SWITCH_STATEMENT => self.convert_switch(node),
            nk::BREAK_STATEMENT => StmtKind::Break(self.label_of(node)),
            nk::CONTINUE_STATEMENT => StmtKind::Continue(self.label_of(node)),
            nk::LABELED_STATEMENT => StmtKind::Labeled {
                label: node
                    .child_by_field_name("label")
                    .map(|l| self.text(l).to_string())
                    .unwrap_or_default(),
                body: self.boxed_stmt(node.child_by_field_name("body"), span),
            },
            nk::IMPORT_STATEMENT => self.convert_import(node),
            nk::EXPORT_STATEMENT => self.convert_export(node, span),
            nk::EMPTY_STATEMENT => StmtKind::Empty,
            kind if nk::TYPE_ONLY_DECLARATIONS.contains(kind) => StmtKind::Empty,
            other => StmtKind::Unsupported(other.to_string()),
        };
        Stmt::new(kind, span)
    }

    fn label_of(&self, node: Node<'_>) -> Option<String> {
        node.child_by_field_name("label")
            .map(|l| self.text(l).to_string())
    }

    fn convert_var_decl(&self, node: Node<'_>) -> VarDecl {
        let kind = if node.kind() == nk::VARIABLE_DECLARATION {
            VarKind::Var
        } else {
            match node.child_by_field_name("kind").map(|k| self.text(k)) {
                Some("const") => VarKind::Const,
                Some("var") => VarKind::Var,
                _ => VarKind::Let,
            }
        };

        let declarators = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == nk::VARIABLE_DECLARATOR)
            .map(|d| Declarator {
                pattern: d
                    .child_by_field_name("name")
                    .map(|n| self.convert_pattern(n))
                    .unwrap_or_else(|| Pattern::Ident(String::new())),
                type_ann: d.child_by_field_name("type").and_then(|t| self.type_name(t)),
                init: d.child_by_field_name("value").map(|v| self.convert_expr(v)),
                span: node_span(&d),
            })
            .collect();

        VarDecl { kind, declarators }
    }

    fn convert_for(&self, node: Node<'_>, span: Span) -> StmtKind {
        let init = node
            .child_by_field_name("initializer")
            .and_then(|i| match i.kind() {
                nk::LEXICAL_DECLARATION | nk::VARIABLE_DECLARATION => {
                    Some(ForInit::VarDecl(self.convert_var_decl(i)))
                }
                nk::EMPTY_STATEMENT => None,
                nk::EXPRESSION_STATEMENT => first_named(i).map(|e| ForInit::Expr(self.convert_expr(e))),
                _ => Some(ForInit::Expr(self.convert_expr(i))),
            });

        let test = node
            .child_by_field_name("condition")
            .and_then(|c| match c.kind() {
                nk::EMPTY_STATEMENT => None,
                nk::EXPRESSION_STATEMENT => first_named(c).map(|e| self.convert_expr(e)),
                _ if !c.is_named() => None,
                _ => Some(self.convert_expr(c)),
            });

        StmtKind::For {
            init,
            test,
            update: node.child_by_field_name("increment").map(|u| self.convert_expr(u)),
            body: self.boxed_stmt(node.child_by_field_name("body"), span),
        }
    }

    fn convert_for_in(&self, node: Node<'_>, span: Span) -> StmtKind {
        let kind = node
            .child_by_field_name("kind")
            .and_then(|k| match self.text(k) {
                "var" => Some(VarKind::Var),
                "let" => Some(VarKind::Let),
                "const" => Some(VarKind::Const),
                _ => None,
            });
        let pattern = node
            .child_by_field_name("left")
            .map(|l| self.convert_pattern(l))
            .unwrap_or_else(|| Pattern::Ident(String::new()));
        let is_of = match node.child_by_field_name("operator") {
            Some(op) => self.text(op) == "of",
            None => has_token(node, "of"),
        };

        let head = ForHead { kind, pattern };
        let right = self.field_expr(node, "right");
        let body = self.boxed_stmt(node.child_by_field_name("body"), span);
        if is_of {
            StmtKind::ForOf { head, right, body }
        } else {
            StmtKind::ForIn { head, right, body }
        }
    }

    fn convert_try(&self, node: Node<'_>) -> StmtKind {
        let block = node
            .child_by_field_name("body")
            .map(|b| self.convert_body(b))
            .unwrap_or_default();

        let handler = node.child_by_field_name("handler").map(|h| CatchClause {
            param: h.child_by_field_name("parameter").map(|p| self.convert_pattern(p)),
            body: h
                .child_by_field_name("body")
                .map(|b| self.convert_body(b))
                .unwrap_or_default(),
            span: node_span(&h),
        });

        let finalizer = node.child_by_field_name("finalizer").map(|f| {
            f.child_by_field_name("body")
                .or_else(|| first_named(f))
                .map(|b| self.convert_body(b))
                .unwrap_or_default()
        });

        StmtKind::Try {
            block,
            handler,
            finalizer,
        }
    }

    fn convert_switch(&self, node: Node<'_>) -> StmtKind {
        let discriminant = self.field_expr(node, "value");
        let cases = node
            .child_by_field_name("body")
            .map(|body| {
                named_children(body)
                    .into_iter()
                    .filter(|c| c.kind() == nk::SWITCH_CASE || c.kind() == nk::SWITCH_DEFAULT)
                    .map(|case| {
                        let mut cursor = case.walk();
                        let stmts = case
                            .children_by_field_name("body", &mut cursor)
                            .filter(|c| c.kind() != nk::COMMENT)
                            .map(|s| self.convert_stmt(s))
                            .collect();
                        SwitchCase {
                            test: if case.kind() == nk::SWITCH_CASE {
                                case.child_by_field_name("value").map(|v| self.convert_expr(v))
                            } else {
                                None
                            },
                            body: stmts,
                            span: node_span(&case),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        StmtKind::Switch { discriminant, cases }
    }

    fn convert_import(&self, node: Node<'_>) -> StmtKind {
        let source = node
            .child_by_field_name("source")
            .map(|s| self.string_value(s))
            .unwrap_or_default();

        let mut specifiers = Vec::new();
        if let Some(clause) = named_children(node)
            .into_iter()
            .find(|c| c.kind() == nk::IMPORT_CLAUSE)
        {
            for part in named_children(clause) {
                match part.kind() {
                    nk::IDENTIFIER => {
                        specifiers.push(ImportSpecifier::Default(self.text(part).to_string()))
                    }
                    nk::NAMESPACE_IMPORT => {
                        if let Some(id) = first_named(part) {
                            specifiers.push(ImportSpecifier::Namespace(self.text(id).to_string()));
                        }
                    }
                    nk::NAMED_IMPORTS => {
                        for spec in named_children(part)
                            .into_iter()
                            .filter(|s| s.kind() == nk::IMPORT_SPECIFIER)
                        {
                            let Some(name) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let imported = self.text(name).to_string();
                            let local = spec
                                .child_by_field_name("alias")
                                .map(|a| self.text(a).to_string())
                                .unwrap_or_else(|| imported.clone());
                            specifiers.push(ImportSpecifier::Named { imported, local });
                        }
                    }
                    _ => {}
                }
            }
        }

        StmtKind::Import(ImportDecl { source, specifiers })
    }

    fn convert_export(&self, node: Node<'_>, span: Span) -> StmtKind {
        let is_default = has_token(node, "default");
        let source = node
            .child_by_field_name("source")
            .map(|s| self.string_value(s));

        if let Some(decl) = node.child_by_field_name("declaration") {
            let stmt = Box::new(self.convert_stmt(decl));
            return StmtKind::Export(if is_default {
                ExportDecl::Default(stmt)
            } else {
                ExportDecl::Decl(stmt)
            });
        }

        if let Some(value) = node.child_by_field_name("value") {
            let expr = self.convert_expr(value);
            return StmtKind::Export(ExportDecl::Default(Box::new(Stmt::new(
                StmtKind::Expr(expr),
                span,
            ))));
        }

        if let Some(clause) = named_children(node)
            .into_iter()
            .find(|c| c.kind() == nk::EXPORT_CLAUSE)
        {
            let specifiers = named_children(clause)
                .into_iter()
                .filter(|s| s.kind() == nk::EXPORT_SPECIFIER)
                .filter_map(|s| {
                    let local = self.text(s.child_by_field_name("name")?).to_string();
                    let exported = s
                        .child_by_field_name("alias")
                        .map(|a| self.text(a).to_string())
                        .unwrap_or_else(|| local.clone());
                    Some(ExportSpecifier { local, exported })
                })
                .collect();
            return StmtKind::Export(ExportDecl::Named { specifiers, source });
        }

        if has_token(node, "*") {
            return StmtKind::Export(ExportDecl::Named {
                specifiers: vec![ExportSpecifier {
                    local: "*".to_string(),
                    exported: "*".to_string(),
                }],
                source,
            });
        }

        StmtKind::Unsupported(node.kind().to_string())
    }

    /// `enum E { A, B = 5 }` becomes `const E = { A: 0, B: 5 }`
    fn convert_enum(&self, node: Node<'_>) -> StmtKind {
        let Some(name) = node.child_by_field_name("name") else {
            return StmtKind::Unsupported(node.kind().to_string());
        };
        let span = node_span(&node);

        let mut next_ordinal: i64 = 0;
        let mut props = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                let member_span = node_span(&member);
                let (key_node, value) = if member.kind() == nk::ENUM_ASSIGNMENT {
                    (
                        member.child_by_field_name("name"),
                        member.child_by_field_name("value").map(|v| self.convert_expr(v)),
                    )
                } else {
                    (Some(member), None)
                };
                let Some(key_node) = key_node else { continue };

                let value = value.unwrap_or_else(|| {
                    Expr::new(ExprKind::Literal(Literal::Number(next_ordinal.to_string())), member_span)
                });
                if let ExprKind::Literal(Literal::Number(n)) = &value.kind {
                    if let Ok(parsed) = n.parse::<i64>() {
                        next_ordinal = parsed;
                    }
                }
                next_ordinal += 1;

                props.push(Property::KeyValue {
                    key: self.prop_key(key_node),
                    value,
                });
            }
        }

        StmtKind::VarDecl(VarDecl {
            kind: VarKind::Const,
            declarators: vec![Declarator {
                pattern: Pattern::Ident(self.text(name).to_string()),
                type_ann: None,
                init: Some(Expr::new(ExprKind::Object(props), span)),
                span,
            }],
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Functions and classes
    // ═══════════════════════════════════════════════════════════════════════

    fn convert_function(&self, node: Node<'_>) -> FunctionDef {
        let span = node_span(&node);
        let is_arrow = node.kind() == nk::ARROW_FUNCTION;

        let params = if let Some(params) = node.child_by_field_name("parameters") {
            named_children(params)
                .into_iter()
                .filter_map(|p| self.convert_param(p))
                .collect()
        } else if let Some(single) = node.child_by_field_name("parameter") {
            vec![Param {
                pattern: self.convert_pattern(single),
                default: None,
                type_ann: None,
                rest: false,
            }]
        } else {
            Vec::new()
        };

        let body = match node.child_by_field_name("body") {
            Some(b) if b.kind() == nk::STATEMENT_BLOCK => self.convert_stmts(b),
            Some(expr) => {
                let expr = self.convert_expr(expr);
                let span = expr.span;
                vec![Stmt::new(StmtKind::Return(Some(expr)), span)]
            }
            None => Vec::new(),
        };

        FunctionDef {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
            params,
            body,
            is_arrow,
            is_async: has_token(node, "async"),
            is_generator: has_token(node, "*") || node.kind().contains("generator"),
            return_type: node
                .child_by_field_name("return_type")
                .and_then(|t| self.type_name(t)),
            span,
        }
    }

    fn convert_param(&self, node: Node<'_>) -> Option<Param> {
        match node.kind() {
            nk::REQUIRED_PARAMETER | nk::OPTIONAL_PARAMETER => {
                let pattern_node = node.child_by_field_name("pattern")?;
                if pattern_node.kind() == nk::THIS {
                    return None;
                }
                let (pattern, rest) = if pattern_node.kind() == nk::REST_PATTERN {
                    (self.convert_pattern(first_named(pattern_node)?), true)
                } else {
                    (self.convert_pattern(pattern_node), false)
                };
                Some(Param {
                    pattern,
                    default: node.child_by_field_name("value").map(|v| self.convert_expr(v)),
                    type_ann: node.child_by_field_name("type").and_then(|t| self.type_name(t)),
                    rest,
                })
            }
            nk::ASSIGNMENT_PATTERN => Some(Param {
                pattern: self.convert_pattern(node.child_by_field_name("left")?),
                default: node.child_by_field_name("right").map(|v| self.convert_expr(v)),
                type_ann: None,
                rest: false,
            }),
            nk::REST_PATTERN => Some(Param {
                pattern: self.convert_pattern(first_named(node)?),
                default: None,
                type_ann: None,
                rest: true,
            }),
            nk::IDENTIFIER | nk::ARRAY_PATTERN | nk::OBJECT_PATTERN => Some(Param {
                pattern: self.convert_pattern(node),
                default: None,
                type_ann: None,
                rest: false,
            }),
            // decorators, accessibility modifiers …
            _ => None,
        }
    }

    fn convert_class(&self, node: Node<'_>) -> ClassDef {
        let extends = named_children(node)
            .into_iter()
            .find(|c| c.kind() == nk::CLASS_HERITAGE)
            .and_then(|heritage| {
                match named_children(heritage)
                    .into_iter()
                    .find(|c| c.kind() == nk::EXTENDS_CLAUSE)
                {
                    Some(clause) => clause
                        .child_by_field_name("value")
                        .or_else(|| first_named(clause)),
                    // JavaScript grammar: `class_heritage` holds the expression directly
                    None => first_named(heritage),
                }
            })
            .map(|e| self.convert_expr(e));

        let members = node
            .child_by_field_name("body")
            .map(|body| {
                named_children(body)
                    .into_iter()
                    .filter_map(|m| self.convert_member(m))
                    .collect()
            })
            .unwrap_or_default();

        ClassDef {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
            extends,
            members,
            span: node_span(&node),
        }
    }

    fn convert_member(&self, node: Node<'_>) -> Option<ClassMember> {
        match node.kind() {
            nk::METHOD_DEFINITION => {
                let name_node = node.child_by_field_name("name")?;
                let name = self.text(name_node).to_string();

                // Modifier tokens precede the name; `get()` alone is a plain method
                let mut is_static = false;
                let mut accessor = None;
                for child in all_children(node) {
                    if child.id() == name_node.id() {
                        break;
                    }
                    match child.kind() {
                        "static" => is_static = true,
                        "get" => accessor = Some("%get$"),
                        "set" => accessor = Some("%set$"),
                        _ => {}
                    }
                }

                let function = self.convert_function(node);
                if name == "constructor" && !is_static {
                    return Some(ClassMember::Constructor(function));
                }
                let name = match accessor {
                    Some(prefix) => format!("{}{}", prefix, name),
                    None => name,
                };
                Some(ClassMember::Method(MethodDef {
                    name,
                    is_static,
                    function,
                }))
            }
            nk::PUBLIC_FIELD_DEFINITION | nk::FIELD_DEFINITION => {
                let name_node = node
                    .child_by_field_name("name")
                    .or_else(|| node.child_by_field_name("property"))?;
                Some(ClassMember::Field(FieldDef {
                    name: self.text(name_node).to_string(),
                    is_static: has_token(node, "static"),
                    type_ann: node.child_by_field_name("type").and_then(|t| self.type_name(t)),
                    init: node.child_by_field_name("value").map(|v| self.convert_expr(v)),
                    span: node_span(&node),
                }))
            }
            _ => None,
        }
    }

    /// Nominal type name from a `type_annotation` (generic arguments dropped)
    fn type_name(&self, node: Node<'_>) -> Option<String> {
        let ty = if node.kind() == nk::TYPE_ANNOTATION {
            first_named(node)?
        } else {
            node
        };
        let named = if ty.kind() == nk::GENERIC_TYPE {
            ty.child_by_field_name("name").unwrap_or(ty)
        } else {
            ty
        };
        Some(self.text(named).to_string())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════

    fn field_expr(&self, node: Node<'_>, field: &str) -> Expr {
        match node.child_by_field_name(field) {
            Some(child) => self.convert_expr(child),
            None => Expr::new(ExprKind::Unsupported(format!("missing {}", field)), node_span(&node)),
        }
    }

    fn boxed_field(&self, node: Node<'_>, field: &str) -> Box<Expr> {
        Box::new(self.field_expr(node, field))
    }

    fn convert_args(&self, node: Option<Node<'_>>) -> Vec<Expr> {
        match node {
            Some(args) if args.kind() == nk::TEMPLATE_STRING => vec![self.convert_expr(args)],
            Some(args) => named_children(args)
                .into_iter()
                .map(|a| self.convert_expr(a))
                .collect(),
            None => Vec::new(),
        }
    }

    fn convert_expr(&self, node: Node<'_>) -> Expr {
        let span = node_span(&node);
        let kind = match node.kind() {
            nk::IDENTIFIER | nk::SHORTHAND_PROPERTY_IDENTIFIER => {
                ExprKind::Ident(self.text(node).to_string())
            }
            nk::UNDEFINED => ExprKind::Literal(Literal::Undefined),
            nk::THIS => ExprKind::This,
            nk::SUPER => ExprKind::Super,
            nk::NUMBER => ExprKind::Literal(Literal::Number(self.text(node).to_string())),
            nk::STRING => ExprKind::Literal(Literal::String(self.string_value(node))),
            nk::REGEX => ExprKind::Literal(Literal::Regex(self.text(node).to_string())),
            nk::TRUE => ExprKind::Literal(Literal::Bool(true)),
            nk::FALSE => ExprKind::Literal(Literal::Bool(false)),
            nk::NULL => ExprKind::Literal(Literal::Null),
            nk::TEMPLATE_STRING => self.convert_template(node),
            nk::ARRAY => ExprKind::Array(
                self.with_holes(node)
                    .into_iter()
                    .map(|e| e.map(|n| self.convert_expr(n)))
                    .collect(),
            ),
            nk::OBJECT => ExprKind::Object(
                named_children(node)
                    .into_iter()
                    .filter_map(|p| self.convert_property(p))
                    .collect(),
            ),
            nk::MEMBER_EXPRESSION => ExprKind::Member {
                object: self.boxed_field(node, "object"),
                property: node
                    .child_by_field_name("property")
                    .map(|p| self.text(p).to_string())
                    .unwrap_or_default(),
                optional: self.is_optional(node),
            },
            nk::SUBSCRIPT_EXPRESSION => ExprKind::Index {
                object: self.boxed_field(node, "object"),
                index: self.boxed_field(node, "index"),
            },
            nk::CALL_EXPRESSION => ExprKind::Call {
                callee: self.boxed_field(node, "function"),
                args: self.convert_args(node.child_by_field_name("arguments")),
                optional: self.is_optional(node),
            },
            nk::NEW_EXPRESSION => ExprKind::New {
                callee: self.boxed_field(node, "constructor"),
                args: self.convert_args(node.child_by_field_name("arguments")),
            },
            nk::BINARY_EXPRESSION => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or("");
                let left = self.boxed_field(node, "left");
                let right = self.boxed_field(node, "right");
                if let Some(op) = LogicalOp::from_token(op) {
                    ExprKind::Logical { op, left, right }
                } else if let Some(op) = BinaryOp::from_token(op) {
                    ExprKind::Binary { op, left, right }
                } else {
                    ExprKind::Unsupported(format!("binary operator {}", op))
                }
            }
            nk::UNARY_EXPRESSION => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or("");
                match UnaryOp::from_token(op) {
                    Some(op) => ExprKind::Unary {
                        op,
                        arg: self.boxed_field(node, "argument"),
                    },
                    None => ExprKind::Unsupported(format!("unary operator {}", op)),
                }
            }
            nk::UPDATE_EXPRESSION => {
                let op_text = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or("++");
                let prefix = node
                    .child(0)
                    .map(|c| !c.is_named())
                    .unwrap_or(false);
                ExprKind::Update {
                    op: if op_text == "--" { UpdateOp::Dec } else { UpdateOp::Inc },
                    prefix,
                    arg: self.boxed_field(node, "argument"),
                }
            }
            nk::ASSIGNMENT_EXPRESSION | nk::AUGMENTED_ASSIGNMENT_EXPRESSION => {
                let op = if node.kind() == nk::ASSIGNMENT_EXPRESSION {
                    Some(AssignOp::Assign)
                } else {
                    node.child_by_field_name("operator")
                        .and_then(|o| AssignOp::from_token(self.text(o)))
                };
                match (op, node.child_by_field_name("left")) {
                    (Some(op), Some(left)) => ExprKind::Assign {
                        op,
                        target: Box::new(self.convert_pattern(left)),
                        value: self.boxed_field(node, "right"),
                    },
                    _ => ExprKind::Unsupported(node.kind().to_string()),
                }
            }
            nk::TERNARY_EXPRESSION => ExprKind::Conditional {
                test: self.boxed_field(node, "condition"),
                consequent: self.boxed_field(node, "consequence"),
                alternate: self.boxed_field(node, "alternative"),
            },
            nk::PARENTHESIZED_EXPRESSION => {
                return match first_named(node) {
                    Some(inner) => self.convert_expr(inner),
                    None => Expr::new(ExprKind::Unsupported(node.kind().to_string()), span),
                };
            }
            nk::SEQUENCE_EXPRESSION => {
                let mut exprs = Vec::new();
                self.flatten_sequence(node, &mut exprs);
                ExprKind::Sequence(exprs)
            }
            nk::AWAIT_EXPRESSION => match first_named(node) {
                Some(arg) => ExprKind::Await(Box::new(self.convert_expr(arg))),
                None => ExprKind::Unsupported(node.kind().to_string()),
            },
            nk::YIELD_EXPRESSION => ExprKind::Yield {
                arg: first_named(node).map(|a| Box::new(self.convert_expr(a))),
                delegate: has_token(node, "*"),
            },
            nk::SPREAD_ELEMENT => match first_named(node) {
                Some(arg) => ExprKind::Spread(Box::new(self.convert_expr(arg))),
                None => ExprKind::Unsupported(node.kind().to_string()),
            },
            nk::CLASS => ExprKind::Class(Box::new(self.convert_class(node))),
            kind if nk::is_function_kind(kind) => {
                ExprKind::Function(Box::new(self.convert_function(node)))
            }
            kind if nk::TYPE_WRAPPER_KINDS.contains(kind) => {
                return match first_named(node) {
                    Some(inner) => self.convert_expr(inner),
                    None => Expr::new(ExprKind::Unsupported(kind.to_string()), span),
                };
            }
            nk::TYPE_ASSERTION => {
                return match named_children(node).pop() {
                    Some(inner) => self.convert_expr(inner),
                    None => Expr::new(ExprKind::Unsupported(node.kind().to_string()), span),
                };
            }
            other => ExprKind::Unsupported(other.to_string()),
        };
        Expr::new(kind, span)
    }

    fn is_optional(&self, node: Node<'_>) -> bool {
        all_children(node)
            .iter()
            .any(|c| c.kind() == nk::OPTIONAL_CHAIN || c.kind() == "?.")
    }

    fn flatten_sequence(&self, node: Node<'_>, out: &mut Vec<Expr>) {
        for child in named_children(node) {
            if child.kind() == nk::SEQUENCE_EXPRESSION {
                self.flatten_sequence(child, out);
            } else {
                out.push(self.convert_expr(child));
            }
        }
    }

    fn convert_template(&self, node: Node<'_>) -> ExprKind {
        let range = node.byte_range();
        // Skip the surrounding backticks
        let mut cursor_byte = range.start + 1;
        let end_byte = range.end.saturating_sub(1).max(cursor_byte);

        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        for sub in named_children(node)
            .into_iter()
            .filter(|c| c.kind() == nk::TEMPLATE_SUBSTITUTION)
        {
            quasis.push(
                self.source
                    .get(cursor_byte..sub.start_byte())
                    .unwrap_or("")
                    .to_string(),
            );
            exprs.push(match first_named(sub) {
                Some(e) => self.convert_expr(e),
                None => Expr::new(ExprKind::Literal(Literal::Undefined), node_span(&sub)),
            });
            cursor_byte = sub.end_byte();
        }
        quasis.push(self.source.get(cursor_byte..end_byte).unwrap_or("").to_string());

        ExprKind::Template { quasis, exprs }
    }

    fn convert_property(&self, node: Node<'_>) -> Option<Property> {
        match node.kind() {
            nk::PAIR => Some(Property::KeyValue {
                key: self.prop_key(node.child_by_field_name("key")?),
                value: self.field_expr(node, "value"),
            }),
            nk::SHORTHAND_PROPERTY_IDENTIFIER => {
                let name = self.text(node).to_string();
                Some(Property::KeyValue {
                    key: PropKey::Ident(name.clone()),
                    value: Expr::ident(name, node_span(&node)),
                })
            }
            nk::SPREAD_ELEMENT => Some(Property::Spread(match first_named(node) {
                Some(arg) => self.convert_expr(arg),
                None => Expr::new(ExprKind::Unsupported(node.kind().to_string()), node_span(&node)),
            })),
            nk::METHOD_DEFINITION => {
                // Object-literal methods do not bind their own name
                let mut function = self.convert_function(node);
                function.name = None;
                Some(Property::KeyValue {
                    key: self.prop_key(node.child_by_field_name("name")?),
                    value: Expr::new(ExprKind::Function(Box::new(function)), node_span(&node)),
                })
            }
            _ => None,
        }
    }

    fn prop_key(&self, node: Node<'_>) -> PropKey {
        match node.kind() {
            nk::STRING => PropKey::Ident(self.string_value(node)),
            nk::COMPUTED_PROPERTY_NAME => match first_named(node) {
                Some(inner) => PropKey::Computed(self.convert_expr(inner)),
                None => PropKey::Ident(self.text(node).to_string()),
            },
            _ => PropKey::Ident(self.text(node).to_string()),
        }
    }

    /// Array-like children with holes (`[a, , b]`) detected from comma tokens
    fn with_holes<'t>(&self, node: Node<'t>) -> Vec<Option<Node<'t>>> {
        let mut out = Vec::new();
        let mut pending = false;
        for child in all_children(node) {
            match child.kind() {
                "," => {
                    if !pending {
                        out.push(None);
                    }
                    pending = false;
                }
                _ if child.is_named() => {
                    out.push(Some(child));
                    pending = true;
                }
                _ => {}
            }
        }
        out
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Patterns
    // ═══════════════════════════════════════════════════════════════════════

    fn convert_pattern(&self, node: Node<'_>) -> Pattern {
        match node.kind() {
            nk::IDENTIFIER | nk::SHORTHAND_PROPERTY_IDENTIFIER_PATTERN => {
                Pattern::Ident(self.text(node).to_string())
            }
            nk::ARRAY_PATTERN | nk::ARRAY => {
                let mut elements = Vec::new();
                let mut rest = None;
                for elem in self.with_holes(node) {
                    match elem {
                        None => elements.push(None),
                        Some(e) if e.kind() == nk::REST_PATTERN || e.kind() == nk::SPREAD_ELEMENT => {
                            rest = first_named(e).map(|r| Box::new(self.convert_pattern(r)));
                        }
                        Some(e) => elements.push(Some(self.pattern_elem(e))),
                    }
                }
                Pattern::Array { elements, rest }
            }
            nk::OBJECT_PATTERN | nk::OBJECT => {
                let mut props = Vec::new();
                let mut rest = None;
                for prop in named_children(node) {
                    match prop.kind() {
                        nk::PAIR_PATTERN | nk::PAIR => {
                            let Some(key) = prop.child_by_field_name("key") else {
                                continue;
                            };
                            let key = match self.prop_key(key) {
                                PropKey::Ident(k) => k,
                                PropKey::Computed(_) => self.text(key).to_string(),
                            };
                            let elem = match prop.child_by_field_name("value") {
                                Some(v) => self.pattern_elem(v),
                                None => PatternElem {
                                    pattern: Pattern::Ident(key.clone()),
                                    default: None,
                                },
                            };
                            props.push(ObjectPatternProp {
                                key,
                                value: elem.pattern,
                                default: elem.default,
                            });
                        }
                        nk::SHORTHAND_PROPERTY_IDENTIFIER_PATTERN | nk::SHORTHAND_PROPERTY_IDENTIFIER => {
                            let key = self.text(prop).to_string();
                            props.push(ObjectPatternProp {
                                value: Pattern::Ident(key.clone()),
                                key,
                                default: None,
                            });
                        }
                        nk::OBJECT_ASSIGNMENT_PATTERN => {
                            let Some(left) = prop.child_by_field_name("left") else {
                                continue;
                            };
                            let key = self.text(left).to_string();
                            props.push(ObjectPatternProp {
                                value: self.convert_pattern(left),
                                key,
                                default: prop.child_by_field_name("right").map(|r| self.convert_expr(r)),
                            });
                        }
                        nk::REST_PATTERN | nk::SPREAD_ELEMENT => {
                            rest = first_named(prop).map(|r| Box::new(self.convert_pattern(r)));
                        }
                        _ => {}
                    }
                }
                Pattern::Object { props, rest }
            }
            nk::ASSIGNMENT_PATTERN => match node.child_by_field_name("left") {
                Some(left) => self.convert_pattern(left),
                None => Pattern::Expr(Box::new(self.convert_expr(node))),
            },
            nk::PARENTHESIZED_EXPRESSION | nk::NON_NULL_EXPRESSION => match first_named(node) {
                Some(inner) => self.convert_pattern(inner),
                None => Pattern::Expr(Box::new(self.convert_expr(node))),
            },
            _ => Pattern::Expr(Box::new(self.convert_expr(node))),
        }
    }

    fn pattern_elem(&self, node: Node<'_>) -> PatternElem {
        match node.kind() {
            nk::ASSIGNMENT_PATTERN | nk::ASSIGNMENT_EXPRESSION => PatternElem {
                pattern: node
                    .child_by_field_name("left")
                    .map(|l| self.convert_pattern(l))
                    .unwrap_or_else(|| Pattern::Expr(Box::new(self.convert_expr(node)))),
                default: node.child_by_field_name("right").map(|r| self.convert_expr(r)),
            },
            _ => PatternElem {
                pattern: self.convert_pattern(node),
                default: None,
            },
        }
    }
}
