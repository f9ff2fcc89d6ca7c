//! Source AST consumed by the analysis core
//!
//! Any front-end can produce this tree; the tree-sitter adapter in
//! `infrastructure` is one such producer. The shape is deliberately close to
//! ESTree so external parsers map onto it one node at a time.

use serde::{Deserialize, Serialize};

use crate::shared::models::Span;

/// One analysed source unit (a file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub file_path: String,
    pub body: Vec<Stmt>,
}

impl SourceUnit {
    pub fn new(file_path: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            file_path: file_path.into(),
            body,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Declarations that are hoisted and never "executed" as statements
    pub fn is_hoisted_declaration(&self) -> bool {
        matches!(self.kind, StmtKind::Function(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    VarDecl(VarDecl),
    Function(FunctionDef),
    Class(ClassDef),
    Expr(Expr),
    Return(Option<Expr>),
    Throw(Expr),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        head: ForHead,
        right: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        head: ForHead,
        right: Expr,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Import(ImportDecl),
    Export(ExportDecl),
    Empty,
    /// Construct the producer could not map; kept so lowering can report it
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn is_block_scoped(self) -> bool {
        !matches!(self, VarKind::Var)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub pattern: Pattern,
    /// Declared type name, if annotated
    pub type_ann: Option<String>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Expr),
}

/// Left-hand side of `for…of` / `for…in`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForHead {
    /// `None` when the loop assigns to an existing target
    pub kind: Option<VarKind>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub source: String,
    pub specifiers: Vec<ImportSpecifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportSpecifier {
    Named { imported: String, local: String },
    Default(String),
    Namespace(String),
}

impl ImportSpecifier {
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Named { local, .. } => local,
            ImportSpecifier::Default(local) | ImportSpecifier::Namespace(local) => local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportDecl {
    /// `export function f() {}`, `export class C {}`, `export const x = …`
    Decl(Box<Stmt>),
    /// `export default …` (declaration or expression statement)
    Default(Box<Stmt>),
    /// `export { a as b }` / `export { a } from './m'`
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// Functions and classes
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub is_arrow: bool,
    pub is_async: bool,
    pub is_generator: bool,
    pub return_type: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
    pub type_ann: Option<String>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: Option<String>,
    pub extends: Option<Expr>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

impl ClassDef {
    pub fn constructor(&self) -> Option<&FunctionDef> {
        self.members.iter().find_map(|m| match m {
            ClassMember::Constructor(f) => Some(f),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassMember {
    Field(FieldDef),
    Method(MethodDef),
    Constructor(FunctionDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub is_static: bool,
    pub type_ann: Option<String>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub is_static: bool,
    pub function: FunctionDef,
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// `a` or `a.b.c` as path segments
    pub fn dotted_path(&self) -> Option<Vec<String>> {
        match &self.kind {
            ExprKind::Ident(name) => Some(vec![name.clone()]),
            ExprKind::Member {
                object,
                property,
                optional: false,
            } => {
                let mut path = object.dotted_path()?;
                path.push(property.clone());
                Some(path)
            }
            _ => None,
        }
    }

    /// Whether evaluating `self` may write a binding or run user code
    ///
    /// Conservative: calls, construction, assignment, update, `await`,
    /// `yield`, `delete` and class expressions count anywhere below `self`.
    /// Function expressions only allocate.
    pub fn has_side_effects(&self) -> bool {
        match &self.kind {
            ExprKind::Ident(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::Literal(_)
            | ExprKind::Function(_)
            | ExprKind::Unsupported(_) => false,
            ExprKind::Call { .. }
            | ExprKind::New { .. }
            | ExprKind::Update { .. }
            | ExprKind::Assign { .. }
            | ExprKind::Await(_)
            | ExprKind::Yield { .. }
            | ExprKind::Class(_) => true,
            ExprKind::Unary {
                op: UnaryOp::Delete, ..
            } => true,
            ExprKind::Unary { arg, .. } | ExprKind::Spread(arg) => arg.has_side_effects(),
            ExprKind::Member { object, .. } => object.has_side_effects(),
            ExprKind::Index { object, index } => object.has_side_effects() || index.has_side_effects(),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                left.has_side_effects() || right.has_side_effects()
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => test.has_side_effects() || consequent.has_side_effects() || alternate.has_side_effects(),
            ExprKind::Array(elements) => elements.iter().flatten().any(Expr::has_side_effects),
            ExprKind::Object(props) => props.iter().any(|p| match p {
                Property::KeyValue {
                    key: PropKey::Computed(key),
                    value,
                } => key.has_side_effects() || value.has_side_effects(),
                Property::KeyValue { value, .. } | Property::Spread(value) => value.has_side_effects(),
            }),
            ExprKind::Template { exprs, .. } | ExprKind::Sequence(exprs) => {
                exprs.iter().any(Expr::has_side_effects)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(String),
    This,
    Super,
    Literal(Literal),
    /// `None` elements are holes (`[a, , b]`)
    Array(Vec<Option<Expr>>),
    Object(Vec<Property>),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        arg: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Pattern>,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Function(Box<FunctionDef>),
    Class(Box<ClassDef>),
    Await(Box<Expr>),
    Yield {
        arg: Option<Box<Expr>>,
        delegate: bool,
    },
    /// `quasis.len() == exprs.len() + 1`
    Template {
        quasis: Vec<String>,
        exprs: Vec<Expr>,
    },
    Spread(Box<Expr>),
    Sequence(Vec<Expr>),
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// Raw numeric text, kept verbatim
    Number(String),
    String(String),
    Bool(bool),
    Null,
    Undefined,
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    KeyValue { key: PropKey, value: Expr },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropKey {
    Ident(String),
    Computed(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    InstanceOf,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "**" => BinaryOp::Exp,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "===" => BinaryOp::StrictEq,
            "!==" => BinaryOp::StrictNotEq,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::LtEq,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::GtEq,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "in" => BinaryOp::In,
            "instanceof" => BinaryOp::InstanceOf,
            _ => return None,
        })
    }

    /// Comparison operators usable directly in a branch condition
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::StrictEq
                | BinaryOp::StrictNotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

impl LogicalOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "&&" => Some(LogicalOp::And),
            "||" => Some(LogicalOp::Or),
            "??" => Some(LogicalOp::Nullish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Plus,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitNot,
            "typeof" => UnaryOp::TypeOf,
            "void" => UnaryOp::Void,
            "delete" => UnaryOp::Delete,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::TypeOf => "typeof ",
            UnaryOp::Void => "void ",
            UnaryOp::Delete => "delete ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Op(BinaryOp),
    Logical(LogicalOp),
}

impl AssignOp {
    pub fn from_token(token: &str) -> Option<Self> {
        if token == "=" {
            return Some(AssignOp::Assign);
        }
        let op = token.strip_suffix('=')?;
        LogicalOp::from_token(op)
            .map(AssignOp::Logical)
            .or_else(|| BinaryOp::from_token(op).map(AssignOp::Op))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════════════════════

/// Binding / assignment target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Ident(String),
    Array {
        /// `None` elements are holes
        elements: Vec<Option<PatternElem>>,
        rest: Option<Box<Pattern>>,
    },
    Object {
        props: Vec<ObjectPatternProp>,
        rest: Option<Box<Pattern>>,
    },
    /// Member / index target (`a.b = …`, `a[i] = …`) or anything else
    Expr(Box<Expr>),
}

impl Pattern {
    /// Names bound by this pattern, in source order
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Ident(name) => out.push(name),
            Pattern::Array { elements, rest } => {
                for elem in elements.iter().flatten() {
                    elem.pattern.collect_names(out);
                }
                if let Some(rest) = rest {
                    rest.collect_names(out);
                }
            }
            Pattern::Object { props, rest } => {
                for prop in props {
                    prop.value.collect_names(out);
                }
                if let Some(rest) = rest {
                    rest.collect_names(out);
                }
            }
            Pattern::Expr(_) => {}
        }
    }

    /// Nesting depth (`a` = 0, `[a]` = 1, `[[a]]` = 2)
    pub fn depth(&self) -> usize {
        match self {
            Pattern::Ident(_) | Pattern::Expr(_) => 0,
            Pattern::Array { elements, rest } => {
                let inner = elements
                    .iter()
                    .flatten()
                    .map(|e| e.pattern.depth())
                    .chain(rest.iter().map(|r| r.depth()))
                    .max()
                    .unwrap_or(0);
                inner + 1
            }
            Pattern::Object { props, rest } => {
                let inner = props
                    .iter()
                    .map(|p| p.value.depth())
                    .chain(rest.iter().map(|r| r.depth()))
                    .max()
                    .unwrap_or(0);
                inner + 1
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternElem {
    pub pattern: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatternProp {
    pub key: String,
    pub value: Pattern,
    pub default: Option<Expr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(name: &str) -> Option<PatternElem> {
        Some(PatternElem {
            pattern: Pattern::Ident(name.to_string()),
            default: None,
        })
    }

    #[test]
    fn test_bound_names_nested() {
        let pattern = Pattern::Array {
            elements: vec![
                elem("a"),
                None,
                Some(PatternElem {
                    pattern: Pattern::Object {
                        props: vec![ObjectPatternProp {
                            key: "k".to_string(),
                            value: Pattern::Ident("b".to_string()),
                            default: None,
                        }],
                        rest: None,
                    },
                    default: None,
                }),
            ],
            rest: Some(Box::new(Pattern::Ident("c".to_string()))),
        };
        assert_eq!(pattern.bound_names(), vec!["a", "b", "c"]);
        assert_eq!(pattern.depth(), 2);
    }

    #[test]
    fn test_side_effects_found_below_pure_nodes() {
        let ident = |n: &str| Expr::ident(n, Span::zero());
        let binary = |left: Expr, right: Expr| {
            Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Span::zero(),
            )
        };
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(ident("f")),
                args: Vec::new(),
                optional: false,
            },
            Span::zero(),
        );
        let bump = Expr::new(
            ExprKind::Update {
                op: UpdateOp::Inc,
                prefix: false,
                arg: Box::new(ident("i")),
            },
            Span::zero(),
        );

        assert!(!binary(ident("a"), ident("b")).has_side_effects());
        assert!(binary(ident("a"), call.clone()).has_side_effects());
        assert!(Expr::new(ExprKind::Array(vec![None, Some(bump)]), Span::zero()).has_side_effects());
        let member = Expr::new(
            ExprKind::Member {
                object: Box::new(call),
                property: "x".to_string(),
                optional: false,
            },
            Span::zero(),
        );
        assert!(member.has_side_effects());
    }

    #[test]
    fn test_assign_op_tokens() {
        assert_eq!(AssignOp::from_token("="), Some(AssignOp::Assign));
        assert_eq!(AssignOp::from_token("+="), Some(AssignOp::Op(BinaryOp::Add)));
        assert_eq!(AssignOp::from_token(">>>="), Some(AssignOp::Op(BinaryOp::UShr)));
        assert_eq!(AssignOp::from_token("??="), Some(AssignOp::Logical(LogicalOp::Nullish)));
        assert_eq!(AssignOp::from_token("=="), None);
    }
}
