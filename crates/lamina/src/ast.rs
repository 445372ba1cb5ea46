//! The abstract syntax tree: closed tagged variants for expressions and
//! statements (spec §3, §9 "AST polymorphism").
//!
//! The source under study models each node as its own class in a virtual
//! hierarchy. A tree-walker has no use for that indirection — every node
//! shape is known up front, so a closed `enum` with pattern matching gives
//! the same dispatch without a heap allocation and vtable per node.

use std::rc::Rc;

/// A byte-range slice into the original source, kept on every expression
/// for diagnostics (spec §4.2: "Every `Expression` retains the source
/// slice from which it was parsed").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: Rc<str>,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(text: impl Into<Rc<str>>, line: u32, column: u32) -> Self {
        Self { text: text.into(), line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A parsed literal's textual form, decoded lazily by the interpreter
/// (spec §4.3: "Literals are parsed lazily from their textual form").
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralText {
    Number(Rc<str>),
    String(Rc<str>),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal { value: LiteralText, span: Span },
    Identifier { name: Rc<str>, span: Span },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, span: Span },
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Call { callee: Rc<str>, args: Vec<Expr>, span: Span },
    NamespaceCall { namespace: Rc<str>, function: Rc<str>, args: Vec<Expr>, span: Span },
    Array { elements: Vec<Expr>, span: Span },
    /// `array[index]` (spec §8 scenario 4). Not named among the closed
    /// Expression variants in the data model, but required by that same
    /// section's concrete scenarios — added as the natural postfix
    /// extension to the `Array` literal grammar already in place.
    Index { array: Box<Expr>, index: Box<Expr>, span: Span },
    /// The bare `input` keyword, reading one line from stdin (spec §3
    /// lists `input` among the lexer's keywords but the grammar never
    /// spells out its production; treated as a zero-argument primary).
    Input { span: Span },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Self::Literal { span, .. }
            | Self::Identifier { span, .. }
            | Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Call { span, .. }
            | Self::NamespaceCall { span, .. }
            | Self::Array { span, .. }
            | Self::Index { span, .. }
            | Self::Input { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl { name: Rc<str>, init: Expr },
    BigIntDecl { name: Rc<str>, init: Option<Expr> },
    Assign { name: Rc<str>, expr: Expr, line: u32 },
    Block(Vec<Stmt>),
    If { cond: Expr, then_block: Box<Stmt>, else_block: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    FuncDef { name: Rc<str>, params: Vec<Rc<str>>, body: Rc<Stmt> },
    Return { value: Option<Expr>, line: u32 },
    ExprStmt(Expr),
    Include { module: Rc<str>, line: u32 },
    Use { module: Rc<str>, line: u32 },
    Break { line: u32 },
    Continue { line: u32 },
    Define { name: Rc<str>, value: Expr },
}
