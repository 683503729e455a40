//! Syntax tree for Sling scripts.
//!
//! Statements and expressions carry a `Span` for error locations. Children
//! are owned (`Box`/`Vec`); function bodies are `Arc`-shared so a closure
//! value can outlive the module that defined it.

mod items;
mod operators;

use std::sync::Arc;

pub use items::{ClassDef, FunctionDef, ParamSpec};
pub use operators::{BinaryOp, BoolOp, CompareOp, UnaryOp};

use crate::Span;

/// A parsed source file or string.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    /// Leading string-literal statement, if any.
    pub docstring: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    #[inline]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// `import a.b as c` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportName {
    pub path: String,
    pub alias: Option<String>,
}

/// One `except` clause. An empty `types` list catches everything.
#[derive(Clone, Debug, PartialEq)]
pub struct ExceptHandler {
    pub types: Vec<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// `a = b = value`; targets are assigned left to right.
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinaryOp,
        value: Expr,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        orelse: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Pass,
    Return(Option<Expr>),
    FunctionDef(Arc<FunctionDef>),
    ClassDef(Arc<ClassDef>),
    Import(Vec<ImportName>),
    FromImport {
        module: String,
        names: Vec<(String, Option<String>)>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finally: Vec<Stmt>,
    },
    Raise(Option<Expr>),
    With {
        context: Expr,
        target: Option<Expr>,
        body: Vec<Stmt>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Assert {
        test: Expr,
        message: Option<Expr>,
    },
    Del(Vec<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[inline]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Whether this expression can appear on the left of `=`.
    pub fn is_assign_target(&self) -> bool {
        match &self.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Index { .. } => true,
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                items.iter().all(Expr::is_assign_target)
            }
            _ => false,
        }
    }
}

/// Call-site argument. Order is preserved exactly as written.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
    /// `*expr`
    Star(Expr),
    /// `**expr`
    DoubleStar(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    // Literals
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),

    Name(String),

    // Collections
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// `[element for target in iter if cond...]`
    ListComp {
        element: Box<Expr>,
        target: Box<Expr>,
        iter: Box<Expr>,
        conditions: Vec<Expr>,
    },

    // Operators
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        links: Vec<(CompareOp, Expr)>,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Lambda(Arc<FunctionDef>),

    // Postfix
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

#[cfg(test)]
mod tests;
