//! Sling IR - tokens and syntax tree
//!
//! This crate contains the data structures shared by the front end and the
//! evaluator:
//! - `Span` for source locations (line/column)
//! - `Token` and `TokenKind` produced by the lexer
//! - AST nodes (`Module`, `Stmt`, `Expr`, `FunctionDef`, `ClassDef`)
//!
//! # Design
//!
//! - **Owned tree**: statements and expressions own their children. Function
//!   and class bodies are shared through `Arc` so closures created at runtime
//!   can keep a body alive without copying it.
//! - **Pre-classified parameters**: `ParamSpec` separates required,
//!   defaulted, variadic and keyword-variadic parameters, so the argument
//!   binder never has to re-inspect syntax.

pub mod ast;
mod span;
mod token;

pub use ast::{
    Arg, BinaryOp, BoolOp, ClassDef, CompareOp, ExceptHandler, Expr, ExprKind, FunctionDef,
    ImportName, Module, ParamSpec, Stmt, StmtKind, UnaryOp,
};
pub use span::Span;
pub use token::{Token, TokenKind};
