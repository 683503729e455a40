//! Recursive descent parser for Sling.
//!
//! Produces an owned `sling_ir::Module` from source text or cooked tokens.
//! Statements are parsed by `grammar::stmt`, expressions by
//! `grammar::expr` using one method per precedence level.

mod cursor;
mod error;
mod grammar;

pub use cursor::Cursor;
pub use error::ParseError;

use sling_ir::{ExprKind, Module, Stmt, StmtKind, Token, TokenKind};

/// Parse a complete source string.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str) -> Result<Module, ParseError> {
    let tokens = sling_lexer::lex(source)?;
    parse_tokens(tokens)
}

/// Parse an already-lexed token list.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Module, ParseError> {
    let mut parser = Parser::new(tokens);
    let body = parser.parse_module()?;
    let docstring = docstring_of(&body);
    tracing::trace!(statements = body.len(), "parsed module");
    Ok(Module { body, docstring })
}

/// Leading string-literal statement of a body.
pub(crate) fn docstring_of(body: &[Stmt]) -> Option<String> {
    match body.first().map(|s| &s.kind) {
        Some(StmtKind::Expr(expr)) => match &expr.kind {
            ExprKind::Str(text) => Some(text.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Parser state.
pub struct Parser {
    cursor: Cursor,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
        }
    }

    fn parse_module(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        loop {
            while self.cursor.eat(&TokenKind::Newline) {}
            if self.cursor.is_at_end() {
                break;
            }
            self.parse_statement_into(&mut body)?;
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests;
