//! Parse errors.

use sling_ir::Span;
use sling_lexer::LexError;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}: {message}")]
    Syntax { message: String, line: u32 },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line: span.line,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            ParseError::Syntax { line, .. } => *line,
            ParseError::Lex(err) => err.line(),
        }
    }
}
