//! Lexer errors.

use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LexError {
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: u32 },

    #[error("line {line}:{column}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: u32, column: u32 },

    #[error("line {line}: unexpected end of input")]
    UnexpectedEof { line: u32 },

    #[error("line {line}: integer literal too large")]
    IntOverflow { line: u32 },

    #[error("line {line}: invalid float literal")]
    InvalidFloat { line: u32 },

    #[error("line {line}: unindent does not match any outer indentation level")]
    InconsistentDedent { line: u32 },
}

impl LexError {
    pub fn line(&self) -> u32 {
        match self {
            LexError::UnterminatedString { line }
            | LexError::UnexpectedChar { line, .. }
            | LexError::UnexpectedEof { line }
            | LexError::IntOverflow { line }
            | LexError::InvalidFloat { line }
            | LexError::InconsistentDedent { line } => *line,
        }
    }
}
