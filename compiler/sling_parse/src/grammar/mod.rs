//! Grammar productions, split into statements and expressions.
//!
//! Both modules add methods to `Parser`; they share the cursor and the
//! `ensure_sufficient_stack` guard on every recursive entry point.

mod expr;
mod stmt;

use sling_ir::TokenKind;

/// Whether a token can begin an expression.
///
/// Used to decide if a trailing comma ends an expression list and whether
/// `return`/`raise` carry a value.
pub(crate) fn starts_expr(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::Ident(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::None
            | TokenKind::Not
            | TokenKind::Lambda
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
    )
}
