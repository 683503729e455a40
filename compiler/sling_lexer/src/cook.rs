//! Literal cooking: numeric parsing and escape decoding.

use sling_ir::Span;

use crate::LexError;

/// Parse an integer literal body, skipping `_` separators.
pub(crate) fn cook_int(digits: &str, radix: u32, span: Span) -> Result<i64, LexError> {
    let mut result: i64 = 0;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let digit = c
            .to_digit(radix)
            .ok_or(LexError::IntOverflow { line: span.line })?;
        result = result
            .checked_mul(i64::from(radix))
            .and_then(|r| r.checked_add(i64::from(digit)))
            .ok_or(LexError::IntOverflow { line: span.line })?;
    }
    Ok(result)
}

/// Parse a float literal; only allocates when separators are present.
pub(crate) fn cook_float(text: &str, span: Span) -> Result<f64, LexError> {
    let parsed = if text.contains('_') {
        text.replace('_', "").parse()
    } else {
        text.parse()
    };
    parsed.map_err(|_| LexError::InvalidFloat { line: span.line })
}

/// Decode backslash escapes in a string literal body.
///
/// Unknown escapes keep the backslash, matching the scripting dialect.
pub(crate) fn cook_string(body: &str) -> String {
    if !body.contains('\\') {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
