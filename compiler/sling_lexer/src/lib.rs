//! Lexer for Sling using logos.
//!
//! Lexing happens in two layers:
//! - `RawToken` (logos) splits the source into raw tokens, skipping
//!   horizontal whitespace, comments and explicit line continuations.
//! - The cooker turns raw tokens into `sling_ir::Token`s: it decodes
//!   literals, drops newlines inside brackets and blank lines, and converts
//!   leading whitespace into `Indent`/`Dedent` tokens.

mod cook;
mod error;
mod raw_token;

use logos::Logos;
use sling_ir::{Span, Token, TokenKind};

pub use error::LexError;

use cook::{cook_float, cook_int, cook_string};
use raw_token::RawToken;

/// Tokenize `source` into a cooked token list ending in `Eof`.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Cooker::new(source).run()
}

/// Maps byte offsets to line/column positions.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex { starts }
    }

    fn line_start(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&s| s <= offset).saturating_sub(1);
        (line, self.starts[line])
    }

    fn span(&self, source: &str, offset: usize) -> Span {
        let (line, start) = self.line_start(offset);
        let column = source[start..offset].chars().count() + 1;
        Span::new(to_u32(line + 1), to_u32(column))
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

struct Cooker<'src> {
    source: &'src str,
    lines: LineIndex,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    bracket_depth: usize,
    at_line_start: bool,
}

impl<'src> Cooker<'src> {
    fn new(source: &'src str) -> Self {
        Cooker {
            source,
            lines: LineIndex::new(source),
            tokens: Vec::new(),
            indents: vec![0],
            bracket_depth: 0,
            at_line_start: true,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut raw = RawToken::lexer(self.source);
        while let Some(result) = raw.next() {
            let range = raw.span();
            let span = self.lines.span(self.source, range.start);
            let slice = raw.slice();
            let Ok(token) = result else {
                return Err(self.error_at(slice, span));
            };

            if token == RawToken::Newline {
                if self.bracket_depth == 0 && !self.at_line_start {
                    self.tokens.push(Token::new(TokenKind::Newline, span));
                    self.at_line_start = true;
                }
                continue;
            }

            if self.at_line_start && self.bracket_depth == 0 {
                self.handle_indent(range.start, span)?;
                self.at_line_start = false;
            }

            let kind = self.cook(token, slice, span)?;
            self.tokens.push(Token::new(kind, span));
        }

        let end = self.lines.span(self.source, self.source.len());
        if !self.at_line_start {
            self.tokens.push(Token::new(TokenKind::Newline, end));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, end));
        }
        self.tokens.push(Token::new(TokenKind::Eof, end));
        Ok(self.tokens)
    }

    fn handle_indent(&mut self, offset: usize, span: Span) -> Result<(), LexError> {
        let (_, start) = self.lines.line_start(offset);
        let width = indent_width(&self.source[start..offset]);
        let current = self.indents.last().copied().unwrap_or(0);

        if width > current {
            self.indents.push(width);
            self.tokens.push(Token::new(TokenKind::Indent, span));
            return Ok(());
        }

        while width < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, span));
        }
        if width == self.indents.last().copied().unwrap_or(0) {
            Ok(())
        } else {
            Err(LexError::InconsistentDedent { line: span.line })
        }
    }

    fn cook(&mut self, token: RawToken, slice: &str, span: Span) -> Result<TokenKind, LexError> {
        let kind = match token {
            RawToken::Newline => TokenKind::Newline,
            RawToken::And => TokenKind::And,
            RawToken::As => TokenKind::As,
            RawToken::Assert => TokenKind::Assert,
            RawToken::Break => TokenKind::Break,
            RawToken::Class => TokenKind::Class,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Def => TokenKind::Def,
            RawToken::Del => TokenKind::Del,
            RawToken::Elif => TokenKind::Elif,
            RawToken::Else => TokenKind::Else,
            RawToken::Except => TokenKind::Except,
            RawToken::False => TokenKind::False,
            RawToken::Finally => TokenKind::Finally,
            RawToken::For => TokenKind::For,
            RawToken::From => TokenKind::From,
            RawToken::Global => TokenKind::Global,
            RawToken::If => TokenKind::If,
            RawToken::Import => TokenKind::Import,
            RawToken::In => TokenKind::In,
            RawToken::Is => TokenKind::Is,
            RawToken::Lambda => TokenKind::Lambda,
            RawToken::None => TokenKind::None,
            RawToken::Nonlocal => TokenKind::Nonlocal,
            RawToken::Not => TokenKind::Not,
            RawToken::Or => TokenKind::Or,
            RawToken::Pass => TokenKind::Pass,
            RawToken::Raise => TokenKind::Raise,
            RawToken::Return => TokenKind::Return,
            RawToken::True => TokenKind::True,
            RawToken::Try => TokenKind::Try,
            RawToken::While => TokenKind::While,
            RawToken::With => TokenKind::With,
            RawToken::Ident => TokenKind::Ident(slice.to_string()),
            RawToken::Int => TokenKind::Int(cook_int(slice, 10, span)?),
            RawToken::HexInt => TokenKind::Int(cook_int(&slice[2..], 16, span)?),
            RawToken::BinInt => TokenKind::Int(cook_int(&slice[2..], 2, span)?),
            RawToken::Float => TokenKind::Float(cook_float(slice, span)?),
            RawToken::Str => TokenKind::Str(cook_string(&slice[1..slice.len() - 1])),
            RawToken::TripleStr => TokenKind::Str(cook_string(&slice[3..slice.len() - 3])),
            RawToken::LParen => self.open(TokenKind::LParen),
            RawToken::LBracket => self.open(TokenKind::LBracket),
            RawToken::LBrace => self.open(TokenKind::LBrace),
            RawToken::RParen => self.close(TokenKind::RParen),
            RawToken::RBracket => self.close(TokenKind::RBracket),
            RawToken::RBrace => self.close(TokenKind::RBrace),
            RawToken::Comma => TokenKind::Comma,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::DoubleStar => TokenKind::DoubleStar,
            RawToken::Slash => TokenKind::Slash,
            RawToken::DoubleSlash => TokenKind::DoubleSlash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::Shl => TokenKind::Shl,
            RawToken::Shr => TokenKind::Shr,
            RawToken::Eq => TokenKind::Eq,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::DoubleSlashEq => TokenKind::DoubleSlashEq,
            RawToken::PercentEq => TokenKind::PercentEq,
        };
        Ok(kind)
    }

    fn open(&mut self, kind: TokenKind) -> TokenKind {
        self.bracket_depth += 1;
        kind
    }

    fn close(&mut self, kind: TokenKind) -> TokenKind {
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
        kind
    }

    fn error_at(&self, slice: &str, span: Span) -> LexError {
        match slice.chars().next() {
            Some('"' | '\'') => LexError::UnterminatedString { line: span.line },
            Some(ch) => LexError::UnexpectedChar {
                ch,
                line: span.line,
                column: span.column,
            },
            None => LexError::UnexpectedEof { line: span.line },
        }
    }
}

/// Width of leading whitespace; tabs advance to the next multiple of 8.
fn indent_width(prefix: &str) -> usize {
    prefix.chars().fold(0, |width, ch| match ch {
        ' ' => width + 1,
        '\t' => (width / 8 + 1) * 8,
        _ => width,
    })
}

#[cfg(test)]
mod tests;
