#![expect(clippy::unwrap_used, reason = "tests unwrap lexer output")]

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().into_iter().map(|t| t.kind).collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

#[test]
fn simple_assignment() {
    assert_eq!(
        kinds("x = 1 + 2.5"),
        vec![
            ident("x"),
            TokenKind::Eq,
            TokenKind::Int(1),
            TokenKind::Plus,
            TokenKind::Float(2.5),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn indentation_produces_indent_and_dedent() {
    let source = "if x:\n    y = 1\nz = 2\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            ident("x"),
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            ident("y"),
            TokenKind::Eq,
            TokenKind::Int(1),
            TokenKind::Newline,
            TokenKind::Dedent,
            ident("z"),
            TokenKind::Eq,
            TokenKind::Int(2),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn dedents_are_closed_at_end_of_input() {
    let toks = kinds("def f():\n    if a:\n        return 1");
    let dedents = toks.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(dedents, 2);
    assert_eq!(toks.last(), Some(&TokenKind::Eof));
}

#[test]
fn blank_lines_and_comments_are_ignored() {
    let source = "a = 1\n\n   # comment only\nb = 2  # trailing\n";
    assert_eq!(
        kinds(source),
        vec![
            ident("a"),
            TokenKind::Eq,
            TokenKind::Int(1),
            TokenKind::Newline,
            ident("b"),
            TokenKind::Eq,
            TokenKind::Int(2),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn newlines_inside_brackets_are_dropped() {
    let toks = kinds("xs = [\n    1,\n    2,\n]\n");
    assert!(!toks.contains(&TokenKind::Indent));
    assert_eq!(
        toks.iter().filter(|k| **k == TokenKind::Newline).count(),
        1
    );
}

#[test]
fn string_escapes_are_decoded() {
    assert_eq!(
        kinds(r#"s = "a\tb\n" + 'it\'s'"#)[2..5].to_vec(),
        vec![
            TokenKind::Str("a\tb\n".to_string()),
            TokenKind::Plus,
            TokenKind::Str("it's".to_string()),
        ]
    );
}

#[test]
fn triple_quoted_strings_span_lines() {
    let toks = kinds("\"\"\"doc\nstring\"\"\"\nx = 1\n");
    assert_eq!(toks[0], TokenKind::Str("doc\nstring".to_string()));
    assert_eq!(toks[1], TokenKind::Newline);
}

#[test]
fn keywords_and_operators() {
    assert_eq!(
        kinds("not a in b // 2 ** 3"),
        vec![
            TokenKind::Not,
            ident("a"),
            TokenKind::In,
            ident("b"),
            TokenKind::DoubleSlash,
            TokenKind::Int(2),
            TokenKind::DoubleStar,
            TokenKind::Int(3),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn hex_and_underscored_numbers() {
    assert_eq!(kinds("0xff")[0], TokenKind::Int(255));
    assert_eq!(kinds("1_000")[0], TokenKind::Int(1000));
    assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
}

#[test]
fn unterminated_string_is_an_error() {
    assert_eq!(
        lex("x = \"abc\n"),
        Err(LexError::UnterminatedString { line: 1 })
    );
}

#[test]
fn unexpected_character_reports_position() {
    assert_eq!(
        lex("a = 1\nb = $"),
        Err(LexError::UnexpectedChar {
            ch: '$',
            line: 2,
            column: 5
        })
    );
}

#[test]
fn inconsistent_dedent_is_an_error() {
    let err = lex("if a:\n    b\n  c\n").unwrap_err();
    assert_eq!(err, LexError::InconsistentDedent { line: 3 });
}

#[test]
fn integer_overflow_is_an_error() {
    let err = lex("99999999999999999999").unwrap_err();
    assert_eq!(err.line(), 1);
}

#[test]
fn spans_track_lines_and_columns() {
    let toks = lex("a\n  \nbb = 1").unwrap();
    let bb = toks.iter().find(|t| t.kind == ident("bb")).unwrap();
    assert_eq!(bb.span, Span::new(3, 1));
}

proptest! {
    #[test]
    fn identifiers_round_trip(name in "[a-z_][a-z0-9_]{0,12}") {
        prop_assume!(!matches!(
            name.as_str(),
            "and" | "as" | "assert" | "break" | "class" | "continue" | "def" | "del"
                | "elif" | "else" | "except" | "finally" | "for" | "from" | "global"
                | "if" | "import" | "in" | "is" | "lambda" | "nonlocal" | "not" | "or"
                | "pass" | "raise" | "return" | "try" | "while" | "with"
        ));
        let toks = kinds(&name);
        prop_assert_eq!(&toks[0], &TokenKind::Ident(name.clone()));
    }

    #[test]
    fn integers_round_trip(n in 0i64..i64::MAX) {
        prop_assert_eq!(&kinds(&n.to_string())[0], &TokenKind::Int(n));
    }
}
