//! Statement parsing: simple statements, compound statements and suites.

use std::sync::Arc;

use sling_ir::{
    BinaryOp, ClassDef, ExceptHandler, Expr, ExprKind, FunctionDef, ImportName, ParamSpec, Span,
    Stmt, StmtKind, TokenKind,
};
use sling_stack::ensure_sufficient_stack;

use super::starts_expr;
use crate::{docstring_of, ParseError, Parser};

impl Parser {
    /// Parse one logical line or compound statement, appending to `out`.
    ///
    /// A line may hold several `;`-separated simple statements, so this
    /// appends instead of returning a single `Stmt`.
    pub(crate) fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        ensure_sufficient_stack(|| {
            let stmt = match self.cursor.current_kind() {
                TokenKind::If => self.parse_if()?,
                TokenKind::While => self.parse_while()?,
                TokenKind::For => self.parse_for()?,
                TokenKind::Def => self.parse_def()?,
                TokenKind::Class => self.parse_class()?,
                TokenKind::Try => self.parse_try()?,
                TokenKind::With => self.parse_with()?,
                TokenKind::Indent => {
                    return Err(ParseError::syntax(
                        "unexpected indent",
                        self.cursor.current_span(),
                    ))
                }
                _ => return self.parse_simple_line(out),
            };
            out.push(stmt);
            Ok(())
        })
    }

    fn parse_simple_line(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        loop {
            out.push(self.parse_simple_statement()?);
            if !self.cursor.eat(&TokenKind::Semicolon) {
                break;
            }
            if self.at_line_end() {
                break;
            }
        }
        self.expect_line_end()
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.cursor.current_kind(),
            TokenKind::Newline | TokenKind::Eof
        )
    }

    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        if self.cursor.eat(&TokenKind::Newline) || self.cursor.is_at_end() {
            Ok(())
        } else {
            Err(self.cursor.unexpected("end of line"))
        }
    }

    /// `: NEWLINE INDENT stmt+ DEDENT` or `: simple_stmt` on the same line.
    fn parse_suite(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.cursor.expect(&TokenKind::Colon)?;
        let mut body = Vec::new();
        if !self.cursor.eat(&TokenKind::Newline) {
            self.parse_simple_line(&mut body)?;
            return Ok(body);
        }
        if !self.cursor.eat(&TokenKind::Indent) {
            return Err(ParseError::syntax(
                "expected an indented block",
                self.cursor.current_span(),
            ));
        }
        loop {
            while self.cursor.eat(&TokenKind::Newline) {}
            if self.cursor.eat(&TokenKind::Dedent) || self.cursor.is_at_end() {
                break;
            }
            self.parse_statement_into(&mut body)?;
        }
        Ok(body)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.current_span();
        let kind = match self.cursor.current_kind() {
            TokenKind::Pass => {
                self.cursor.advance();
                StmtKind::Pass
            }
            TokenKind::Break => {
                self.cursor.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.cursor.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.cursor.advance();
                let value = if starts_expr(self.cursor.current_kind()) {
                    Some(self.parse_expr_list()?)
                } else {
                    None
                };
                StmtKind::Return(value)
            }
            TokenKind::Raise => {
                self.cursor.advance();
                let value = if starts_expr(self.cursor.current_kind()) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                StmtKind::Raise(value)
            }
            TokenKind::Global => {
                self.cursor.advance();
                StmtKind::Global(self.parse_name_list()?)
            }
            TokenKind::Nonlocal => {
                self.cursor.advance();
                StmtKind::Nonlocal(self.parse_name_list()?)
            }
            TokenKind::Import => {
                self.cursor.advance();
                self.parse_import()?
            }
            TokenKind::From => {
                self.cursor.advance();
                self.parse_from_import()?
            }
            TokenKind::Assert => {
                self.cursor.advance();
                let test = self.parse_expr()?;
                let message = if self.cursor.eat(&TokenKind::Comma) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                StmtKind::Assert { test, message }
            }
            TokenKind::Del => {
                self.cursor.advance();
                let mut targets = vec![self.parse_del_target()?];
                while self.cursor.eat(&TokenKind::Comma) {
                    targets.push(self.parse_del_target()?);
                }
                StmtKind::Del(targets)
            }
            _ => self.parse_expr_statement()?,
        };
        Ok(Stmt::new(kind, span))
    }

    fn parse_del_target(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_bitor()?;
        match target.kind {
            ExprKind::Name(_) | ExprKind::Index { .. } | ExprKind::Attribute { .. } => Ok(target),
            _ => Err(ParseError::syntax("cannot delete expression", target.span)),
        }
    }

    /// Expression statement, assignment chain, or augmented assignment.
    fn parse_expr_statement(&mut self) -> Result<StmtKind, ParseError> {
        let first = self.parse_expr_list()?;

        if let Some(op) = self.augmented_op() {
            self.cursor.advance();
            if !matches!(
                first.kind,
                ExprKind::Name(_) | ExprKind::Index { .. } | ExprKind::Attribute { .. }
            ) {
                return Err(ParseError::syntax(
                    "illegal expression for augmented assignment",
                    first.span,
                ));
            }
            let value = self.parse_expr_list()?;
            return Ok(StmtKind::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if !self.cursor.check(&TokenKind::Eq) {
            return Ok(StmtKind::Expr(first));
        }

        let mut targets = vec![first];
        let mut value;
        loop {
            self.cursor.advance();
            value = self.parse_expr_list()?;
            if !self.cursor.check(&TokenKind::Eq) {
                break;
            }
            targets.push(value);
        }
        if let Some(bad) = targets.iter().find(|t| !t.is_assign_target()) {
            return Err(ParseError::syntax("cannot assign to expression", bad.span));
        }
        Ok(StmtKind::Assign { targets, value })
    }

    fn augmented_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            TokenKind::DoubleSlashEq => Some(BinaryOp::FloorDiv),
            TokenKind::PercentEq => Some(BinaryOp::Mod),
            _ => None,
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.cursor.expect_ident()?];
        while self.cursor.eat(&TokenKind::Comma) {
            names.push(self.cursor.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut path = self.cursor.expect_ident()?;
        while self.cursor.eat(&TokenKind::Dot) {
            path.push('.');
            path.push_str(&self.cursor.expect_ident()?);
        }
        Ok(path)
    }

    fn parse_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.cursor.eat(&TokenKind::As) {
            Ok(Some(self.cursor.expect_ident()?))
        } else {
            Ok(None)
        }
    }

    fn parse_import(&mut self) -> Result<StmtKind, ParseError> {
        let mut names = Vec::new();
        loop {
            let path = self.parse_dotted_name()?;
            let alias = self.parse_alias()?;
            names.push(ImportName { path, alias });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(StmtKind::Import(names))
    }

    fn parse_from_import(&mut self) -> Result<StmtKind, ParseError> {
        let module = self.parse_dotted_name()?;
        self.cursor.expect(&TokenKind::Import)?;
        let parenthesized = self.cursor.eat(&TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.cursor.expect_ident()?;
            let alias = self.parse_alias()?;
            names.push((name, alias));
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
            if parenthesized && self.cursor.check(&TokenKind::RParen) {
                break;
            }
        }
        if parenthesized {
            self.cursor.expect(&TokenKind::RParen)?;
        }
        Ok(StmtKind::FromImport { module, names })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        let mut branches = vec![(cond, self.parse_suite()?)];
        let mut orelse = Vec::new();
        loop {
            if self.cursor.eat(&TokenKind::Elif) {
                let cond = self.parse_expr()?;
                branches.push((cond, self.parse_suite()?));
            } else if self.cursor.eat(&TokenKind::Else) {
                orelse = self.parse_suite()?;
                break;
            } else {
                break;
            }
        }
        Ok(Stmt::new(StmtKind::If { branches, orelse }, span))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::While)?;
        let cond = self.parse_expr()?;
        let body = self.parse_suite()?;
        Ok(Stmt::new(StmtKind::While { cond, body }, span))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::For)?;
        let target = self.parse_target_list()?;
        self.cursor.expect(&TokenKind::In)?;
        let iter = self.parse_expr_list()?;
        let body = self.parse_suite()?;
        Ok(Stmt::new(StmtKind::For { target, iter, body }, span))
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::Def)?;
        let name = self.cursor.expect_ident()?;
        self.cursor.expect(&TokenKind::LParen)?;
        let params = self.parse_params(&TokenKind::RParen, true)?;
        self.cursor.expect(&TokenKind::RParen)?;
        if self.cursor.eat(&TokenKind::Arrow) {
            // Return annotations are accepted and ignored.
            self.parse_expr()?;
        }
        let body = self.parse_suite()?;
        let def = FunctionDef {
            name,
            params,
            docstring: docstring_of(&body),
            body: Arc::from(body),
            span,
        };
        Ok(Stmt::new(StmtKind::FunctionDef(Arc::new(def)), span))
    }

    /// Parameter list up to (not including) `closing`.
    pub(crate) fn parse_params(
        &mut self,
        closing: &TokenKind,
        allow_annotations: bool,
    ) -> Result<ParamSpec, ParseError> {
        let mut spec = ParamSpec::default();
        while !self.cursor.check(closing) {
            let span = self.cursor.current_span();
            if self.cursor.eat(&TokenKind::DoubleStar) {
                spec.kwargs = Some(self.cursor.expect_ident()?);
            } else if self.cursor.eat(&TokenKind::Star) {
                spec.varargs = Some(self.cursor.expect_ident()?);
            } else {
                let name = self.cursor.expect_ident()?;
                if spec.varargs.is_some() || spec.kwargs.is_some() {
                    return Err(ParseError::syntax(
                        "keyword-only parameters are not supported",
                        span,
                    ));
                }
                if allow_annotations && self.cursor.eat(&TokenKind::Colon) {
                    self.parse_expr()?;
                }
                if self.cursor.eat(&TokenKind::Eq) {
                    let default = self.parse_expr()?;
                    spec.defaults.push((name, default));
                } else if spec.defaults.is_empty() {
                    spec.required.push(name);
                } else {
                    return Err(ParseError::syntax(
                        "non-default argument follows default argument",
                        span,
                    ));
                }
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for name in spec.names() {
            if seen.contains(&name) {
                return Err(ParseError::syntax(
                    format!("duplicate argument '{name}' in function definition"),
                    self.cursor.current_span(),
                ));
            }
            seen.push(name);
        }
        Ok(spec)
    }

    fn parse_class(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::Class)?;
        let name = self.cursor.expect_ident()?;
        let mut parent = None;
        if self.cursor.eat(&TokenKind::LParen) {
            if !self.cursor.check(&TokenKind::RParen) {
                parent = Some(self.parse_expr()?);
            }
            self.cursor.expect(&TokenKind::RParen)?;
        }
        let body = self.parse_suite()?;
        let def = ClassDef {
            name,
            parent,
            docstring: docstring_of(&body),
            body,
            span,
        };
        Ok(Stmt::new(StmtKind::ClassDef(Arc::new(def)), span))
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::Try)?;
        let body = self.parse_suite()?;
        let mut handlers = Vec::new();
        while self.cursor.eat(&TokenKind::Except) {
            let mut types = Vec::new();
            let mut name = None;
            if !self.cursor.check(&TokenKind::Colon) {
                let spec = self.parse_expr()?;
                match spec.kind {
                    ExprKind::Tuple(items) => types = items,
                    _ => types.push(spec),
                }
                name = self.parse_alias()?;
            }
            let body = self.parse_suite()?;
            handlers.push(ExceptHandler { types, name, body });
        }
        let orelse = if self.cursor.eat(&TokenKind::Else) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        let finally = if self.cursor.eat(&TokenKind::Finally) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finally.is_empty() {
            return Err(ParseError::syntax(
                "try statement needs an except or finally clause",
                span,
            ));
        }
        Ok(Stmt::new(
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finally,
            },
            span,
        ))
    }

    /// `with a as x, b as y:` is parsed as nested single-item statements.
    fn parse_with(&mut self) -> Result<Stmt, ParseError> {
        let span = self.cursor.expect(&TokenKind::With)?;
        let mut items: Vec<(Expr, Option<Expr>, Span)> = Vec::new();
        loop {
            let item_span = self.cursor.current_span();
            let context = self.parse_expr()?;
            let target = if self.cursor.eat(&TokenKind::As) {
                Some(self.parse_target_list()?)
            } else {
                None
            };
            items.push((context, target, item_span));
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        let mut body = self.parse_suite()?;
        while items.len() > 1 {
            let Some((context, target, item_span)) = items.pop() else {
                break;
            };
            body = vec![Stmt::new(
                StmtKind::With {
                    context,
                    target,
                    body,
                },
                item_span,
            )];
        }
        let Some((context, target, _)) = items.pop() else {
            return Err(ParseError::syntax("empty with statement", span));
        };
        Ok(Stmt::new(
            StmtKind::With {
                context,
                target,
                body,
            },
            span,
        ))
    }
}
