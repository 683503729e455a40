//! Expression parsing, one method per precedence level (lowest first).

use std::sync::Arc;

use sling_ir::{
    Arg, BinaryOp, BoolOp, CompareOp, Expr, ExprKind, FunctionDef, Span, Stmt, StmtKind,
    TokenKind, UnaryOp,
};
use sling_stack::ensure_sufficient_stack;

use super::starts_expr;
use crate::{ParseError, Parser};

impl Parser {
    /// `expr (, expr)* [,]`; more than one element (or a trailing comma)
    /// produces a tuple.
    pub(crate) fn parse_expr_list(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_expr()?;
        if !self.cursor.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let span = first.span;
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if !starts_expr(self.cursor.current_kind()) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), span))
    }

    /// Assignment targets for `for` and comprehensions.
    ///
    /// Parsed below the comparison level so the `in` keyword is not
    /// swallowed as a membership test.
    pub(crate) fn parse_target_list(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_bitor()?;
        let target = if self.cursor.check(&TokenKind::Comma) {
            let span = first.span;
            let mut items = vec![first];
            while self.cursor.eat(&TokenKind::Comma) {
                if self.cursor.check(&TokenKind::In) {
                    break;
                }
                items.push(self.parse_bitor()?);
            }
            Expr::new(ExprKind::Tuple(items), span)
        } else {
            first
        };
        if target.is_assign_target() {
            Ok(target)
        } else {
            Err(ParseError::syntax("cannot assign to expression", target.span))
        }
    }

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| {
            if self.cursor.check(&TokenKind::Lambda) {
                self.parse_lambda()
            } else {
                self.parse_ternary()
            }
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let span = self.cursor.expect(&TokenKind::Lambda)?;
        let params = self.parse_params(&TokenKind::Colon, false)?;
        self.cursor.expect(&TokenKind::Colon)?;
        let value = self.parse_expr()?;
        let body = vec![Stmt::new(StmtKind::Return(Some(value)), span)];
        let def = FunctionDef {
            name: FunctionDef::LAMBDA_NAME.to_string(),
            params,
            body: Arc::from(body),
            docstring: None,
            span,
        };
        Ok(Expr::new(ExprKind::Lambda(Arc::new(def)), span))
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let body = self.parse_or()?;
        if !self.cursor.eat(&TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_or()?;
        self.cursor.expect(&TokenKind::Else)?;
        let orelse = self.parse_expr()?;
        let span = body.span;
        Ok(Expr::new(
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            span,
        ))
    }

    pub(crate) fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.cursor.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = logical(BoolOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.cursor.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = logical(BoolOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.cursor.check(&TokenKind::Not) {
            let span = self.cursor.advance().span;
            let operand = ensure_sufficient_stack(|| self.parse_not())?;
            return Ok(unary(UnaryOp::Not, operand, span));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_bitor()?;
        let mut links = Vec::new();
        while let Some(op) = self.comparison_op() {
            links.push((op, self.parse_bitor()?));
        }
        if links.is_empty() {
            return Ok(left);
        }
        let span = left.span;
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                links,
            },
            span,
        ))
    }

    /// Consume a comparison operator, including `not in` and `is not`.
    fn comparison_op(&mut self) -> Option<CompareOp> {
        let op = match self.cursor.current_kind() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::GtEq => CompareOp::GtEq,
            TokenKind::In => CompareOp::In,
            TokenKind::Not if self.cursor.peek_kind(1) == &TokenKind::In => {
                self.cursor.advance();
                CompareOp::NotIn
            }
            TokenKind::Is => {
                if self.cursor.peek_kind(1) == &TokenKind::Not {
                    self.cursor.advance();
                    CompareOp::IsNot
                } else {
                    CompareOp::Is
                }
            }
            _ => return None,
        };
        self.cursor.advance();
        Some(op)
    }

    pub(crate) fn parse_bitor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitxor()?;
        while self.cursor.eat(&TokenKind::Pipe) {
            let right = self.parse_bitxor()?;
            left = binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitand()?;
        while self.cursor.eat(&TokenKind::Caret) {
            let right = self.parse_bitand()?;
            left = binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_shift()?;
        while self.cursor.eat(&TokenKind::Amp) {
            let right = self.parse_shift()?;
            left = binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_arith()?;
        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => return Ok(left),
            };
            self.cursor.advance();
            let right = self.parse_arith()?;
            left = binary(op, left, right);
        }
    }

    fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.cursor.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.cursor.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let op = match self.cursor.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        let span = self.cursor.advance().span;
        let operand = ensure_sufficient_stack(|| self.parse_factor())?;
        // Negated numeric literals stay literals.
        match (op, &operand.kind) {
            (UnaryOp::Neg, ExprKind::Int(n)) => {
                Ok(Expr::new(ExprKind::Int(n.wrapping_neg()), span))
            }
            (UnaryOp::Neg, ExprKind::Float(x)) => Ok(Expr::new(ExprKind::Float(-x), span)),
            _ => Ok(unary(op, operand, span)),
        }
    }

    /// `postfix ** factor`, right-associative and tighter than unary minus
    /// on its left.
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.cursor.eat(&TokenKind::DoubleStar) {
            let exponent = ensure_sufficient_stack(|| self.parse_factor())?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.cursor.current_kind() {
                TokenKind::LParen => {
                    self.cursor.advance();
                    let args = self.parse_call_args()?;
                    let span = expr.span;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    let attr = self.cursor.expect_ident()?;
                    let span = expr.span;
                    expr = Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    expr = self.parse_subscript(expr)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Arguments after `(`, up to and including `)`.
    fn parse_call_args(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        let mut seen_keyword = false;
        while !self.cursor.check(&TokenKind::RParen) {
            let arg = if self.cursor.eat(&TokenKind::Star) {
                Arg::Star(self.parse_expr()?)
            } else if self.cursor.eat(&TokenKind::DoubleStar) {
                seen_keyword = true;
                Arg::DoubleStar(self.parse_expr()?)
            } else if matches!(self.cursor.current_kind(), TokenKind::Ident(_))
                && self.cursor.peek_kind(1) == &TokenKind::Eq
            {
                let name = self.cursor.expect_ident()?;
                self.cursor.advance();
                seen_keyword = true;
                Arg::Keyword(name, self.parse_expr()?)
            } else {
                let span = self.cursor.current_span();
                if seen_keyword {
                    return Err(ParseError::syntax(
                        "positional argument follows keyword argument",
                        span,
                    ));
                }
                Arg::Positional(self.parse_expr()?)
            };
            args.push(arg);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    /// Index or slice after `[`, up to and including `]`.
    fn parse_subscript(&mut self, value: Expr) -> Result<Expr, ParseError> {
        let span = value.span;
        let lower = if self.cursor.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        if !self.cursor.eat(&TokenKind::Colon) {
            self.cursor.expect(&TokenKind::RBracket)?;
            let Some(index) = lower else {
                return Err(ParseError::syntax("empty subscript", span));
            };
            return Ok(Expr::new(
                ExprKind::Index {
                    value: Box::new(value),
                    index,
                },
                span,
            ));
        }

        let upper = self.parse_slice_part()?;
        let step = if self.cursor.eat(&TokenKind::Colon) {
            self.parse_slice_part()?
        } else {
            None
        };
        self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Slice {
                value: Box::new(value),
                lower,
                upper,
                step,
            },
            span,
        ))
    }

    fn parse_slice_part(&mut self) -> Result<Option<Box<Expr>>, ParseError> {
        if self.cursor.check(&TokenKind::Colon) || self.cursor.check(&TokenKind::RBracket) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_expr()?)))
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let span = self.cursor.current_span();
        let kind = match self.cursor.current_kind().clone() {
            TokenKind::Int(n) => {
                self.cursor.advance();
                ExprKind::Int(n)
            }
            TokenKind::Float(x) => {
                self.cursor.advance();
                ExprKind::Float(x)
            }
            TokenKind::Str(first) => {
                self.cursor.advance();
                let mut text = first;
                // Adjacent literals concatenate.
                while let TokenKind::Str(next) = self.cursor.current_kind() {
                    text.push_str(next);
                    self.cursor.advance();
                }
                ExprKind::Str(text)
            }
            TokenKind::True => {
                self.cursor.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.cursor.advance();
                ExprKind::Bool(false)
            }
            TokenKind::None => {
                self.cursor.advance();
                ExprKind::None
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                ExprKind::Name(name)
            }
            TokenKind::LParen => {
                self.cursor.advance();
                return self.parse_paren(span);
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                return self.parse_list(span);
            }
            TokenKind::LBrace => {
                self.cursor.advance();
                return self.parse_dict(span);
            }
            _ => return Err(self.cursor.unexpected("expression")),
        };
        Ok(Expr::new(kind, span))
    }

    fn parse_paren(&mut self, span: Span) -> Result<Expr, ParseError> {
        if self.cursor.eat(&TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), span));
        }
        let first = self.parse_expr()?;
        if !self.cursor.check(&TokenKind::Comma) {
            self.cursor.expect(&TokenKind::RParen)?;
            return Ok(first);
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.cursor.expect(&TokenKind::RParen)?;
        Ok(Expr::new(ExprKind::Tuple(items), span))
    }

    fn parse_list(&mut self, span: Span) -> Result<Expr, ParseError> {
        if self.cursor.eat(&TokenKind::RBracket) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), span));
        }
        let first = self.parse_expr()?;
        if self.cursor.eat(&TokenKind::For) {
            return self.parse_comprehension(first, span);
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::List(items), span))
    }

    /// Rest of `[element for target in iter if cond ...]` after `for`.
    fn parse_comprehension(&mut self, element: Expr, span: Span) -> Result<Expr, ParseError> {
        let target = self.parse_target_list()?;
        self.cursor.expect(&TokenKind::In)?;
        let iter = self.parse_or()?;
        let mut conditions = Vec::new();
        while self.cursor.eat(&TokenKind::If) {
            conditions.push(self.parse_or()?);
        }
        if self.cursor.check(&TokenKind::For) {
            return Err(ParseError::syntax(
                "nested comprehension clauses are not supported",
                self.cursor.current_span(),
            ));
        }
        self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::ListComp {
                element: Box::new(element),
                target: Box::new(target),
                iter: Box::new(iter),
                conditions,
            },
            span,
        ))
    }

    fn parse_dict(&mut self, span: Span) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();
        while !self.cursor.check(&TokenKind::RBrace) {
            let key = self.parse_expr()?;
            self.cursor.expect(&TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::Dict(entries), span))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span;
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn logical(op: BoolOp, left: Expr, right: Expr) -> Expr {
    let span = left.span;
    Expr::new(
        ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn unary(op: UnaryOp, operand: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    )
}
