//! Expression evaluation.

use std::sync::Arc;

use sling_ir::{Arg, BoolOp, CompareOp, Expr, ExprKind};
use sling_stack::ensure_sufficient_stack;
use sling_value::errors::{no_attribute, type_error, undefined_variable};
use sling_value::value::DictMap;
use sling_value::{EnvRef, EvalError, EvalResult, ExecContext, Frame, FrameKind, Kwargs, Value};

use super::Interpreter;
use crate::operators::{evaluate_binary, evaluate_compare, evaluate_unary};

const SUPER: &str = "super";

/// `super()` with no arguments, as the receiver of an attribute.
fn is_super_call(expr: &Expr) -> bool {
    matches!(
        &expr.kind,
        ExprKind::Call { func, args } if args.is_empty()
            && matches!(&func.kind, ExprKind::Name(name) if name == SUPER)
    )
}

impl Interpreter {
    pub(super) fn eval_expr(&self, ctx: &ExecContext, expr: &Expr, env: &EnvRef) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_kind(ctx, expr, env))
    }

    /// Name resolution: frame chain, then builtins.
    pub(super) fn lookup(&self, env: &EnvRef, name: &str) -> EvalResult {
        self.arena()
            .get(env, name)
            .or_else(|| self.builtin(name))
            .ok_or_else(|| undefined_variable(name))
    }

    fn eval_kind(&self, ctx: &ExecContext, expr: &Expr, env: &EnvRef) -> EvalResult {
        match &expr.kind {
            ExprKind::None => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Str(s) => Ok(Value::string(s)),
            ExprKind::Name(name) => self.lookup(env, name),
            ExprKind::List(items) => Ok(Value::list(self.eval_all(ctx, items, env)?)),
            ExprKind::Tuple(items) => Ok(Value::tuple(self.eval_all(ctx, items, env)?)),
            ExprKind::Dict(entries) => {
                let mut map = DictMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval_expr(ctx, key, env)?.dict_key()?;
                    let value = self.eval_expr(ctx, value, env)?;
                    map.insert(key, value);
                }
                Ok(Value::dict(map))
            }
            ExprKind::ListComp {
                element,
                target,
                iter,
                conditions,
            } => self.eval_list_comp(ctx, element, target, iter, conditions, env),
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(ctx, operand, env)?;
                evaluate_unary(&operand, *op)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(ctx, left, env)?;
                let right = self.eval_expr(ctx, right, env)?;
                evaluate_binary(&left, &right, *op)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval_expr(ctx, left, env)?;
                match (op, left.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval_expr(ctx, right, env),
                }
            }
            ExprKind::Compare { left, links } => self.eval_compare(ctx, left, links, env),
            ExprKind::IfExp { test, body, orelse } => {
                if self.eval_expr(ctx, test, env)?.is_truthy() {
                    self.eval_expr(ctx, body, env)
                } else {
                    self.eval_expr(ctx, orelse, env)
                }
            }
            ExprKind::Lambda(def) => Ok(Value::function(
                Arc::clone(def),
                self.arena().closure_scope(env),
            )),
            ExprKind::Call { func, args } => {
                let callee = self.eval_expr(ctx, func, env)?;
                let (args, kwargs) = self.eval_args(ctx, args, env)?;
                self.dispatch(ctx, &callee, args, kwargs)
            }
            ExprKind::Attribute { value, attr } => {
                if is_super_call(value) {
                    return self.super_attribute(env, attr);
                }
                let target = self.eval_expr(ctx, value, env)?;
                self.load_attribute(&target, attr)
            }
            ExprKind::Index { value, index } => {
                let target = self.eval_expr(ctx, value, env)?;
                let key = self.eval_expr(ctx, index, env)?;
                self.subscript(ctx, &target, &key)
            }
            ExprKind::Slice {
                value,
                lower,
                upper,
                step,
            } => {
                let target = self.eval_expr(ctx, value, env)?;
                let lower = self.eval_optional(ctx, lower.as_deref(), env)?;
                let upper = self.eval_optional(ctx, upper.as_deref(), env)?;
                let step = self.eval_optional(ctx, step.as_deref(), env)?;
                self.slice(&target, &lower, &upper, &step)
            }
        }
    }

    fn eval_all(&self, ctx: &ExecContext, items: &[Expr], env: &EnvRef) -> Result<Vec<Value>, EvalError> {
        items.iter().map(|item| self.eval_expr(ctx, item, env)).collect()
    }

    fn eval_optional(&self, ctx: &ExecContext, expr: Option<&Expr>, env: &EnvRef) -> EvalResult {
        match expr {
            Some(expr) => self.eval_expr(ctx, expr, env),
            None => Ok(Value::Null),
        }
    }

    /// `a < b < c` evaluates `b` once and stops at the first false link.
    fn eval_compare(
        &self,
        ctx: &ExecContext,
        left: &Expr,
        links: &[(CompareOp, Expr)],
        env: &EnvRef,
    ) -> EvalResult {
        let mut left = self.eval_expr(ctx, left, env)?;
        for (op, right) in links {
            let right = self.eval_expr(ctx, right, env)?;
            if !evaluate_compare(&left, &right, *op)? {
                return Ok(Value::Bool(false));
            }
            left = right;
        }
        Ok(Value::Bool(true))
    }

    /// The comprehension variable lives in its own frame.
    fn eval_list_comp(
        &self,
        ctx: &ExecContext,
        element: &Expr,
        target: &Expr,
        iter: &Expr,
        conditions: &[Expr],
        env: &EnvRef,
    ) -> EvalResult {
        let items = self.eval_expr(ctx, iter, env)?.to_items()?;
        let scope = self.scoped(Frame::new(FrameKind::Function, Some(env.clone())));
        let mut out = Vec::with_capacity(items.len());
        'items: for item in items {
            ctx.check()?;
            self.assign(ctx, target, item, scope.env())?;
            for cond in conditions {
                if !self.eval_expr(ctx, cond, scope.env())?.is_truthy() {
                    continue 'items;
                }
            }
            out.push(self.eval_expr(ctx, element, scope.env())?);
        }
        Ok(Value::list(out))
    }

    /// Positional arguments in order with `*` spliced in; keywords merged
    /// with `**` mappings. Every positional expression is evaluated before
    /// any keyword value, wherever a `*` sits in the call. A keyword given
    /// twice is a `TypeError`.
    pub(super) fn eval_args(
        &self,
        ctx: &ExecContext,
        args: &[Arg],
        env: &EnvRef,
    ) -> Result<(Vec<Value>, Kwargs), EvalError> {
        let mut positional = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Positional(expr) => positional.push(self.eval_expr(ctx, expr, env)?),
                Arg::Star(expr) => positional.extend(self.eval_expr(ctx, expr, env)?.to_items()?),
                Arg::Keyword(..) | Arg::DoubleStar(_) => {}
            }
        }

        let mut kwargs = Kwargs::new();
        let add_keyword = |kwargs: &mut Kwargs, name: String, value: Value| {
            if kwargs.has(&name) {
                return Err(type_error(format!(
                    "got multiple values for keyword argument '{name}'"
                )));
            }
            kwargs.insert(name, value);
            Ok(())
        };
        for arg in args {
            match arg {
                Arg::Positional(_) | Arg::Star(_) => {}
                Arg::Keyword(name, expr) => {
                    let value = self.eval_expr(ctx, expr, env)?;
                    add_keyword(&mut kwargs, name.clone(), value)?;
                }
                Arg::DoubleStar(expr) => match self.eval_expr(ctx, expr, env)? {
                    Value::Dict(map) => {
                        let entries: Vec<(String, Value)> = map
                            .read()
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect();
                        for (name, value) in entries {
                            add_keyword(&mut kwargs, name, value)?;
                        }
                    }
                    other => {
                        return Err(type_error(format!(
                            "argument after ** must be a mapping, not {}",
                            other.type_name()
                        )))
                    }
                },
            }
        }
        Ok((positional, kwargs))
    }

    /// `super().attr` inside a method: looked up from the parent of the
    /// class the running method was found on, bound to the same receiver.
    fn super_attribute(&self, env: &EnvRef, attr: &str) -> EvalResult {
        let owner = self
            .arena()
            .method_owner(env)
            .ok_or_else(|| EvalError::exception("RuntimeError", "super(): no arguments"))?;
        let found = owner
            .class
            .parent()
            .and_then(|parent| parent.lookup_with_owner(attr));
        match found {
            Some((member @ (Value::Function(_) | Value::Builtin(_)), found_on)) => Ok(
                Value::bound_method(owner.receiver.clone(), member, Some(found_on)),
            ),
            Some((member, _)) => Ok(member),
            None => Err(no_attribute(SUPER, attr)),
        }
    }
}
