//! Statement execution.

use std::sync::Arc;

use indexmap::IndexMap;
use sling_ir::{BinaryOp, ClassDef, ExceptHandler, Expr, ExprKind, Module, Stmt, StmtKind};
use sling_stack::ensure_sufficient_stack;
use sling_value::errors::{
    exception_filter_name, no_attribute, not_context_manager, type_error, undefined_variable,
    value_error, CATCH_ALL,
};
use sling_value::value::INIT;
use sling_value::{ClassValue, EnvRef, EvalError, EvalResult, ExecContext, Frame, FrameKind, Kwargs, Value};

use super::{ControlAction, ExecResult, Interpreter};
use crate::builtins::{display, exception_message, is_exception_type};
use crate::operators::evaluate_binary;

/// Error for a `return`, `break` or `continue` that escaped to the top of
/// a module or class body.
fn stray_control(action: ControlAction) -> EvalError {
    let message = match action {
        ControlAction::Error(err) => return err,
        ControlAction::Return(_) => "'return' outside function",
        ControlAction::Break => "'break' outside loop",
        ControlAction::Continue => "'continue' not properly in loop",
    };
    EvalError::exception("SyntaxError", message)
}

fn unpack_error(expected: usize, got: usize) -> EvalError {
    if got > expected {
        value_error(format!("too many values to unpack (expected {expected})"))
    } else {
        value_error(format!(
            "not enough values to unpack (expected {expected}, got {got})"
        ))
    }
}

/// Timeouts and cancellation unwind through `except` and `with`.
fn is_interrupt(err: &EvalError) -> bool {
    err.is_timeout() || err.is_cancelled()
}

/// `+=` on a list extends it in place; everything else rebinds.
fn augmented(current: &Value, rhs: &Value, op: BinaryOp) -> EvalResult {
    if let (Value::List(items), BinaryOp::Add) = (current, op) {
        let extra = rhs.to_items()?;
        items.write().extend(extra);
        return Ok(current.clone());
    }
    evaluate_binary(current, rhs, op)
}

/// `__init__` of classes deriving from a builtin exception: keeps the
/// message and arguments as fields.
fn exception_init() -> Value {
    Value::builtin(INIT, None, |_, _, args| {
        let mut args = args.into_iter();
        let receiver = args.next().unwrap_or(Value::Null);
        let rest: Vec<Value> = args.collect();
        if let Value::Instance(inst) = &receiver {
            inst.set_field("message", Value::string(exception_message(&rest)));
            inst.set_field("args", Value::tuple(rest));
        }
        Ok(Value::Null)
    })
}

impl Interpreter {
    /// Execute a module body in `env`. The result is the value of the
    /// last statement when it is an expression, `None` otherwise.
    pub(super) fn run_module(&self, ctx: &ExecContext, module: &Module, env: &EnvRef) -> EvalResult {
        let mut last = Value::Null;
        for stmt in &module.body {
            last = Value::Null;
            let outcome = match &stmt.kind {
                StmtKind::Expr(expr) => {
                    match ctx.check().and_then(|()| self.eval_expr(ctx, expr, env)) {
                        Ok(value) => {
                            last = value;
                            Ok(())
                        }
                        Err(err) => Err(ControlAction::Error(err.at_line(stmt.span.line))),
                    }
                }
                _ => self.exec_stmt(ctx, stmt, env, None),
            };
            if let Err(action) = outcome {
                return Err(stray_control(action).at_line(stmt.span.line));
            }
        }
        Ok(last)
    }

    /// Execute statements in order. `active` is the exception being
    /// handled, for a bare `raise`.
    pub(super) fn exec_block(
        &self,
        ctx: &ExecContext,
        body: &[Stmt],
        env: &EnvRef,
        active: Option<&EvalError>,
    ) -> ExecResult {
        for stmt in body {
            self.exec_stmt(ctx, stmt, env, active)?;
        }
        Ok(())
    }

    pub(super) fn exec_stmt(
        &self,
        ctx: &ExecContext,
        stmt: &Stmt,
        env: &EnvRef,
        active: Option<&EvalError>,
    ) -> ExecResult {
        ensure_sufficient_stack(|| {
            ctx.check()?;
            self.exec_kind(ctx, stmt, env, active)
        })
        .map_err(|action| action.at_line(stmt.span.line))
    }

    fn exec_kind(
        &self,
        ctx: &ExecContext,
        stmt: &Stmt,
        env: &EnvRef,
        active: Option<&EvalError>,
    ) -> ExecResult {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(ctx, expr, env)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval_expr(ctx, value, env)?;
                for target in targets {
                    self.assign(ctx, target, value.clone(), env)?;
                }
            }
            StmtKind::AugAssign { target, op, value } => {
                self.exec_aug_assign(ctx, target, *op, value, env)?;
            }
            StmtKind::If { branches, orelse } => {
                for (cond, body) in branches {
                    if self.eval_expr(ctx, cond, env)?.is_truthy() {
                        return self.exec_block(ctx, body, env, active);
                    }
                }
                return self.exec_block(ctx, orelse, env, active);
            }
            StmtKind::While { cond, body } => {
                while self.eval_expr(ctx, cond, env)?.is_truthy() {
                    match self.exec_block(ctx, body, env, active) {
                        Ok(()) | Err(ControlAction::Continue) => {}
                        Err(ControlAction::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
            }
            StmtKind::For { target, iter, body } => {
                for item in self.eval_expr(ctx, iter, env)?.to_items()? {
                    self.assign(ctx, target, item, env)?;
                    match self.exec_block(ctx, body, env, active) {
                        Ok(()) | Err(ControlAction::Continue) => {}
                        Err(ControlAction::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
            }
            StmtKind::Break => return Err(ControlAction::Break),
            StmtKind::Continue => return Err(ControlAction::Continue),
            StmtKind::Pass => {}
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(ctx, expr, env)?,
                    None => Value::Null,
                };
                return Err(ControlAction::Return(value));
            }
            StmtKind::FunctionDef(def) => {
                let function = Value::function(Arc::clone(def), self.arena().closure_scope(env));
                self.arena().set(env, &def.name, function);
            }
            StmtKind::ClassDef(def) => {
                let class = self.build_class(ctx, def, env)?;
                self.arena().set(env, &def.name, class);
            }
            StmtKind::Import(names) => {
                for name in names {
                    self.import_into(ctx, &name.path, name.alias.as_deref(), env)?;
                }
            }
            StmtKind::FromImport { module, names } => {
                self.exec_from_import(ctx, module, names, env)?;
            }
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finally,
            } => return self.exec_try(ctx, body, handlers, orelse, finally, env, active),
            StmtKind::Raise(value) => {
                return Err(ControlAction::Error(self.raised(ctx, value.as_ref(), env, active)));
            }
            StmtKind::With {
                context,
                target,
                body,
            } => return self.exec_with(ctx, context, target.as_ref(), body, env, active),
            StmtKind::Global(names) => {
                for name in names {
                    self.arena().declare_global(env, name);
                }
            }
            StmtKind::Nonlocal(names) => {
                for name in names {
                    self.arena().declare_nonlocal(env, name)?;
                }
            }
            StmtKind::Assert { test, message } => {
                if !self.eval_expr(ctx, test, env)?.is_truthy() {
                    let message = match message {
                        Some(expr) => display(&self.eval_expr(ctx, expr, env)?),
                        None => String::new(),
                    };
                    return Err(EvalError::exception("AssertionError", message).into());
                }
            }
            StmtKind::Del(targets) => {
                for target in targets {
                    self.delete_target(ctx, target, env)?;
                }
            }
        }
        Ok(())
    }

    /// Bind `value` to an assignment target.
    pub(super) fn assign(
        &self,
        ctx: &ExecContext,
        target: &Expr,
        value: Value,
        env: &EnvRef,
    ) -> Result<(), EvalError> {
        match &target.kind {
            ExprKind::Name(name) => {
                self.arena().set(env, name, value);
                Ok(())
            }
            ExprKind::Attribute { value: object, attr } => {
                let object = self.eval_expr(ctx, object, env)?;
                self.store_attribute(&object, attr, value)
            }
            ExprKind::Index { value: object, index } => {
                let object = self.eval_expr(ctx, object, env)?;
                let key = self.eval_expr(ctx, index, env)?;
                self.set_item(ctx, &object, key, value)
            }
            ExprKind::Tuple(targets) | ExprKind::List(targets) => {
                let values = value.to_items()?;
                if values.len() != targets.len() {
                    return Err(unpack_error(targets.len(), values.len()));
                }
                for (target, value) in targets.iter().zip(values) {
                    self.assign(ctx, target, value, env)?;
                }
                Ok(())
            }
            _ => Err(EvalError::exception("SyntaxError", "cannot assign to expression")),
        }
    }

    /// Subexpressions of the target are evaluated once.
    fn exec_aug_assign(
        &self,
        ctx: &ExecContext,
        target: &Expr,
        op: BinaryOp,
        value: &Expr,
        env: &EnvRef,
    ) -> Result<(), EvalError> {
        match &target.kind {
            ExprKind::Name(name) => {
                let current = self.lookup(env, name)?;
                let rhs = self.eval_expr(ctx, value, env)?;
                let updated = augmented(&current, &rhs, op)?;
                self.arena().set(env, name, updated);
                Ok(())
            }
            ExprKind::Attribute { value: object, attr } => {
                let object = self.eval_expr(ctx, object, env)?;
                let current = self.load_attribute(&object, attr)?;
                let rhs = self.eval_expr(ctx, value, env)?;
                let updated = augmented(&current, &rhs, op)?;
                self.store_attribute(&object, attr, updated)
            }
            ExprKind::Index { value: object, index } => {
                let object = self.eval_expr(ctx, object, env)?;
                let key = self.eval_expr(ctx, index, env)?;
                let current = self.subscript(ctx, &object, &key)?;
                let rhs = self.eval_expr(ctx, value, env)?;
                let updated = augmented(&current, &rhs, op)?;
                self.set_item(ctx, &object, key, updated)
            }
            _ => Err(EvalError::exception(
                "SyntaxError",
                "illegal expression for augmented assignment",
            )),
        }
    }

    fn delete_target(&self, ctx: &ExecContext, target: &Expr, env: &EnvRef) -> Result<(), EvalError> {
        match &target.kind {
            ExprKind::Name(name) => {
                if self.arena().delete(env, name) {
                    Ok(())
                } else {
                    Err(undefined_variable(name))
                }
            }
            ExprKind::Index { value, index } => {
                let object = self.eval_expr(ctx, value, env)?;
                let key = self.eval_expr(ctx, index, env)?;
                self.delete_item(&object, &key)
            }
            ExprKind::Attribute { value, attr } => {
                let object = self.eval_expr(ctx, value, env)?;
                match &object {
                    Value::Instance(inst) if inst.remove_field(attr).is_some() => Ok(()),
                    other => Err(no_attribute(other.type_name(), attr)),
                }
            }
            ExprKind::Tuple(targets) | ExprKind::List(targets) => {
                for target in targets {
                    self.delete_target(ctx, target, env)?;
                }
                Ok(())
            }
            _ => Err(EvalError::exception("SyntaxError", "cannot delete expression")),
        }
    }

    /// Evaluate a class body into a class.
    ///
    /// The parent may be a script class or a builtin exception constructor;
    /// the latter gives the class an `__init__` storing `message` and
    /// `args` unless the body defines one.
    #[tracing::instrument(level = "debug", skip_all, fields(class = %def.name))]
    fn build_class(&self, ctx: &ExecContext, def: &ClassDef, env: &EnvRef) -> EvalResult {
        let mut parent = None;
        let mut exception_base = false;
        if let Some(parent_expr) = &def.parent {
            match self.eval_expr(ctx, parent_expr, env)? {
                Value::Class(class) => parent = Some(Arc::clone(class.inner())),
                Value::Builtin(ctor) if is_exception_type(ctor.name()) => exception_base = true,
                other => {
                    return Err(type_error(format!(
                        "class parent must be a class, not '{}'",
                        other.type_name()
                    )))
                }
            }
        }
        let locals = {
            let scope = self.scoped(Frame::new(FrameKind::Class, Some(env.clone())));
            self.exec_block(ctx, &def.body, scope.env(), None)
                .map_err(stray_control)?;
            self.arena().locals(scope.env())
        };
        let mut members: IndexMap<String, Value> = locals.into_iter().collect();
        if exception_base && !members.contains_key(INIT) {
            members.insert(INIT.to_string(), exception_init());
        }
        let class = ClassValue::new(def.name.clone(), parent, members, def.docstring.clone());
        Ok(Value::class(Arc::new(class)))
    }

    fn exec_from_import(
        &self,
        ctx: &ExecContext,
        module: &str,
        names: &[(String, Option<String>)],
        env: &EnvRef,
    ) -> Result<(), EvalError> {
        let library = self.resolve_library(ctx, module, env)?;
        for (name, alias) in names {
            let value = match &library {
                Value::Dict(map) => map.read().get(name).cloned(),
                _ => None,
            };
            let value = value.ok_or_else(|| {
                EvalError::exception(
                    "ImportError",
                    format!("cannot import name '{name}' from '{module}'"),
                )
            })?;
            self.arena().set(env, alias.as_deref().unwrap_or(name), value);
        }
        Ok(())
    }

    #[expect(
        clippy::too_many_arguments,
        reason = "try clauses are passed as they appear in the statement"
    )]
    fn exec_try(
        &self,
        ctx: &ExecContext,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finally: &[Stmt],
        env: &EnvRef,
        active: Option<&EvalError>,
    ) -> ExecResult {
        let outcome = match self.exec_block(ctx, body, env, active) {
            Ok(()) => self.exec_block(ctx, orelse, env, active),
            Err(ControlAction::Error(err)) if !handlers.is_empty() && !is_interrupt(&err) => {
                self.handle_exception(ctx, err, handlers, env)
            }
            Err(other) => Err(other),
        };
        if finally.is_empty() {
            return outcome;
        }
        // A control action raised by `finally` replaces the pending one.
        self.exec_block(ctx, finally, env, active)?;
        outcome
    }

    fn handle_exception(
        &self,
        ctx: &ExecContext,
        err: EvalError,
        handlers: &[ExceptHandler],
        env: &EnvRef,
    ) -> ExecResult {
        for handler in handlers {
            if self.handler_matches(ctx, handler, &err, env)? {
                tracing::trace!(exception = err.exception_type(), "exception handled");
                if let Some(name) = &handler.name {
                    self.arena().set(env, name, err.to_value());
                }
                return self.exec_block(ctx, &handler.body, env, Some(&err));
            }
        }
        Err(err.into())
    }

    fn handler_matches(
        &self,
        ctx: &ExecContext,
        handler: &ExceptHandler,
        err: &EvalError,
        env: &EnvRef,
    ) -> Result<bool, EvalError> {
        if handler.types.is_empty() {
            return Ok(true);
        }
        for type_expr in &handler.types {
            let filter = self.eval_expr(ctx, type_expr, env)?;
            let filters = match &filter {
                Value::Tuple(items) => items.to_vec(),
                other => vec![other.clone()],
            };
            for filter in &filters {
                let name = exception_filter_name(filter).ok_or_else(|| {
                    type_error("catching classes that do not inherit from BaseException is not allowed")
                })?;
                if err.matches(&name) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// The error a `raise` statement propagates.
    fn raised(
        &self,
        ctx: &ExecContext,
        expr: Option<&Expr>,
        env: &EnvRef,
        active: Option<&EvalError>,
    ) -> EvalError {
        let Some(expr) = expr else {
            return active.cloned().unwrap_or_else(|| {
                EvalError::exception("RuntimeError", "No active exception to reraise")
            });
        };
        let value = match self.eval_expr(ctx, expr, env) {
            Ok(value) => value,
            Err(err) => return err,
        };
        match &value {
            Value::Error(err) => EvalError::exception(err.exc_type.clone(), err.message.clone()),
            Value::Builtin(ctor) if is_exception_type(ctor.name()) => {
                EvalError::exception(ctor.name(), "")
            }
            Value::Str(message) => EvalError::exception(CATCH_ALL, message.to_string()),
            Value::Instance(inst) => {
                let message = inst
                    .get_field("message")
                    .map(|m| display(&m))
                    .unwrap_or_default();
                EvalError::exception(inst.class().name(), message)
            }
            Value::Class(class) => EvalError::exception(class.name(), ""),
            _ => type_error("exceptions must derive from BaseException"),
        }
    }

    /// `with`: `__exit__` runs exactly once however the body is left.
    fn exec_with(
        &self,
        ctx: &ExecContext,
        context: &Expr,
        target: Option<&Expr>,
        body: &[Stmt],
        env: &EnvRef,
        active: Option<&EvalError>,
    ) -> ExecResult {
        let manager = self.eval_expr(ctx, context, env)?;
        let (enter, exit) = match &manager {
            Value::Instance(inst) => {
                let dunders = inst.class().dunders();
                match (&dunders.enter, &dunders.exit) {
                    (Some(enter), Some(exit)) => (enter.clone(), exit.clone()),
                    _ => return Err(not_context_manager(inst.class().name()).into()),
                }
            }
            other => return Err(not_context_manager(other.type_name()).into()),
        };
        let entered = self.call_method(ctx, &enter, &manager, None, Vec::new(), Kwargs::new())?;
        let outcome = match target {
            Some(target) => self.assign(ctx, target, entered, env).map_err(ControlAction::from),
            None => Ok(()),
        }
        .and_then(|()| self.exec_block(ctx, body, env, active));

        match outcome {
            Err(ControlAction::Error(err)) => {
                let args = vec![
                    Value::string(err.exception_type()),
                    Value::string(&err.message),
                    Value::Null,
                ];
                let suppress = self.call_method(ctx, &exit, &manager, None, args, Kwargs::new())?;
                if suppress.is_truthy() && !is_interrupt(&err) {
                    tracing::trace!(exception = err.exception_type(), "suppressed by __exit__");
                    Ok(())
                } else {
                    Err(err.into())
                }
            }
            other => {
                let args = vec![Value::Null, Value::Null, Value::Null];
                self.call_method(ctx, &exit, &manager, None, args, Kwargs::new())?;
                other
            }
        }
    }
}
