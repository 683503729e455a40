//! Call dispatch and argument binding.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sling_value::errors::{
    multiple_values, not_callable, recursion_limit_exceeded, unexpected_keyword, wrong_arg_count,
};
use sling_value::value::{DictMap, FunctionValue};
use sling_value::{
    ClassValue, EvalError, EvalResult, ExecContext, Frame, FrameKind, Kwargs, MethodOwner, Value,
};

use super::{ControlAction, Interpreter};

impl Interpreter {
    /// Call any callable value.
    pub(super) fn dispatch(
        &self,
        ctx: &ExecContext,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> EvalResult {
        match callee {
            Value::Function(func) => self.call_function(ctx, func, args, kwargs, None),
            Value::Builtin(builtin) => builtin.call(ctx, kwargs, args),
            Value::Class(class) => self.instantiate(ctx, class.inner(), args, kwargs),
            Value::BoundMethod(bound) => self.call_method(
                ctx,
                &bound.method,
                &bound.receiver,
                bound.owner.clone(),
                args,
                kwargs,
            ),
            other => Err(not_callable(other.type_name())),
        }
    }

    /// Invoke a script function in a fresh frame under the closure's scope.
    /// `owner` is set for method calls so `super()` can resolve.
    pub(super) fn call_function(
        &self,
        ctx: &ExecContext,
        func: &FunctionValue,
        args: Vec<Value>,
        kwargs: Kwargs,
        owner: Option<MethodOwner>,
    ) -> EvalResult {
        let _depth = ctx
            .call_depth()
            .enter()
            .ok_or_else(recursion_limit_exceeded)?;
        let vars = self.bind_arguments(ctx, func, args, kwargs)?;
        let frame = Frame::new(FrameKind::Function, Some(func.env().clone()))
            .with_vars(vars)
            .with_owner(owner);
        let scope = self.scoped(frame);
        match self.exec_block(ctx, &func.def().body, scope.env(), None) {
            Ok(()) => Ok(Value::Null),
            Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Error(err)) => Err(err),
            Err(ControlAction::Break) => Err(EvalError::exception(
                "SyntaxError",
                "'break' outside loop",
            )),
            Err(ControlAction::Continue) => Err(EvalError::exception(
                "SyntaxError",
                "'continue' not properly in loop",
            )),
        }
    }

    /// Resolve call arguments against the function's parameters.
    ///
    /// Nothing is bound in any frame until every parameter resolved, so a
    /// failed binding leaves no trace.
    fn bind_arguments(
        &self,
        ctx: &ExecContext,
        func: &FunctionValue,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<FxHashMap<String, Value>, EvalError> {
        let params = &func.def().params;
        let declared = params.positional_count();
        let supplied = args.len() + kwargs.len();
        let mut vars = FxHashMap::default();

        let positional_len = args.len();
        let mut args = args.into_iter();
        for (index, value) in args.by_ref().take(declared).enumerate() {
            if let Some(name) = params.positional_name(index) {
                vars.insert(name.to_string(), value);
            }
        }
        let overflow: Vec<Value> = args.collect();
        if !overflow.is_empty() && params.varargs.is_none() {
            return Err(wrong_arg_count(declared, positional_len));
        }

        // Sorted so errors do not depend on map order.
        let mut keywords: Vec<(String, Value)> = kwargs.into_iter().collect();
        keywords.sort_by(|a, b| a.0.cmp(&b.0));
        let mut extra = DictMap::new();
        for (name, value) in keywords {
            if params.position_of(&name).is_some() {
                if vars.contains_key(&name) {
                    return Err(multiple_values(&name));
                }
                vars.insert(name, value);
            } else if params.kwargs.is_some() {
                extra.insert(name, value);
            } else {
                return Err(unexpected_keyword(&name));
            }
        }

        for (name, default) in &params.defaults {
            if !vars.contains_key(name) {
                let value = self.eval_expr(ctx, default, func.env())?;
                vars.insert(name.clone(), value);
            }
        }
        if params.required.iter().any(|name| !vars.contains_key(name)) {
            return Err(wrong_arg_count(params.required.len(), supplied));
        }

        if let Some(name) = &params.varargs {
            vars.insert(name.clone(), Value::tuple(overflow));
        }
        if let Some(name) = &params.kwargs {
            vars.insert(name.clone(), Value::dict(extra));
        }
        Ok(vars)
    }

    /// Call `method` with `receiver` prepended.
    ///
    /// For script methods the owner is the class the method was found on;
    /// when the caller does not know it, it is looked up on the receiver's
    /// class by name.
    pub(super) fn call_method(
        &self,
        ctx: &ExecContext,
        method: &Value,
        receiver: &Value,
        owner: Option<Arc<ClassValue>>,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> EvalResult {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend(args);
        match method {
            Value::Function(func) => {
                let owner = owner.or_else(|| match receiver {
                    Value::Instance(inst) => inst
                        .class()
                        .lookup_with_owner(func.name())
                        .map(|(_, class)| class),
                    _ => None,
                });
                let owner = owner.map(|class| MethodOwner {
                    class,
                    receiver: receiver.clone(),
                });
                self.call_function(ctx, func, full, kwargs, owner)
            }
            other => self.dispatch(ctx, other, full, kwargs),
        }
    }

    /// `Class(...)`: allocate, run `__init__`, return the instance.
    fn instantiate(
        &self,
        ctx: &ExecContext,
        class: &Arc<ClassValue>,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> EvalResult {
        let instance = Value::instance(Arc::clone(class));
        match &class.dunders().init {
            Some(init) => {
                self.call_method(ctx, init, &instance, None, args, kwargs)?;
            }
            None if !args.is_empty() || !kwargs.is_empty() => {
                return Err(wrong_arg_count(0, args.len() + kwargs.len()));
            }
            None => {}
        }
        Ok(instance)
    }
}
