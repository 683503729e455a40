//! The embedding API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sling_eval::{
    buffer_handler, stdout_handler, Interpreter, LibraryInfo, OnDemandFn, SharedPrintHandler,
};
use sling_value::{
    to_host, to_runtime, DictMap, EvalResult, ExecContext, HostValue, Kwargs, Library, Value,
};

use crate::error::ScriptError;

/// Longest dotted path `call_function` will walk.
const MAX_DOTTED_PATH_DEPTH: usize = 10;

/// A scripting runtime: one global frame, one library registry and one
/// print handler.
///
/// `Runtime` is `Send + Sync`. Concurrent evaluations share the global
/// frame.
#[derive(Clone, Debug)]
pub struct Runtime {
    interp: Interpreter,
    default_timeout: Option<Duration>,
}

impl Runtime {
    /// Runtime with the standard libraries, printing to stdout.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// Background context carrying the default timeout, if one is set.
    pub fn context(&self) -> ExecContext {
        let ctx = ExecContext::background();
        match self.default_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    // Evaluation

    pub fn eval(&self, source: &str) -> Result<Value, ScriptError> {
        self.eval_with_context(&self.context(), source)
    }

    pub fn eval_with_timeout(&self, timeout: Duration, source: &str) -> Result<Value, ScriptError> {
        self.eval_with_context(&ExecContext::background().with_timeout(timeout), source)
    }

    /// Parse and run `source` in the global frame. Returns the value of the
    /// last top-level expression statement.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn eval_with_context(&self, ctx: &ExecContext, source: &str) -> Result<Value, ScriptError> {
        let module = sling_parse::parse(source)?;
        match self.interp.eval_module(ctx, &module) {
            Ok(value) => Ok(value),
            Err(err) => ScriptError::from_eval(err).map(|()| Value::Null),
        }
    }

    // Variables

    pub fn set_var(&self, name: &str, value: impl Into<HostValue>) {
        self.set_value(name, to_runtime(value.into()));
    }

    pub fn set_value(&self, name: &str, value: Value) {
        self.interp.set_global(name, value);
    }

    pub fn get_var(&self, name: &str) -> Option<HostValue> {
        self.get_value(name).map(|value| to_host(&value))
    }

    /// A global binding. Builtins are not variables.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.interp.arena().get(self.interp.globals(), name)
    }

    fn var(&self, name: &str) -> Result<Value, ScriptError> {
        self.get_value(name)
            .ok_or_else(|| ScriptError::Host(format!("variable '{name}' not found")))
    }

    pub fn get_var_as_string(&self, name: &str) -> Result<String, ScriptError> {
        self.var(name)?.as_string().map_err(ScriptError::Runtime)
    }

    pub fn get_var_as_int(&self, name: &str) -> Result<i64, ScriptError> {
        self.var(name)?.as_int().map_err(ScriptError::Runtime)
    }

    pub fn get_var_as_float(&self, name: &str) -> Result<f64, ScriptError> {
        self.var(name)?.as_float().map_err(ScriptError::Runtime)
    }

    pub fn get_var_as_bool(&self, name: &str) -> Result<bool, ScriptError> {
        self.var(name)?.as_bool().map_err(ScriptError::Runtime)
    }

    pub fn get_var_as_list(&self, name: &str) -> Result<Vec<Value>, ScriptError> {
        self.var(name)?.as_list().map_err(ScriptError::Runtime)
    }

    pub fn get_var_as_dict(&self, name: &str) -> Result<DictMap, ScriptError> {
        self.var(name)?.as_dict().map_err(ScriptError::Runtime)
    }

    // Functions

    /// Bind a host function as a global. Without `help`, the help text is
    /// `name(...) - User-defined function`.
    pub fn register_func<F>(&self, name: &str, help: Option<&str>, func: F)
    where
        F: Fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult + Send + Sync + 'static,
    {
        let help = match help {
            Some(help) if !help.is_empty() => help.to_string(),
            _ => format!("{name}(...) - User-defined function"),
        };
        tracing::debug!(name, "host function registered");
        self.set_value(name, Value::builtin(name, Some(help), func));
    }

    /// Evaluate `source` and bind its result, which must be a function, as
    /// `name`.
    pub fn register_script_func(&self, name: &str, source: &str) -> Result<(), ScriptError> {
        match self.eval(source)? {
            func @ Value::Function(_) => {
                self.set_value(name, func);
                Ok(())
            }
            other => Err(ScriptError::Host(format!(
                "script must evaluate to a function, got {}",
                other.type_name()
            ))),
        }
    }

    // Libraries

    pub fn register_library(&self, library: Arc<Library>) -> Result<(), ScriptError> {
        self.interp
            .registry()
            .register_library(library)
            .map_err(ScriptError::Runtime)
    }

    pub fn register_script_library(&self, name: &str, source: &str) -> Result<(), ScriptError> {
        self.interp
            .registry()
            .register_script_library(name, source)
            .map_err(ScriptError::Runtime)
    }

    /// Bind library `name` in the global frame, as `import name` would.
    pub fn import(&self, name: &str) -> Result<(), ScriptError> {
        self.interp
            .import(&self.context(), name)
            .map_err(ScriptError::Runtime)
    }

    pub fn import_all(&self, names: &[&str]) -> Result<(), ScriptError> {
        names.iter().try_for_each(|name| self.import(name))
    }

    /// Install a callback consulted once when an import finds nothing. It
    /// should register the library and return `true`, or return `false`.
    pub fn set_on_demand_library_callback<F>(&self, callback: F)
    where
        F: Fn(&sling_eval::LibraryRegistry, &str) -> bool + Send + Sync + 'static,
    {
        let callback: Arc<OnDemandFn> = Arc::new(callback);
        self.interp.registry().set_on_demand(Some(callback));
    }

    pub fn libraries(&self) -> Vec<LibraryInfo> {
        self.interp.registry().libraries()
    }

    // Calls

    /// Call the global callable `name` with host arguments.
    ///
    /// ```text
    /// let total = runtime.call_function("add", [1_i64, 2], HashMap::new())?;
    /// ```
    pub fn call_function<I, A>(
        &self,
        name: &str,
        args: I,
        kwargs: HashMap<String, HostValue>,
    ) -> Result<Value, ScriptError>
    where
        I: IntoIterator<Item = A>,
        A: Into<HostValue>,
    {
        self.call_function_with_context(&self.context(), name, args, kwargs)
    }

    pub fn call_function_with_context<I, A>(
        &self,
        ctx: &ExecContext,
        name: &str,
        args: I,
        kwargs: HashMap<String, HostValue>,
    ) -> Result<Value, ScriptError>
    where
        I: IntoIterator<Item = A>,
        A: Into<HostValue>,
    {
        let args = args.into_iter().map(|arg| to_runtime(arg.into())).collect();
        let kwargs = kwargs
            .into_iter()
            .map(|(key, value)| (key, to_runtime(value)))
            .collect();
        self.call_function_values_with_context(ctx, name, args, kwargs)
    }

    /// [`Runtime::call_function`] with the result marshalled out as well.
    pub fn call_function_host<I, A>(
        &self,
        name: &str,
        args: I,
        kwargs: HashMap<String, HostValue>,
    ) -> Result<HostValue, ScriptError>
    where
        I: IntoIterator<Item = A>,
        A: Into<HostValue>,
    {
        self.call_function_host_with_context(&self.context(), name, args, kwargs)
    }

    pub fn call_function_host_with_context<I, A>(
        &self,
        ctx: &ExecContext,
        name: &str,
        args: I,
        kwargs: HashMap<String, HostValue>,
    ) -> Result<HostValue, ScriptError>
    where
        I: IntoIterator<Item = A>,
        A: Into<HostValue>,
    {
        let value = self.call_function_with_context(ctx, name, args, kwargs)?;
        Ok(to_host(&value))
    }

    /// Lower-level [`Runtime::call_function`] for callers that already hold
    /// runtime values, such as a function or instance read back out.
    pub fn call_function_values(
        &self,
        name: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, ScriptError> {
        self.call_function_values_with_context(&self.context(), name, args, kwargs)
    }

    /// Call the global callable `name`. A dotted name walks nested dicts
    /// (libraries) and attributes from the global root.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %name))]
    pub fn call_function_values_with_context(
        &self,
        ctx: &ExecContext,
        name: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, ScriptError> {
        let callee = self
            .resolve_path(name)
            .ok_or_else(|| ScriptError::Host(format!("function '{name}' not found")))?;
        finish(
            self.interp.call(ctx, &callee, args, kwargs),
            &format!("function '{name}'"),
        )
    }

    fn resolve_path(&self, name: &str) -> Option<Value> {
        if name.split('.').count() > MAX_DOTTED_PATH_DEPTH {
            return None;
        }
        let mut parts = name.split('.');
        let root = self.interp.get_global(parts.next()?)?;
        parts.try_fold(root, |current, part| match &current {
            Value::Dict(map) => map.read().get(part).cloned(),
            _ => self.interp.attribute(&current, part).ok(),
        })
    }

    pub fn create_instance(
        &self,
        class: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, ScriptError> {
        self.create_instance_with_context(&self.context(), class, args, kwargs)
    }

    pub fn create_instance_with_context(
        &self,
        ctx: &ExecContext,
        class: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, ScriptError> {
        let value = self
            .interp
            .get_global(class)
            .ok_or_else(|| ScriptError::Host(format!("class '{class}' not found")))?;
        if !matches!(value, Value::Class(_)) {
            return Err(ScriptError::Host(format!(
                "'{class}' is not a class, got {}",
                value.type_name()
            )));
        }
        finish(
            self.interp.call(ctx, &value, args, kwargs),
            &format!("class '{class}'"),
        )
    }

    pub fn call_method(
        &self,
        instance: &Value,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, ScriptError> {
        self.call_method_with_context(&self.context(), instance, method, args, kwargs)
    }

    /// Call `method` on a script instance, looking it up along the class
    /// chain.
    pub fn call_method_with_context(
        &self,
        ctx: &ExecContext,
        instance: &Value,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, ScriptError> {
        let Value::Instance(inst) = instance else {
            return Err(ScriptError::Host(format!(
                "object is not an instance, got {}",
                instance.type_name()
            )));
        };
        let class = inst.class();
        let Some((func, owner)) = class.lookup_with_owner(method) else {
            return Err(ScriptError::Host(format!(
                "method '{method}' not found in class '{}'",
                class.name()
            )));
        };
        let bound = Value::bound_method(instance.clone(), func, Some(owner));
        finish(
            self.interp.call(ctx, &bound, args, kwargs),
            &format!("method '{method}' on class '{}'", class.name()),
        )
    }

    // Output

    pub fn print_handler(&self) -> &SharedPrintHandler {
        self.interp.print_handler()
    }

    /// Text printed so far when output is captured; empty otherwise.
    pub fn output(&self) -> String {
        self.print_handler().output()
    }

    pub fn clear_output(&self) {
        self.print_handler().clear();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

/// Configures a [`Runtime`].
pub struct RuntimeBuilder {
    print: SharedPrintHandler,
    timeout: Option<Duration>,
    max_call_depth: Option<usize>,
    on_demand: Option<Arc<OnDemandFn>>,
    stdlib: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        RuntimeBuilder {
            print: stdout_handler(),
            timeout: None,
            max_call_depth: None,
            on_demand: None,
            stdlib: true,
        }
    }

    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print = handler;
        self
    }

    /// Collect `print` output for [`Runtime::output`] instead of writing it.
    #[must_use]
    pub fn capture_output(self) -> Self {
        self.print_handler(buffer_handler())
    }

    /// Deadline applied by [`Runtime::eval`] and the other calls that do
    /// not take a context.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn on_demand_library_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&sling_eval::LibraryRegistry, &str) -> bool + Send + Sync + 'static,
    {
        self.on_demand = Some(Arc::new(callback));
        self
    }

    /// Register `functools`, `collections`, `contextlib` and `time`
    /// (default on).
    #[must_use]
    pub fn stdlib(mut self, enabled: bool) -> Self {
        self.stdlib = enabled;
        self
    }

    pub fn build(self) -> Runtime {
        let mut interp = Interpreter::builder().print_handler(self.print);
        if let Some(depth) = self.max_call_depth {
            interp = interp.max_call_depth(depth);
        }
        let interp = interp.build();
        if self.stdlib {
            if let Err(err) = sling_stdlib::register_all(interp.registry()) {
                tracing::warn!(%err, "standard libraries not registered");
            }
        }
        interp.registry().set_on_demand(self.on_demand);
        Runtime {
            interp,
            default_timeout: self.timeout,
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        RuntimeBuilder::new()
    }
}

fn finish(result: EvalResult, context: &str) -> Result<Value, ScriptError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => ScriptError::from_eval_in(err, context).map(|()| Value::Null),
    }
}

#[cfg(test)]
mod tests;
