//! Callable values: script closures, host builtins and bound methods.

use std::fmt;
use std::sync::Arc;

use sling_ir::FunctionDef;

use super::{ClassValue, Value};
use crate::context::ExecContext;
use crate::env::EnvRef;
use crate::errors::EvalResult;
use crate::kwargs::Kwargs;

/// Signature of a host-native function.
pub type NativeFn = dyn Fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult + Send + Sync;

/// A script function closed over its defining environment.
///
/// Immutable after creation. Defaults are evaluated at call time in `env`.
pub struct FunctionValue {
    def: Arc<FunctionDef>,
    env: EnvRef,
}

impl FunctionValue {
    pub fn new(def: Arc<FunctionDef>, env: EnvRef) -> Self {
        FunctionValue { def, env }
    }

    #[inline]
    pub fn def(&self) -> &Arc<FunctionDef> {
        &self.def
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Captured (defining) environment.
    #[inline]
    pub fn env(&self) -> &EnvRef {
        &self.env
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.def.name)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

/// A host-native function with optional help text.
pub struct BuiltinValue {
    name: String,
    help: Option<String>,
    func: Arc<NativeFn>,
}

impl BuiltinValue {
    pub fn new(name: impl Into<String>, help: Option<String>, func: Arc<NativeFn>) -> Self {
        BuiltinValue {
            name: name.into(),
            help,
            func,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    #[inline]
    pub fn call(&self, ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
        (self.func)(ctx, kwargs, args)
    }
}

impl fmt::Debug for BuiltinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinValue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A method paired with its receiver, produced by attribute access.
///
/// `owner` is the class the method was found on; `super()` inside the
/// method resolves from its parent.
#[derive(Debug)]
pub struct BoundMethodValue {
    pub receiver: Value,
    pub method: Value,
    pub owner: Option<Arc<ClassValue>>,
}

impl BoundMethodValue {
    /// Name of the wrapped method.
    pub fn method_name(&self) -> &str {
        match &self.method {
            Value::Function(f) => f.name(),
            Value::Builtin(b) => b.name(),
            _ => "?",
        }
    }
}
