//! Tree-walking interpreter.
//!
//! One [`Interpreter`] serves every evaluation of a runtime. It owns the
//! frame arena, the global frame, the builtin table and the library
//! registry; whatever is specific to a single evaluation (deadline,
//! cancellation, call depth) travels in the `ExecContext`.
//!
//! # Control flow
//!
//! Statements return [`ExecResult`]. `return`, `break` and `continue`
//! travel as [`ControlAction`] variants alongside errors, so `finally` and
//! `with` can observe every way a block is left.
//!
//! # Layout
//!
//! - `exec`: statements, assignment targets, `try` and `with`
//! - `expr`: expressions
//! - `function_call`: argument binding and call dispatch
//! - `method_dispatch`: attribute lookup and bound methods
//! - `protocol`: subscripts, slices and item assignment
//! - `imports`: library resolution
//! - `scope_guard`: frames released on scope exit

mod builder;
mod exec;
mod expr;
mod function_call;
mod imports;
mod method_dispatch;
mod protocol;
mod scope_guard;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sling_ir::Module;
use sling_parse::ParseError;
use sling_stack::CallDepth;
use sling_value::{
    EnvArena, EnvRef, EvalError, EvalResult, Evaluator, ExecContext, Frame, FrameKind, Kwargs,
    Value,
};

pub use builder::InterpreterBuilder;

use crate::print_handler::SharedPrintHandler;
use crate::registry::LibraryRegistry;

/// Non-local exit from a block.
#[derive(Debug)]
pub(crate) enum ControlAction {
    Error(EvalError),
    Return(Value),
    Break,
    Continue,
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Error(err)
    }
}

impl ControlAction {
    fn at_line(self, line: u32) -> Self {
        match self {
            ControlAction::Error(err) => ControlAction::Error(err.at_line(line)),
            other => other,
        }
    }
}

pub(crate) type ExecResult = Result<(), ControlAction>;

/// State shared by every clone of an interpreter.
struct Shared {
    // Declared first so frames are torn down before anything they reference.
    arena: Arc<EnvArena>,
    globals: EnvRef,
    builtins: FxHashMap<String, Value>,
    registry: LibraryRegistry,
    print: SharedPrintHandler,
    max_call_depth: usize,
}

/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Interpreter {
    shared: Arc<Shared>,
}

impl Interpreter {
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn arena(&self) -> &Arc<EnvArena> {
        &self.shared.arena
    }

    pub fn globals(&self) -> &EnvRef {
        &self.shared.globals
    }

    pub fn registry(&self) -> &LibraryRegistry {
        &self.shared.registry
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.shared.print
    }

    pub fn builtin(&self, name: &str) -> Option<Value> {
        self.shared.builtins.get(name).cloned()
    }

    /// Global binding, falling back to the builtins.
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.arena()
            .get(self.globals(), name)
            .or_else(|| self.builtin(name))
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.arena().define(self.globals(), name, value);
    }

    /// Context for one evaluation: the interpreter installed as evaluator,
    /// plus a fresh call-depth counter when the caller is not already
    /// inside an evaluation.
    pub fn prepare(&self, ctx: &ExecContext) -> ExecContext {
        let ctx = if ctx.evaluator().is_some() {
            ctx.clone()
        } else {
            ctx.with_call_depth(CallDepth::new(self.shared.max_call_depth))
        };
        ctx.with_evaluator(Arc::new(self.clone()))
    }

    /// Run a module in the global frame. Returns the value of the last
    /// top-level expression statement, or `None`.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = module.body.len()))]
    pub fn eval_module(&self, ctx: &ExecContext, module: &Module) -> EvalResult {
        let ctx = self.prepare(ctx);
        self.run_module(&ctx, module, self.globals())
    }

    pub fn eval_source(&self, ctx: &ExecContext, source: &str) -> EvalResult {
        let module = sling_parse::parse(source).map_err(|err| syntax_error(&err))?;
        self.eval_module(ctx, &module)
    }

    /// Run a module in a throwaway frame whose parent is the global frame.
    /// Returns the last expression value and the frame's bindings.
    pub fn eval_isolated(
        &self,
        ctx: &ExecContext,
        module: &Module,
    ) -> Result<(Value, Vec<(String, Value)>), EvalError> {
        let ctx = self.prepare(ctx);
        let scope = self.scoped(Frame::new(FrameKind::Module, Some(self.globals().clone())));
        let value = self.run_module(&ctx, module, scope.env())?;
        Ok((value, self.arena().locals(scope.env())))
    }

    /// Call any callable value.
    pub fn call(
        &self,
        ctx: &ExecContext,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> EvalResult {
        let ctx = self.prepare(ctx);
        self.dispatch(&ctx, callee, args, kwargs)
    }

    /// Script attribute read (`target.name`).
    pub fn attribute(&self, target: &Value, name: &str) -> EvalResult {
        self.load_attribute(target, name)
    }

    /// Import `name` into the global frame.
    pub fn import(&self, ctx: &ExecContext, name: &str) -> Result<(), EvalError> {
        let ctx = self.prepare(ctx);
        self.import_into(&ctx, name, None, self.globals())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("arena", &self.shared.arena)
            .field("registry", &self.shared.registry)
            .field("max_call_depth", &self.shared.max_call_depth)
            .finish_non_exhaustive()
    }
}

impl Evaluator for Interpreter {
    fn call_value(
        &self,
        ctx: &ExecContext,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> EvalResult {
        self.dispatch(ctx, callee, args, kwargs)
    }

    fn get_attribute(&self, _ctx: &ExecContext, target: &Value, name: &str) -> EvalResult {
        self.load_attribute(target, name)
    }

    fn set_attribute(
        &self,
        _ctx: &ExecContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), EvalError> {
        self.store_attribute(target, name, value)
    }
}

/// Parse failures surface to scripts and hosts as `SyntaxError`.
pub fn syntax_error(err: &ParseError) -> EvalError {
    EvalError::exception("SyntaxError", err.to_string()).at_line(err.line())
}
