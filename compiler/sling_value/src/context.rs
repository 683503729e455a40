//! Execution context: deadline, cancellation, evaluator bridge, and typed
//! capabilities.
//!
//! An `ExecContext` travels with every call. Host functions receive it as
//! their first argument, which lets them observe cancellation, sleep
//! cooperatively, and call script closures back through the [`Evaluator`]
//! the interpreter installs.
//!
//! Cancellation is a crossbeam channel nobody ever sends on: cancelling
//! drops the sender, which disconnects every receiver at once and wakes any
//! `select!` waiting on it.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sling_stack::CallDepth;

use crate::errors::{cancelled, no_attribute, not_callable, timeout, EvalError, EvalResult};
use crate::kwargs::Kwargs;
use crate::value::Value;

/// Bridge that lets host code invoke any callable value.
///
/// The interpreter implements this and installs itself into the context for
/// the duration of an evaluation.
pub trait Evaluator: Send + Sync {
    fn call_value(
        &self,
        ctx: &ExecContext,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> EvalResult;

    /// Attribute read with full script semantics (bound methods included).
    fn get_attribute(&self, _ctx: &ExecContext, target: &Value, name: &str) -> EvalResult {
        Err(no_attribute(target.type_name(), name))
    }

    fn set_attribute(
        &self,
        _ctx: &ExecContext,
        target: &Value,
        name: &str,
        _value: Value,
    ) -> Result<(), EvalError> {
        Err(no_attribute(target.type_name(), name))
    }
}

/// Shared cancellation signal.
#[derive(Clone)]
pub struct CancelToken {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = channel::bounded(0);
        CancelToken {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready once cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        CancelToken::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

type Capabilities = FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Per-evaluation context. Cheap to clone; clones share cancellation and
/// call depth.
#[derive(Clone)]
pub struct ExecContext {
    deadline: Option<Instant>,
    cancel: CancelToken,
    evaluator: Option<Arc<dyn Evaluator>>,
    depth: CallDepth,
    capabilities: Arc<Capabilities>,
}

impl ExecContext {
    /// Context with no deadline.
    pub fn background() -> Self {
        ExecContext {
            deadline: None,
            cancel: CancelToken::new(),
            evaluator: None,
            depth: CallDepth::default(),
            capabilities: Arc::new(Capabilities::default()),
        }
    }

    /// Child context whose deadline is at most `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context with the earlier of the existing and given deadlines.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        child
    }

    #[must_use]
    pub fn with_evaluator(&self, evaluator: Arc<dyn Evaluator>) -> Self {
        let mut child = self.clone();
        child.evaluator = Some(evaluator);
        child
    }

    #[must_use]
    pub fn with_call_depth(&self, depth: CallDepth) -> Self {
        let mut child = self.clone();
        child.depth = depth;
        child
    }

    /// Child context carrying a typed capability (a default client, say).
    #[must_use]
    pub fn with_capability<T: Any + Send + Sync>(&self, value: Arc<T>) -> Self {
        let mut child = self.clone();
        let mut caps = (*self.capabilities).clone();
        caps.insert(TypeId::of::<T>(), value);
        child.capabilities = Arc::new(caps);
        child
    }

    pub fn capability<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.capabilities
            .get(&TypeId::of::<T>())
            .and_then(|cap| Arc::clone(cap).downcast::<T>().ok())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn call_depth(&self) -> &CallDepth {
        &self.depth
    }

    pub fn evaluator(&self) -> Option<&Arc<dyn Evaluator>> {
        self.evaluator.as_ref()
    }

    /// Fail if the deadline passed or the context was cancelled.
    pub fn check(&self) -> Result<(), EvalError> {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(timeout());
        }
        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }
        Ok(())
    }

    /// Block for `duration`, waking early on deadline or cancellation.
    pub fn sleep(&self, duration: Duration) -> Result<(), EvalError> {
        self.check()?;
        let deadline = match self.deadline {
            Some(at) => channel::at(at),
            None => channel::never(),
        };
        select! {
            recv(self.cancel.receiver()) -> _ => Err(self.stop_error()),
            recv(deadline) -> _ => Err(timeout()),
            recv(channel::after(duration)) -> _ => Ok(()),
        }
    }

    /// Timeout once the deadline has passed, cancellation otherwise.
    fn stop_error(&self) -> EvalError {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            timeout()
        } else {
            cancelled()
        }
    }

    /// Call any callable through the installed evaluator.
    ///
    /// Without an evaluator only host builtins can be called.
    pub fn call(&self, callee: &Value, args: Vec<Value>, kwargs: Kwargs) -> EvalResult {
        if let Some(evaluator) = &self.evaluator {
            return evaluator.call_value(self, callee, args, kwargs);
        }
        match callee {
            Value::Builtin(builtin) => builtin.call(self, kwargs, args),
            Value::BoundMethod(bound) if matches!(bound.method, Value::Builtin(_)) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(bound.receiver.clone());
                full.extend(args);
                self.call(&bound.method, full, kwargs)
            }
            other if other.is_callable() => Err(EvalError::new(format!(
                "no evaluator available to call {}",
                other.inspect()
            ))),
            other => Err(not_callable(other.type_name())),
        }
    }
}

impl ExecContext {
    /// Attribute read through the evaluator; plain instance fields and dict
    /// keys resolve even without one.
    pub fn get_attribute(&self, target: &Value, name: &str) -> EvalResult {
        if let Some(evaluator) = &self.evaluator {
            return evaluator.get_attribute(self, target, name);
        }
        let found = match target {
            Value::Instance(inst) => inst.get_field(name),
            Value::Dict(map) => map.read().get(name).cloned(),
            _ => None,
        };
        found.ok_or_else(|| no_attribute(target.type_name(), name))
    }

    pub fn set_attribute(&self, target: &Value, name: &str, value: Value) -> Result<(), EvalError> {
        if let Some(evaluator) = &self.evaluator {
            return evaluator.set_attribute(self, target, name, value);
        }
        match target {
            Value::Instance(inst) => {
                inst.set_field(name, value);
                Ok(())
            }
            _ => Err(no_attribute(target.type_name(), name)),
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        ExecContext::background()
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("deadline", &self.deadline)
            .field("cancel", &self.cancel)
            .field("has_evaluator", &self.evaluator.is_some())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
