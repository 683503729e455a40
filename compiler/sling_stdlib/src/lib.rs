//! Standard libraries for Sling.
//!
//! Each library is a process-wide singleton built on first use; the
//! accessors hand out clones of the same `Arc`, so registering a library
//! with several runtimes shares one descriptor.
//!
//! - [`functools`]: `reduce`, `partial`
//! - [`collections`]: `Counter`, `defaultdict`
//! - [`contextlib`]: `suppress`
//! - [`time`]: `sleep`, `time`, `monotonic`
//!
//! The classes here are ordinary script classes whose methods are host
//! builtins, so they go through the same dunder dispatch as script code.

mod collections;
mod contextlib;
mod functools;
mod time;

use std::sync::Arc;

use indexmap::IndexMap;
use sling_eval::LibraryRegistry;
use sling_value::errors::type_error;
use sling_value::{ClassValue, EvalError, EvalResult, ExecContext, InstanceValue, Kwargs, Library, Value};

pub use collections::collections;
pub use contextlib::contextlib;
pub use functools::functools;
pub use time::time;

/// Every standard library, in registration order.
pub fn all() -> Vec<Arc<Library>> {
    vec![functools(), collections(), contextlib(), time()]
}

/// Register every standard library with `registry`.
pub fn register_all(registry: &LibraryRegistry) -> Result<(), EvalError> {
    for library in all() {
        registry.register_library(library)?;
    }
    tracing::debug!("standard libraries registered");
    Ok(())
}

type Method = fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult;

/// A class whose methods are host builtins.
pub(crate) fn native_class(name: &str, doc: &str, methods: &[(&str, Method)]) -> Value {
    let members: IndexMap<String, Value> = methods
        .iter()
        .map(|&(method, func)| (method.to_string(), Value::builtin(method, None, func)))
        .collect();
    let class = ClassValue::new(name, None, members, Some(doc.to_string()));
    Value::class(Arc::new(class))
}

/// The receiver of a native method call.
pub(crate) fn receiver<'a>(args: &'a [Value], class: &str) -> Result<&'a InstanceValue, EvalError> {
    match args.first() {
        Some(Value::Instance(inst)) => Ok(&**inst),
        Some(other) => Err(type_error(format!(
            "descriptor requires a '{class}' object but received a '{}'",
            other.type_name()
        ))),
        None => Err(type_error(format!("unbound method of '{class}' needs an argument"))),
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use sling_eval::{buffer_handler, Interpreter};
    use sling_value::{EvalResult, ExecContext};

    /// Interpreter with every standard library registered.
    pub fn interpreter() -> Interpreter {
        let interp = Interpreter::builder().print_handler(buffer_handler()).build();
        let registered = super::register_all(interp.registry());
        assert!(registered.is_ok());
        interp
    }

    pub fn run(src: &str) -> EvalResult {
        interpreter().eval_source(&ExecContext::background(), src)
    }
}
