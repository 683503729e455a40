//! Tree-walking interpreter for Sling.
//!
//! [`Interpreter`] executes parsed modules against a frame arena and
//! implements the `Evaluator` bridge, so host functions can call script
//! callables back through their `ExecContext`. [`LibraryRegistry`] holds
//! host and script libraries and resolves `import`.
//!
//! Core builtins (`print`, `len`, the exception constructors, ...) and the
//! methods of lists, dicts and strings live in [`builtins`].

pub mod builtins;
mod interpreter;
mod operators;
mod print_handler;
mod registry;

pub use interpreter::{syntax_error, Interpreter, InterpreterBuilder};
pub use operators::{evaluate_binary, evaluate_compare, evaluate_unary, partial_order};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandler,
    SharedPrintHandler,
};
pub use registry::{LibraryInfo, LibraryRegistry, OnDemandFn, MAX_LIBRARY_DEPTH};
