//! Sling: an embeddable, Python-like scripting runtime.
//!
//! # Architecture
//!
//! ```text
//! source ──► sling_lexer ──► sling_parse ──► sling_ir::Module
//!                                                 │
//!                                                 ▼
//!            sling_value ◄── sling_eval::Interpreter ──► LibraryRegistry
//!                 ▲                                          ▲
//!                 └──────────── sling_stdlib ────────────────┘
//! ```
//!
//! [`Runtime`] is the host-facing surface: evaluate source, read and write
//! globals, register host functions and libraries, and call script
//! functions, classes and methods back from the host.
//!
//! ```text
//! let rt = Runtime::builder().capture_output().build();
//! rt.set_var("name", "world");
//! rt.eval("print('hello ' + name)")?;
//! assert_eq!(rt.output(), "hello world\n");
//! ```

mod error;
mod runtime;

pub use error::ScriptError;
pub use runtime::{Runtime, RuntimeBuilder};

pub use sling_eval::{
    buffer_handler, silent_handler, stdout_handler, LibraryInfo, LibraryRegistry, PrintHandler,
    SharedPrintHandler,
};
pub use sling_parse::ParseError;
pub use sling_value::{
    args, errors, to_host, to_runtime, CancelToken, EvalError, EvalErrorKind, EvalResult,
    ExecContext, HostValue, Kwargs, Library, LibraryBuilder, Value,
};

/// The standard libraries, for registering with a runtime built without
/// them.
pub use sling_stdlib as stdlib;
