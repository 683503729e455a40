//! Core runtime data for Sling.
//!
//! Everything a host function needs lives here: the [`Value`] model and its
//! coercions, [`EvalError`] and its factories, [`Kwargs`], arity checks, the
//! frame arena, the [`ExecContext`] with its evaluator bridge, [`Library`]
//! descriptors and the host marshaller. The interpreter and the standard
//! libraries both build on this crate; neither depends on the other.

pub mod args;
mod context;
pub mod env;
pub mod errors;
mod host;
mod kwargs;
mod library;
pub mod value;

pub use context::{CancelToken, Evaluator, ExecContext};
pub use env::{EnvArena, EnvRef, Frame, FrameId, FrameKind, MethodOwner};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use host::{to_host, to_runtime, HostValue};
pub use kwargs::Kwargs;
pub use library::{Library, LibraryBuilder, DOC_KEY};
pub use value::{
    BoundMethodValue, BuiltinValue, ClassValue, DictMap, Dunders, ErrorValue, FunctionValue,
    Heap, InstanceValue, NativeFn, Value,
};
