//! Runtime errors.
//!
//! `EvalErrorKind` is the structured category; factory functions build an
//! `EvalError` with both the kind and the rendered message. Script-visible
//! exceptions all carry a type tag (`exception_type`), which is what
//! `except` clauses and `contextlib.suppress` match against.

use std::fmt;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Tag that every exception filter accepts.
pub const CATCH_ALL: &str = "Exception";

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Wrong number of arguments.
    Argument { want: usize, got: usize },
    /// Value of the wrong type.
    Type { expected: String, got: String },
    /// Plain message, reported as `Exception`.
    Generic,
    /// The context deadline passed.
    Timeout,
    /// The context was cancelled.
    Cancelled,
    /// Script-raised or typed runtime exception.
    Exception { exc_type: String },
}

impl EvalErrorKind {
    /// Exception tag used for `except` matching.
    pub fn exception_type(&self) -> &str {
        match self {
            Self::Argument { .. } | Self::Type { .. } => "TypeError",
            Self::Generic => CATCH_ALL,
            Self::Timeout => "TimeoutError",
            Self::Cancelled => "CancelledError",
            Self::Exception { exc_type } => exc_type,
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    /// Source line of the statement that raised, once known.
    pub line: Option<u32>,
}

impl EvalError {
    /// Generic error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            kind: EvalErrorKind::Generic,
            message: message.into(),
            line: None,
        }
    }

    fn from_kind(kind: EvalErrorKind, message: String) -> Self {
        EvalError {
            kind,
            message,
            line: None,
        }
    }

    /// Exception with an explicit type tag.
    pub fn exception(exc_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_kind(
            EvalErrorKind::Exception {
                exc_type: exc_type.into(),
            },
            message.into(),
        )
    }

    pub fn exception_type(&self) -> &str {
        self.kind.exception_type()
    }

    /// Whether an `except <filter>` clause catches this error.
    pub fn matches(&self, filter: &str) -> bool {
        exception_matches(self.exception_type(), filter)
    }

    /// Record the line of the failing statement, keeping the innermost one.
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        if self.line.is_none() && line > 0 {
            self.line = Some(line);
        }
        self
    }

    /// Prefix the message, keeping the kind.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.message = format!("{prefix}{}", self.message);
        self
    }

    /// Script-visible form bound by `except ... as e`.
    pub fn to_value(&self) -> Value {
        Value::error(self.exception_type(), self.message.clone())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Cancelled)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EvalErrorKind::Exception { exc_type } if !self.message.is_empty() => {
                write!(f, "{exc_type}: {}", self.message)
            }
            EvalErrorKind::Exception { exc_type } => write!(f, "{exc_type}"),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EvalError {}

/// `filter` catches `tag` when equal, or when the filter is the catch-all.
pub fn exception_matches(tag: &str, filter: &str) -> bool {
    filter == CATCH_ALL || filter == tag
}

/// Exception tag named by a filter value: a string, a class, or an
/// exception constructor.
pub fn exception_filter_name(filter: &Value) -> Option<String> {
    match filter {
        Value::Str(s) => Some(s.to_string()),
        Value::Class(class) => Some(class.name().to_string()),
        Value::Builtin(builtin) => Some(builtin.name().to_string()),
        _ => None,
    }
}

// Arity and type

#[cold]
pub fn wrong_arg_count(want: usize, got: usize) -> EvalError {
    EvalError::from_kind(
        EvalErrorKind::Argument { want, got },
        format!("argument error: got {got} arguments, want {want}"),
    )
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(
        EvalErrorKind::Type {
            expected: expected.to_string(),
            got: got.to_string(),
        },
        format!("type error: expected {expected}, got {got}"),
    )
}

/// `TypeError` with a free-form message.
#[cold]
pub fn type_error(message: impl Into<String>) -> EvalError {
    EvalError::exception("TypeError", message)
}

#[cold]
pub fn unexpected_keyword(name: &str) -> EvalError {
    type_error(format!("got an unexpected keyword argument '{name}'"))
}

#[cold]
pub fn multiple_values(name: &str) -> EvalError {
    type_error(format!("multiple values for argument '{name}'"))
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    type_error(format!("'{type_name}' object is not callable"))
}

#[cold]
pub fn not_subscriptable(type_name: &str) -> EvalError {
    type_error(format!("'{type_name}' object is not subscriptable"))
}

#[cold]
pub fn no_item_assignment(type_name: &str) -> EvalError {
    type_error(format!(
        "'{type_name}' object does not support item assignment"
    ))
}

#[cold]
pub fn not_context_manager(type_name: &str) -> EvalError {
    type_error(format!(
        "'{type_name}' object does not support the context manager protocol"
    ))
}

#[cold]
pub fn unsupported_operand(op: &str, left: &str, right: &str) -> EvalError {
    type_error(format!(
        "unsupported operand type(s) for {op}: '{left}' and '{right}'"
    ))
}

#[cold]
pub fn not_iterable(type_name: &str) -> EvalError {
    type_error(format!("'{type_name}' object is not iterable"))
}

// Lookup

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::exception("NameError", format!("name '{name}' is not defined"))
}

#[cold]
pub fn no_attribute(type_name: &str, attr: &str) -> EvalError {
    EvalError::exception(
        "AttributeError",
        format!("'{type_name}' object has no attribute '{attr}'"),
    )
}

#[cold]
pub fn key_not_found(key: &str) -> EvalError {
    EvalError::exception("KeyError", key)
}

#[cold]
pub fn index_out_of_range(what: &str) -> EvalError {
    EvalError::exception("IndexError", format!("{what} index out of range"))
}

#[cold]
pub fn value_error(message: impl Into<String>) -> EvalError {
    EvalError::exception("ValueError", message)
}

#[cold]
pub fn module_not_found(name: &str) -> EvalError {
    EvalError::exception("ModuleNotFoundError", format!("unknown library: {name}"))
}

// Arithmetic

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::exception("ZeroDivisionError", "division by zero")
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::exception("ZeroDivisionError", "integer modulo by zero")
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::exception("OverflowError", format!("integer overflow in {operation}"))
}

// Execution limits

#[cold]
pub fn recursion_limit_exceeded() -> EvalError {
    EvalError::exception("RecursionError", "maximum recursion depth exceeded")
}

#[cold]
pub fn timeout() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Timeout, "execution timeout".to_string())
}

#[cold]
pub fn cancelled() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Cancelled, "execution cancelled".to_string())
}

/// Wrap a host-side failure so it never leaks as a host type.
#[cold]
pub fn host_error(err: &dyn std::error::Error) -> EvalError {
    EvalError::new(err.to_string())
}
