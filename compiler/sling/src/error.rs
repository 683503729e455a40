//! Host-facing error type.

use sling_parse::ParseError;
use sling_value::EvalError;
use thiserror::Error;

/// Tag of the exception that requests process exit.
const SYSTEM_EXIT: &str = "SystemExit";

/// Why a host call into the runtime failed.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The source did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An exception escaped the script.
    #[error("{0}{}", line_suffix(.0.line))]
    Runtime(EvalError),

    /// `SystemExit` with a non-zero status.
    #[error("script exited with status {code}")]
    Exit { code: i32 },

    /// Misuse of the host API (missing variable, not a class, ...).
    #[error("{0}")]
    Host(String),
}

fn line_suffix(line: Option<u32>) -> String {
    line.map(|line| format!(" (line {line})")).unwrap_or_default()
}

impl ScriptError {
    /// Classify an error that left the evaluator. `SystemExit` with status
    /// zero is a clean exit and yields `Ok(())`.
    pub fn from_eval(err: EvalError) -> Result<(), ScriptError> {
        if err.exception_type() != SYSTEM_EXIT {
            return Err(ScriptError::Runtime(err));
        }
        match exit_code(&err.message) {
            0 => Ok(()),
            code => Err(ScriptError::Exit { code }),
        }
    }

    /// Same as [`ScriptError::from_eval`], prefixing a runtime message with
    /// the entry point that failed.
    pub(crate) fn from_eval_in(err: EvalError, context: &str) -> Result<(), ScriptError> {
        Self::from_eval(err).map_err(|err| match err {
            ScriptError::Runtime(inner) => {
                ScriptError::Runtime(inner.with_prefix(&format!("{context}: ")))
            }
            other => other,
        })
    }

    /// Process exit status a CLI should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScriptError::Exit { code } => *code,
            _ => 1,
        }
    }

    /// The underlying runtime error, if any.
    pub fn as_eval(&self) -> Option<&EvalError> {
        match self {
            ScriptError::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

/// `SystemExit()` and `SystemExit(0)` are success, an integer message is
/// the status, and any other message means failure.
fn exit_code(message: &str) -> i32 {
    let message = message.trim();
    if message.is_empty() {
        return 0;
    }
    message.parse().unwrap_or(1)
}

#[cfg(test)]
mod tests;
