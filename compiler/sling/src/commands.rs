//! CLI argument parsing and the `run` / `-e` commands.

use std::time::Duration;

use sling::{Runtime, ScriptError};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Run {
        path: String,
        timeout: Option<Duration>,
    },
    Eval {
        code: String,
        timeout: Option<Duration>,
    },
    Help,
    Version,
}

/// Parse the arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(first) = args.first() else {
        return Ok(Command::Help);
    };
    let mut timeout = None;
    let mut operand = None;
    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--timeout" {
            let value = rest
                .next()
                .ok_or_else(|| "--timeout needs a value in seconds".to_string())?;
            timeout = Some(parse_timeout(value)?);
        } else if let Some(value) = arg.strip_prefix("--timeout=") {
            timeout = Some(parse_timeout(value)?);
        } else if operand.is_none() {
            operand = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument '{arg}'"));
        }
    }

    match first.as_str() {
        "run" => {
            let path = operand.ok_or_else(|| "missing file path".to_string())?;
            Ok(Command::Run { path, timeout })
        }
        "-e" | "eval" => {
            let code = operand.ok_or_else(|| "missing code after -e".to_string())?;
            Ok(Command::Eval { code, timeout })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        "version" | "--version" | "-V" => Ok(Command::Version),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    value
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| format!("invalid timeout '{value}'"))
}

pub fn run_file(path: &str, timeout: Option<Duration>) -> i32 {
    match std::fs::read_to_string(path) {
        Ok(source) => run_source(&source, timeout),
        Err(err) => {
            eprintln!("error: cannot read '{path}': {err}");
            1
        }
    }
}

/// Evaluate `source` with a stdout print handler. Returns the exit status.
pub fn run_source(source: &str, timeout: Option<Duration>) -> i32 {
    let mut builder = Runtime::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let runtime = builder.build();
    exit_status(runtime.eval(source).map(drop))
}

fn exit_status(result: Result<(), ScriptError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err @ ScriptError::Exit { .. }) => err.exit_code(),
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

#[cfg(test)]
mod tests;
